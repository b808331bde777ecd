//! Shared noise-analysis services for device models
//!
//! Device types evaluate their physical noise sources with [`eval_source`],
//! integrate them across the frequency sweep with [`integrate`] and hand
//! channel names and per-step values to a [`NoiseSink`].
//!
//! ## Sweep bookkeeping
//!
//! ```text
//! sample 0:  freq = fstart, del_freq = 0      -> initialise history only
//! sample k:  del_freq = f_k - f_(k-1) > 0     -> integrate f_(k-1)..f_k
//! ```
//!
//! Between two samples a source density is treated as a power law
//! `S(f) = a * f^e`, i.e. a straight line in log-log space, and integrated
//! exactly over the interval.

use num_complex::Complex64;

use crate::device::NodeId;
use crate::error::Result;

/// Boltzmann constant [J/K]
pub const CONST_BOLTZ: f64 = 1.3806226e-23;

/// Floor applied before any logarithm or fractional power
pub const N_MINLOG: f64 = 1e-38;

/// Floor applied to the input-to-output gain before inverting it
pub const N_MINGAIN: f64 = 1e-20;

/// Below this exponent magnitude a segment is integrated as flat
pub const N_INTFTHRESH: f64 = 1e-10;

/// Below this magnitude of (exponent + 1) a segment is integrated as 1/f
pub const N_INTUSELOG: f64 = 1e-10;

/// What a noise pass produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    /// Spectral density at the current frequency
    Density,
    /// Noise power integrated over the sweep so far
    Integrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseOperation {
    /// Allocate report channels
    Register,
    /// Evaluate (density) or report (integrated)
    Compute,
    Close,
}

/// Parameters of the noise analysis job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseJob {
    /// First frequency of the sweep [Hz]
    pub start_freq: f64,
    /// Emit per-source summaries every this many steps, 0 disables them
    pub steps_summary: usize,
}

impl NoiseJob {
    pub fn summaries(&self) -> bool {
        self.steps_summary != 0
    }
}

/// Per-sample state of a running noise sweep
#[derive(Debug, Clone)]
pub struct NoiseData {
    pub job: NoiseJob,
    /// Current frequency [Hz]
    pub freq: f64,
    pub last_freq: f64,
    /// Spacing from the previous sample, exactly 0 on the first sample
    pub del_freq: f64,
    pub ln_freq: f64,
    pub ln_last_freq: f64,
    pub del_ln_freq: f64,
    /// 1 / |input-to-output gain|^2
    pub gain_sq_inv: f64,
    pub ln_gain_inv: f64,
    /// Output noise power integrated over the sweep [V^2]
    pub out_noise: f64,
    /// Input-referred noise power integrated over the sweep
    pub in_noise: f64,
    /// Write per-source densities for this sample
    pub prt_summary: bool,
    /// Adjoint response at each node for the current frequency
    pub adjoint: Vec<Complex64>,
    step: usize,
}

impl NoiseData {
    pub fn new(job: NoiseJob) -> Self {
        Self {
            job,
            freq: job.start_freq,
            last_freq: job.start_freq,
            del_freq: 0.0,
            ln_freq: log_floor(job.start_freq),
            ln_last_freq: log_floor(job.start_freq),
            del_ln_freq: 0.0,
            gain_sq_inv: 1.0,
            ln_gain_inv: 0.0,
            out_noise: 0.0,
            in_noise: 0.0,
            prt_summary: job.summaries(),
            adjoint: Vec::new(),
            step: 0,
        }
    }

    /// Move the sweep to `freq`.
    ///
    /// # Arguments
    /// * `freq` - Frequency of the new sample [Hz]
    /// * `input_gain_sq` - |output / input|^2 at `freq`
    /// * `adjoint` - Adjoint response at every node at `freq`
    pub fn begin_sample(&mut self, freq: f64, input_gain_sq: f64, adjoint: Vec<Complex64>) {
        self.freq = freq;
        self.ln_freq = log_floor(freq);
        self.del_freq = freq - self.last_freq;
        self.del_ln_freq = self.ln_freq - self.ln_last_freq;
        // Samples closer than one ulp of ln(f) only refresh the history
        if self.step == 0 || self.del_ln_freq == 0.0 {
            self.del_freq = 0.0;
            self.del_ln_freq = 0.0;
        }
        self.gain_sq_inv = 1.0 / input_gain_sq.max(N_MINGAIN);
        self.ln_gain_inv = self.gain_sq_inv.ln();
        self.prt_summary = self.job.summaries() && self.step % self.job.steps_summary == 0;
        self.adjoint = adjoint;
    }

    /// Record the current sample as history for the next one.
    pub fn end_sample(&mut self) {
        self.last_freq = self.freq;
        self.ln_last_freq = self.ln_freq;
        self.step += 1;
    }

    /// No previous sample to integrate from
    pub fn is_first_sample(&self) -> bool {
        self.del_freq == 0.0
    }

    /// Sitting on the very first frequency of the sweep
    pub fn at_sweep_start(&self) -> bool {
        self.freq == self.job.start_freq
    }

    /// |A(n1) - A(n2)|^2 of the adjoint response. Missing nodes read as 0.
    pub fn gain(&self, n1: NodeId, n2: NodeId) -> f64 {
        let at = |n: NodeId| self.adjoint.get(n.0).copied().unwrap_or_default();
        (at(n1) - at(n2)).norm_sqr()
    }
}

/// Opaque handle of an allocated report channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub usize);

/// Receives channel names during registration and values during a pass.
pub trait NoiseSink {
    /// Fails with `DeviceError::OutOfMemory` when the channel cannot be stored.
    fn allocate_channel(&mut self, name: &str) -> Result<ChannelId>;

    /// Values are consumed in call order.
    fn append_output(&mut self, value: f64);
}

/// Density of one source and its clamped logarithm
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SourceDensity {
    pub dens: f64,
    pub ln_dens: f64,
}

impl SourceDensity {
    pub fn new(dens: f64) -> Self {
        Self {
            dens,
            ln_dens: log_floor(dens),
        }
    }
}

/// How a source's scalar is combined with its gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    /// Thermal noise of a conductance [S]
    Thermal { conductance: f64 },
    /// Gain only; the caller multiplies in the physical scalar
    Gain,
}

pub fn log_floor(x: f64) -> f64 {
    x.max(N_MINLOG).ln()
}

/// Thermal noise density 4kTG of a conductance at `temp`.
pub fn thermal_density(conductance: f64, temp: f64) -> SourceDensity {
    SourceDensity::new(4.0 * CONST_BOLTZ * temp * conductance)
}

/// Evaluate a source connected between `n1` and `n2`, referred to the output.
pub fn eval_source(
    data: &NoiseData,
    temp: f64,
    kind: SourceKind,
    n1: NodeId,
    n2: NodeId,
) -> SourceDensity {
    let gain = data.gain(n1, n2);
    match kind {
        SourceKind::Thermal { conductance } => {
            SourceDensity::new(gain * thermal_density(conductance, temp).dens)
        }
        SourceKind::Gain => SourceDensity::new(gain),
    }
}

/// Integrate a density from the previous sample to the current one.
///
/// Must not be called on the first sample of a sweep (`del_freq == 0`).
///
/// # Arguments
/// * `dens` - Density at the current frequency
/// * `ln_dens` - Its clamped logarithm
/// * `ln_last_dens` - Clamped logarithm of the density at the previous sample
/// * `data` - Sweep state providing the frequency interval
///
/// # Returns
/// * Noise power added over the interval
pub fn integrate(dens: f64, ln_dens: f64, ln_last_dens: f64, data: &NoiseData) -> f64 {
    debug_assert!(data.del_ln_freq != 0.0, "integrate called with zero spacing");
    let mut exponent = (ln_dens - ln_last_dens) / data.del_ln_freq;
    if exponent.abs() < N_INTFTHRESH {
        return dens * data.del_freq;
    }
    let a = (ln_dens - exponent * data.ln_freq).exp();
    exponent += 1.0;
    if exponent.abs() < N_INTUSELOG {
        a * (data.ln_freq - data.ln_last_freq)
    } else {
        a * ((exponent * data.ln_freq).exp() - (exponent * data.ln_last_freq).exp()) / exponent
    }
}

/// History and running integrals of one noise source of one instance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseRow {
    /// Clamped log density at the previous sample
    pub ln_last_dens: f64,
    /// Integrated output noise
    pub out_noise: f64,
    /// Integrated input-referred noise
    pub in_noise: f64,
}

impl NoiseRow {
    pub fn reset_integrals(&mut self) {
        self.out_noise = 0.0;
        self.in_noise = 0.0;
    }
}
