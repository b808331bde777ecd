//! Noise analysis sweep
//!
//! Drives one noise run from start to stop frequency:
//!
//! ```text
//! register density channels
//! for f in sweep:
//!     transfer(f) -> adjoint response, |input gain|^2
//!     density pass (one spectrum row)
//! register integrated channels
//! integrated pass (one row)
//! close
//! ```

use log::{debug, info};
use num_complex::Complex64;
use sim_devices::noise::{NoiseData, NoiseJob, NoiseMode, NoiseOperation};
use sim_devices::SimContext;

use crate::circuit::Circuit;
use crate::error::{Result, SimError};
use crate::noise::noise_pass;
use crate::options::{NoiseConfig, SweepType};
use crate::result_store::{NoisePlot, NoiseRun, NoiseSummary, ResultStore, RunId};

/// Small-signal response of the circuit at one frequency
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Adjoint response at every node
    pub adjoint: Vec<Complex64>,
    /// |output / input|^2
    pub input_gain_sq: f64,
}

/// Generate frequency points for a noise sweep.
///
/// # Arguments
/// * `config` - Sweep range, type and point count
///
/// # Returns
/// * Strictly increasing frequencies starting at `fstart` and ending at `fstop`
pub fn generate_frequencies(config: &NoiseConfig) -> Result<Vec<f64>> {
    if !config.fstart.is_finite() || config.fstart <= 0.0 {
        return Err(SimError::InvalidSweep(format!(
            "fstart must be positive, got {}",
            config.fstart
        )));
    }
    if !config.fstop.is_finite() || config.fstop < config.fstart {
        return Err(SimError::InvalidSweep(format!(
            "fstop {} is below fstart {}",
            config.fstop, config.fstart
        )));
    }
    if config.points == 0 {
        return Err(SimError::InvalidSweep("points must be at least 1".to_string()));
    }
    if config.fstop == config.fstart {
        return Ok(vec![config.fstart]);
    }

    let mut frequencies = Vec::new();
    match config.sweep {
        SweepType::Lin => {
            if config.points == 1 {
                return Ok(vec![config.fstart]);
            }
            let step = (config.fstop - config.fstart) / (config.points - 1) as f64;
            for i in 0..config.points {
                frequencies.push(config.fstart + i as f64 * step);
            }
        }
        SweepType::Dec => {
            let decades = (config.fstop / config.fstart).log10();
            let total_points = log_sweep_points(decades, config.points)?;
            let log_step =
                (config.fstop.log10() - config.fstart.log10()) / (total_points - 1) as f64;
            for i in 0..total_points {
                let log_f = config.fstart.log10() + i as f64 * log_step;
                frequencies.push(10.0_f64.powf(log_f));
            }
        }
        SweepType::Oct => {
            let octaves = (config.fstop / config.fstart).log2();
            let total_points = log_sweep_points(octaves, config.points)?;
            let log_step = (config.fstop.ln() - config.fstart.ln()) / (total_points - 1) as f64;
            for i in 0..total_points {
                let log_f = config.fstart.ln() + i as f64 * log_step;
                frequencies.push(log_f.exp());
            }
        }
    }

    Ok(frequencies)
}

/// Point count of a dec/oct sweep spanning `span` decades or octaves
fn log_sweep_points(span: f64, points: usize) -> Result<usize> {
    let intervals = (span * points as f64).ceil();
    if !intervals.is_finite() {
        return Err(SimError::InvalidSweep(format!(
            "sweep span of {} intervals is not representable",
            intervals
        )));
    }
    (intervals as usize).checked_add(1).ok_or_else(|| {
        SimError::InvalidSweep(format!("sweep of {} intervals is too long", intervals))
    })
}

/// Run a complete noise sweep and store its plots.
///
/// `transfer` supplies the small-signal response at each frequency.
pub fn run_noise<F>(
    circuit: &mut Circuit,
    ctx: &SimContext,
    config: &NoiseConfig,
    mut transfer: F,
    store: &mut ResultStore,
) -> Result<RunId>
where
    F: FnMut(f64) -> Result<Transfer>,
{
    let frequencies = generate_frequencies(config)?;
    let Some(&start_freq) = frequencies.first() else {
        return Err(SimError::InvalidSweep("empty sweep".to_string()));
    };
    // the sweep starts at the generated point, which may differ from
    // fstart in the last bit
    let mut data = NoiseData::new(NoiseJob {
        start_freq,
        ..config.job()
    });
    info!(
        "noise: {} points from {} Hz to {} Hz, {} instances",
        frequencies.len(),
        config.fstart,
        config.fstop,
        circuit.instance_count()
    );

    let mut spectrum = NoisePlot::new("noise_spectrum");
    noise_pass(
        circuit,
        NoiseMode::Density,
        NoiseOperation::Register,
        ctx,
        &mut data,
        &mut spectrum,
    )?;
    for &freq in &frequencies {
        let t = transfer(freq)?;
        data.begin_sample(freq, t.input_gain_sq, t.adjoint);
        spectrum.begin_row(freq);
        let on_dens = noise_pass(
            circuit,
            NoiseMode::Density,
            NoiseOperation::Compute,
            ctx,
            &mut data,
            &mut spectrum,
        )?;
        spectrum.end_row();
        data.end_sample();
        debug!("noise: f={:e} onoise={:e}", freq, on_dens);
    }
    noise_pass(
        circuit,
        NoiseMode::Density,
        NoiseOperation::Close,
        ctx,
        &mut data,
        &mut spectrum,
    )?;

    let mut integrated = NoisePlot::new("integrated_noise");
    noise_pass(
        circuit,
        NoiseMode::Integrated,
        NoiseOperation::Register,
        ctx,
        &mut data,
        &mut integrated,
    )?;
    integrated.begin_row(data.freq);
    noise_pass(
        circuit,
        NoiseMode::Integrated,
        NoiseOperation::Compute,
        ctx,
        &mut data,
        &mut integrated,
    )?;
    integrated.end_row();
    noise_pass(
        circuit,
        NoiseMode::Integrated,
        NoiseOperation::Close,
        ctx,
        &mut data,
        &mut integrated,
    )?;

    info!(
        "noise: onoise_total={:e} inoise_total={:e}",
        data.out_noise, data.in_noise
    );

    Ok(store.add_run(NoiseRun {
        id: RunId(0),
        spectrum,
        integrated,
        summary: NoiseSummary {
            frequencies,
            out_noise: data.out_noise,
            in_noise: data.in_noise,
        },
    }))
}
