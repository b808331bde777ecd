use serde::{Deserialize, Serialize};
use sim_devices::noise::NoiseJob;
use sim_devices::{AnalysisMode, SimContext};

/// Simulator-wide options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Ambient temperature [K]
    pub temp: f64,
    pub reltol: f64,
    pub abstol: f64,
    /// Warnings per SOA quantity before going quiet
    pub soa_max_warns: usize,
    pub init_fix: bool,
    pub analysis: AnalysisMode,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            temp: 300.15,
            reltol: 1e-3,
            abstol: 1e-12,
            soa_max_warns: 5,
            init_fix: false,
            analysis: AnalysisMode::DcOp,
        }
    }
}

impl SimOptions {
    pub fn context(&self) -> SimContext {
        let mut ctx = SimContext::new(self.temp, self.reltol, self.abstol);
        ctx.soa_max_warns = self.soa_max_warns;
        ctx.init_fix = self.init_fix;
        ctx.analysis = self.analysis;
        ctx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepType {
    #[default]
    Dec,
    Oct,
    Lin,
}

/// Frequency sweep of a noise analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Start frequency [Hz]
    pub fstart: f64,
    /// Stop frequency [Hz]
    pub fstop: f64,
    /// Points per decade/octave, or total points for a linear sweep
    pub points: usize,
    pub sweep: SweepType,
    /// Per-source summary every this many steps, 0 disables summaries
    pub steps_summary: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            fstart: 1.0,
            fstop: 1e6,
            points: 10,
            sweep: SweepType::Dec,
            steps_summary: 0,
        }
    }
}

impl NoiseConfig {
    pub fn job(&self) -> NoiseJob {
        NoiseJob {
            start_freq: self.fstart,
            steps_summary: self.steps_summary,
        }
    }
}
