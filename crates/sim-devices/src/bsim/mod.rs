//! BSIM MOSFET Model Implementation
//!
//! This module implements the small-signal noise, Newton convergence and
//! safe-operating-area services of the BSIM3 (Level 49) MOSFET.
//! BSIM3v3 and the older BSIM3v1 share one implementation; the two
//! families differ only in naming.
//!
//! ## Module Structure
//!
//! - `params`: Model parameters (BsimParams) with defaults
//! - `types`: Instances, operating point and the noise accumulator table
//! - `noise`: Thermal and flicker noise sources, sweep accumulation
//! - `convergence`: Predicted vs. computed terminal currents
//! - `soa`: Terminal voltage limits
//!
//! ## Usage
//!
//! ```ignore
//! use sim_devices::bsim::{BsimDevice, BsimFamily, BsimModel, BsimParams};
//!
//! let mut model = BsimModel::new("nch", BsimParams::nmos_default());
//! model.instances.push(instance);
//!
//! let mut device = BsimDevice::new(BsimFamily::Bsim3);
//! device.models.push(model);
//! ```
//!
//! ## References
//!
//! - BSIM3v3.2 Manual, UC Berkeley Device Group
//! - Y. Cheng, C. Hu, "MOSFET Modeling & BSIM3 User's Guide"

pub mod convergence;
pub mod noise;
pub mod params;
pub mod soa;
pub mod types;

// Re-export commonly used items
pub use params::BsimParams;
pub use soa::SoaWarnings;
pub use types::{
    BiasState, BsimInstance, ChannelMode, FlickerFormula, MosNodes, MosNoiseSource, MosType,
    OperatingPoint, SizeDependParams, ThermalFormula,
};

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::device::{DeviceType, SimContext};
use crate::error::Result;
use crate::noise::{NoiseData, NoiseMode, NoiseOperation, NoiseSink};

/// Model family served by a [`BsimDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsimFamily {
    #[default]
    Bsim3,
    Bsim3v1,
}

impl BsimFamily {
    pub fn name(self) -> &'static str {
        match self {
            BsimFamily::Bsim3 => "BSIM3",
            BsimFamily::Bsim3v1 => "BSIM3v1",
        }
    }
}

/// Shared parameters and the instances that use them
#[derive(Debug, Clone, PartialEq)]
pub struct BsimModel {
    pub name: String,
    pub params: BsimParams,
    pub instances: Vec<BsimInstance>,
}

impl BsimModel {
    pub fn new(name: impl Into<String>, params: BsimParams) -> Self {
        Self {
            name: name.into(),
            params,
            instances: Vec::new(),
        }
    }
}

/// Every model of one BSIM family, in registration order
#[derive(Debug, Clone)]
pub struct BsimDevice {
    pub family: BsimFamily,
    pub models: Vec<BsimModel>,
    soa_warnings: SoaWarnings,
}

impl BsimDevice {
    pub fn new(family: BsimFamily) -> Self {
        Self {
            family,
            models: Vec::new(),
            soa_warnings: SoaWarnings::default(),
        }
    }

    pub fn soa_warnings(&self) -> SoaWarnings {
        self.soa_warnings
    }

    pub fn instances(&self) -> impl Iterator<Item = &BsimInstance> {
        self.models.iter().flat_map(|m| m.instances.iter())
    }
}

impl DeviceType for BsimDevice {
    fn name(&self) -> &str {
        self.family.name()
    }

    fn instance_count(&self) -> usize {
        self.models.iter().map(|m| m.instances.len()).sum()
    }

    fn noise(
        &mut self,
        mode: NoiseMode,
        operation: NoiseOperation,
        ctx: &SimContext,
        data: &mut NoiseData,
        sink: &mut dyn NoiseSink,
        on_dens: &mut f64,
    ) -> Result<()> {
        for model in &mut self.models {
            model.noise(mode, operation, ctx, data, sink, on_dens)?;
        }
        debug!(
            "{} noise {:?}/{:?} at {} Hz: on_dens={:e}",
            self.family.name(),
            mode,
            operation,
            data.freq,
            on_dens
        );
        Ok(())
    }

    fn conv_test(&self, ctx: &mut SimContext) -> Result<()> {
        for model in &self.models {
            if !model.conv_test(ctx)? {
                debug!(
                    "{}: model {} not converged (noncon={})",
                    self.family.name(),
                    model.name,
                    ctx.noncon()
                );
                return Ok(());
            }
        }
        Ok(())
    }

    fn soa_check(&mut self, ctx: &SimContext) -> Result<()> {
        for model in &self.models {
            model.soa_check(ctx, &mut self.soa_warnings)?;
        }
        Ok(())
    }

    fn soa_reset(&mut self) {
        self.soa_warnings = SoaWarnings::default();
    }
}

/// Build BsimParams from a parameter HashMap
///
/// Extracts the noise and SOA parameters from a model card's parameter map.
/// Uses defaults for any unspecified parameters.
///
/// # Arguments
/// * `params` - HashMap of parameter name -> value string
/// * `is_pmos` - True for PMOS device
///
/// # Returns
/// * `BsimParams` with extracted values
pub fn build_bsim_params(params: &HashMap<String, String>, is_pmos: bool) -> BsimParams {
    let mut p = if is_pmos {
        BsimParams::pmos_default()
    } else {
        BsimParams::nmos_default()
    };

    // Helper to parse parameter value
    let get_param = |keys: &[&str]| -> Option<f64> {
        for key in keys {
            let key_lower = key.to_ascii_lowercase();
            if let Some(value) = params.get(&key_lower) {
                if let Some(num) = parse_number(value) {
                    return Some(num);
                }
            }
        }
        None
    };

    // Noise model selection
    if let Some(v) = get_param(&["noimod"]) {
        if v.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&v) {
            debug!("ignoring non-integral noimod {}", v);
        } else if !p.set_noimod(v as u32) {
            debug!("ignoring unknown noimod {}", v);
        }
    }

    // Flicker noise parameters
    if let Some(v) = get_param(&["kf"]) {
        p.kf = v;
    }
    if let Some(v) = get_param(&["af"]) {
        p.af = v;
    }
    if let Some(v) = get_param(&["ef"]) {
        p.ef = v;
    }
    if let Some(v) = get_param(&["em"]) {
        p.em = v;
    }
    if let Some(v) = get_param(&["noia"]) {
        p.noia = v;
    }
    if let Some(v) = get_param(&["noib"]) {
        p.noib = v;
    }
    if let Some(v) = get_param(&["noic"]) {
        p.noic = v;
    }

    // Geometry parameters
    if let Some(v) = get_param(&["tox"]) {
        p.tox = v;
    }

    // Safe operating area
    if let Some(v) = get_param(&["vgs_max", "vgsmax"]) {
        p.vgs_max = v;
    }
    if let Some(v) = get_param(&["vgd_max", "vgdmax"]) {
        p.vgd_max = v;
    }
    if let Some(v) = get_param(&["vgb_max", "vgbmax"]) {
        p.vgb_max = v;
    }
    if let Some(v) = get_param(&["vds_max", "vdsmax"]) {
        p.vds_max = v;
    }
    if let Some(v) = get_param(&["vbs_max", "vbsmax"]) {
        p.vbs_max = v;
    }
    if let Some(v) = get_param(&["vbd_max", "vbdmax"]) {
        p.vbd_max = v;
    }

    p
}

/// Parse a number with optional SI suffix
fn parse_number(s: &str) -> Option<f64> {
    let lower = s.to_ascii_lowercase();
    let trimmed = lower.trim();

    // Check for SI suffixes
    let (num_str, multiplier) = if let Some(value_part) = trimmed.strip_suffix("meg") {
        (value_part, 1e6)
    } else if let Some(value_part) = trimmed.strip_suffix("mil") {
        (value_part, 25.4e-6)
    } else {
        let (value_part, suffix) = trimmed.split_at(trimmed.len().saturating_sub(1));
        match suffix {
            "f" => (value_part, 1e-15),
            "p" => (value_part, 1e-12),
            "n" => (value_part, 1e-9),
            "u" => (value_part, 1e-6),
            "m" => (value_part, 1e-3),
            "k" => (value_part, 1e3),
            "g" => (value_part, 1e9),
            "t" => (value_part, 1e12),
            _ => (trimmed, 1.0),
        }
    };

    num_str
        .parse::<f64>()
        .ok()
        .map(|n| n * multiplier)
        .or_else(|| trimmed.parse::<f64>().ok())
}
