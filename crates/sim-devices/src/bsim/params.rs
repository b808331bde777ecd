//! BSIM MOSFET model parameters
//!
//! Contains the BsimParams structure with the model-level noise and
//! safe-operating-area parameters and their default values for NMOS and
//! PMOS devices.

use serde::{Deserialize, Serialize};

use super::types::{FlickerFormula, MosType, ThermalFormula};

/// Physical constants
pub const EPSILON_OX: f64 = 3.9 * 8.854e-12; // Oxide permittivity [F/m]
pub const CHARGE: f64 = 1.6021918e-19; // Elementary charge [C]
pub const KT_OVER_Q_PER_KELVIN: f64 = 8.62e-5; // Thermal voltage per kelvin [V/K]

/// Gate overdrive above threshold where the strong-inversion flicker
/// formula stops being valid [V]
pub const STRONG_INVERSION_MARGIN: f64 = 0.1;

/// BSIM3 model parameters used by the noise, convergence and SOA services
///
/// Parameters are grouped by their physical function:
///
/// - Model selection: mos_type, thermal_noise, flicker_noise
/// - Flicker noise: kf, af, ef, em, noia, noib, noic
/// - Geometry: tox
/// - Safe operating area: vgs_max .. vbd_max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BsimParams {
    // ============ Model Selection ============
    /// Device type: NMOS or PMOS
    pub mos_type: MosType,
    /// Channel thermal noise formula
    pub thermal_noise: ThermalFormula,
    /// Flicker noise formula
    pub flicker_noise: FlickerFormula,

    // ============ Flicker Noise ============
    /// SPICE2 flicker coefficient
    pub kf: f64,
    /// SPICE2 flicker current exponent
    pub af: f64,
    /// Flicker frequency exponent
    pub ef: f64,
    /// Saturation field [V/m]
    pub em: f64,
    /// Oxide trap density coefficient A (linear in carrier density)
    pub noia: f64,
    /// Oxide trap density coefficient B (quadratic)
    pub noib: f64,
    /// Oxide trap density coefficient C (cubic)
    pub noic: f64,

    // ============ Geometry ============
    /// Gate oxide thickness [m]
    pub tox: f64,

    // ============ Safe Operating Area ============
    /// Maximum |Vgs| [V]
    pub vgs_max: f64,
    /// Maximum |Vgd| [V]
    pub vgd_max: f64,
    /// Maximum |Vgb| [V]
    pub vgb_max: f64,
    /// Maximum |Vds| [V]
    pub vds_max: f64,
    /// Maximum |Vbs| [V]
    pub vbs_max: f64,
    /// Maximum |Vbd| [V]
    pub vbd_max: f64,
}

impl BsimParams {
    /// Default NMOS parameters
    pub fn nmos_default() -> Self {
        Self {
            mos_type: MosType::Nmos,
            thermal_noise: ThermalFormula::Legacy,
            flicker_noise: FlickerFormula::Legacy,
            kf: 0.0,
            af: 1.0,
            ef: 1.0,
            em: 4.1e7,
            noia: 1e20,
            noib: 5e4,
            noic: -1.4e-12,
            tox: 1.5e-8,
            vgs_max: f64::MAX,
            vgd_max: f64::MAX,
            vgb_max: f64::MAX,
            vds_max: f64::MAX,
            vbs_max: f64::MAX,
            vbd_max: f64::MAX,
        }
    }

    /// Default PMOS parameters
    pub fn pmos_default() -> Self {
        Self {
            mos_type: MosType::Pmos,
            noia: 9.9e18,
            noib: 2.4e3,
            noic: 1.4e-12,
            ..Self::nmos_default()
        }
    }

    /// Oxide capacitance per unit area [F/m^2]
    pub fn cox(&self) -> f64 {
        EPSILON_OX / self.tox
    }

    /// Apply a legacy `noimod` selector.
    ///
    /// | noimod | thermal | flicker |
    /// |--------|---------|---------|
    /// | 1 | legacy | legacy |
    /// | 2 | physical | physical |
    /// | 3 | legacy | physical |
    /// | 4 | physical | legacy |
    ///
    /// Returns `false` and leaves the formulas untouched for other codes.
    pub fn set_noimod(&mut self, noimod: u32) -> bool {
        let (thermal, flicker) = match noimod {
            1 => (ThermalFormula::Legacy, FlickerFormula::Legacy),
            2 => (ThermalFormula::Physical, FlickerFormula::Physical),
            3 => (ThermalFormula::Legacy, FlickerFormula::Physical),
            4 => (ThermalFormula::Physical, FlickerFormula::Legacy),
            _ => return false,
        };
        self.thermal_noise = thermal;
        self.flicker_noise = flicker;
        true
    }
}

impl Default for BsimParams {
    fn default() -> Self {
        Self::nmos_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmos_trap_defaults() {
        let p = BsimParams::pmos_default();
        assert_eq!(p.mos_type, MosType::Pmos);
        assert_eq!(p.noia, 9.9e18);
        assert_eq!(p.noic, 1.4e-12);
        assert_eq!(p.em, 4.1e7);
    }

    #[test]
    fn test_noimod_mapping() {
        let mut p = BsimParams::nmos_default();
        assert!(p.set_noimod(3));
        assert_eq!(p.thermal_noise, ThermalFormula::Legacy);
        assert_eq!(p.flicker_noise, FlickerFormula::Physical);
        assert!(p.set_noimod(4));
        assert_eq!(p.thermal_noise, ThermalFormula::Physical);
        assert_eq!(p.flicker_noise, FlickerFormula::Legacy);
        assert!(!p.set_noimod(7));
        assert_eq!(p.thermal_noise, ThermalFormula::Physical);
    }

    #[test]
    fn test_cox() {
        let p = BsimParams {
            tox: 1e-8,
            ..BsimParams::nmos_default()
        };
        assert!((p.cox() - 3.45306e-3).abs() < 1e-8);
    }
}
