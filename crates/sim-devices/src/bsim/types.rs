//! BSIM MOSFET type definitions
//!
//! Contains enums, per-instance state and the named noise accumulator table.

use serde::{Deserialize, Serialize};

use crate::device::NodeId;
use crate::noise::{NoiseRow, SourceDensity};

/// MOSFET device type (NMOS or PMOS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MosType {
    #[default]
    Nmos,
    Pmos,
}

impl MosType {
    /// Polarity applied to terminal voltages: +1 for NMOS, -1 for PMOS
    pub fn sign(self) -> f64 {
        match self {
            MosType::Nmos => 1.0,
            MosType::Pmos => -1.0,
        }
    }
}

/// Channel thermal noise formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalFormula {
    /// SPICE2: 2/3 * |gm + gds + gmbs|
    #[default]
    Legacy,
    /// BSIM3: ueff * |Qinv / Leff^2|
    Physical,
}

/// Flicker noise formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlickerFormula {
    /// SPICE2: Kf * |Id|^Af / (f^Ef * Leff^2 * Cox)
    #[default]
    Legacy,
    /// BSIM3 oxide-trap model with weak-inversion blending
    Physical,
}

/// Which end of the channel acts as the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    #[default]
    Forward,
    Reverse,
}

/// Terminal nodes. The primed nodes sit inside the series resistances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MosNodes {
    pub d: NodeId,
    pub g: NodeId,
    pub s: NodeId,
    pub b: NodeId,
    pub d_prime: NodeId,
    pub s_prime: NodeId,
}

impl MosNodes {
    /// Nodes for a device without series resistances
    pub fn four_terminal(d: NodeId, g: NodeId, s: NodeId, b: NodeId) -> Self {
        Self {
            d,
            g,
            s,
            b,
            d_prime: d,
            s_prime: s,
        }
    }
}

/// Size-dependent parameters derived at elaboration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeDependParams {
    /// Effective channel length [m]
    pub leff: f64,
    /// Effective channel width [m]
    pub weff: f64,
    /// Characteristic length of the velocity-saturation region [m]
    pub litl: f64,
    /// Saturation velocity at the device temperature [m/s]
    pub vsattemp: f64,
}

impl Default for SizeDependParams {
    fn default() -> Self {
        Self {
            leff: 1e-6,
            weff: 1e-5,
            litl: 1e-7,
            vsattemp: 8e4,
        }
    }
}

/// Bias voltages stored at the last converged iteration [V]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BiasState {
    pub vgs: f64,
    pub vds: f64,
    pub vbs: f64,
    pub vbd: f64,
}

/// Operating point of one instance
///
/// Currents and conductances come from the last device load; `state`
/// holds the terminal voltages that load was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingPoint {
    /// Drain current [A]
    pub ids: f64,
    /// Bulk-drain junction current [A]
    pub ibd: f64,
    /// Bulk-source junction current [A]
    pub ibs: f64,
    /// Substrate (impact ionization) current [A]
    pub isub: f64,
    /// Transconductance dIds/dVgs [S]
    pub gm: f64,
    /// Output conductance dIds/dVds [S]
    pub gds: f64,
    /// Body transconductance dIds/dVbs [S]
    pub gmbs: f64,
    /// Bulk-drain junction conductance [S]
    pub gbd: f64,
    /// Bulk-source junction conductance [S]
    pub gbs: f64,
    /// dIsub/dVbs [S]
    pub gbbs: f64,
    /// dIsub/dVgs [S]
    pub gbgs: f64,
    /// dIsub/dVds [S]
    pub gbds: f64,
    /// Effective mobility
    pub ueff: f64,
    /// Inversion charge [C]
    pub qinv: f64,
    /// Threshold voltage [V]
    pub von: f64,
    /// Drain saturation voltage [V]
    pub vdsat: f64,
    /// Drain series conductance [S]
    pub drain_conductance: f64,
    /// Source series conductance [S]
    pub source_conductance: f64,
    pub mode: ChannelMode,
    pub state: BiasState,
}

/// Noise sources of a MOSFET, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosNoiseSource {
    DrainResistance,
    SourceResistance,
    ChannelThermal,
    Flicker,
    Total,
}

impl MosNoiseSource {
    /// Report order of every row, total last
    pub const ALL: [MosNoiseSource; 5] = [
        MosNoiseSource::DrainResistance,
        MosNoiseSource::SourceResistance,
        MosNoiseSource::ChannelThermal,
        MosNoiseSource::Flicker,
        MosNoiseSource::Total,
    ];

    /// The physical sources, without the total
    pub const PHYSICAL: [MosNoiseSource; 4] = [
        MosNoiseSource::DrainResistance,
        MosNoiseSource::SourceResistance,
        MosNoiseSource::ChannelThermal,
        MosNoiseSource::Flicker,
    ];

    /// Channel-name suffix appended to the instance name
    pub fn suffix(self) -> &'static str {
        match self {
            MosNoiseSource::DrainResistance => ".rd",
            MosNoiseSource::SourceResistance => ".rs",
            MosNoiseSource::ChannelThermal => ".id",
            MosNoiseSource::Flicker => ".1overf",
            MosNoiseSource::Total => "",
        }
    }
}

/// Per-instance noise history and running integrals
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MosNoiseTable {
    pub rd: NoiseRow,
    pub rs: NoiseRow,
    pub id: NoiseRow,
    pub flicker: NoiseRow,
    pub total: NoiseRow,
}

impl MosNoiseTable {
    pub fn row(&self, source: MosNoiseSource) -> &NoiseRow {
        match source {
            MosNoiseSource::DrainResistance => &self.rd,
            MosNoiseSource::SourceResistance => &self.rs,
            MosNoiseSource::ChannelThermal => &self.id,
            MosNoiseSource::Flicker => &self.flicker,
            MosNoiseSource::Total => &self.total,
        }
    }

    pub fn row_mut(&mut self, source: MosNoiseSource) -> &mut NoiseRow {
        match source {
            MosNoiseSource::DrainResistance => &mut self.rd,
            MosNoiseSource::SourceResistance => &mut self.rs,
            MosNoiseSource::ChannelThermal => &mut self.id,
            MosNoiseSource::Flicker => &mut self.flicker,
            MosNoiseSource::Total => &mut self.total,
        }
    }
}

/// Densities of every source at one frequency
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MosNoiseDensities {
    pub rd: SourceDensity,
    pub rs: SourceDensity,
    pub id: SourceDensity,
    pub flicker: SourceDensity,
    /// Sum of the four physical sources
    pub total: SourceDensity,
}

impl MosNoiseDensities {
    pub fn new(
        rd: SourceDensity,
        rs: SourceDensity,
        id: SourceDensity,
        flicker: SourceDensity,
    ) -> Self {
        Self {
            rd,
            rs,
            id,
            flicker,
            total: SourceDensity::new(rd.dens + rs.dens + id.dens + flicker.dens),
        }
    }

    pub fn get(&self, source: MosNoiseSource) -> SourceDensity {
        match source {
            MosNoiseSource::DrainResistance => self.rd,
            MosNoiseSource::SourceResistance => self.rs,
            MosNoiseSource::ChannelThermal => self.id,
            MosNoiseSource::Flicker => self.flicker,
            MosNoiseSource::Total => self.total,
        }
    }
}

/// One placed transistor
#[derive(Debug, Clone, PartialEq)]
pub struct BsimInstance {
    pub name: String,
    pub nodes: MosNodes,
    pub size: SizeDependParams,
    pub op: OperatingPoint,
    /// Start from the "off" initial guess
    pub off: bool,
    pub noise: MosNoiseTable,
}

impl BsimInstance {
    pub fn new(name: impl Into<String>, nodes: MosNodes, size: SizeDependParams) -> Self {
        Self {
            name: name.into(),
            nodes,
            size,
            op: OperatingPoint::default(),
            off: false,
            noise: MosNoiseTable::default(),
        }
    }

    pub fn with_op(mut self, op: OperatingPoint) -> Self {
        self.op = op;
        self
    }
}
