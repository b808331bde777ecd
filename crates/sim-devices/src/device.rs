//! Per-device-type dispatch protocol
//!
//! Circuit-level drivers hold one [`DeviceType`] per kind of device in the
//! circuit and call into it once per noise sample, Newton iteration or
//! safe-operating-area pass. Each device type walks its own models and
//! instances in registration order.

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};
use crate::noise::{NoiseData, NoiseMode, NoiseOperation, NoiseSink};

/// Index into the solution and adjoint vectors. Node 0 is ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Analysis the solver is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    DcOp,
    Dc,
    DcSweep,
    Tran,
    TranOp,
    Ac,
    Noise,
}

impl AnalysisMode {
    /// Safe-operating-area checks only make sense for large-signal analyses.
    pub fn checks_soa(self) -> bool {
        matches!(
            self,
            AnalysisMode::Dc
                | AnalysisMode::DcOp
                | AnalysisMode::DcSweep
                | AnalysisMode::Tran
                | AnalysisMode::TranOp
        )
    }
}

/// Per-run simulation state shared by every device type
#[derive(Debug, Clone)]
pub struct SimContext {
    /// Ambient temperature [K]
    pub temp: f64,
    /// Relative tolerance for current convergence
    pub reltol: f64,
    /// Absolute tolerance for current convergence [A]
    pub abstol: f64,
    /// Solver is holding the fixed initial guess (devices flagged `off` stay off)
    pub init_fix: bool,
    pub analysis: AnalysisMode,
    /// Newest Newton iterate, indexed by node
    pub rhs_old: Vec<f64>,
    /// Per-quantity warning budget for SOA checks
    pub soa_max_warns: usize,
    noncon: usize,
}

impl Default for SimContext {
    fn default() -> Self {
        Self {
            temp: 300.15,
            reltol: 1e-3,
            abstol: 1e-12,
            init_fix: false,
            analysis: AnalysisMode::default(),
            rhs_old: Vec::new(),
            soa_max_warns: 5,
            noncon: 0,
        }
    }
}

impl SimContext {
    pub fn new(temp: f64, reltol: f64, abstol: f64) -> Self {
        Self {
            temp,
            reltol,
            abstol,
            ..Self::default()
        }
    }

    /// Number of non-convergence events recorded so far. The counter only
    /// ever grows; drivers compare snapshots to judge one iteration.
    pub fn noncon(&self) -> usize {
        self.noncon
    }

    pub fn flag_nonconvergence(&mut self) {
        self.noncon += 1;
    }

    /// Voltage of `node` in the newest iterate. Ground reads as 0 V even
    /// when the vector is empty.
    pub fn node_voltage(&self, instance: &str, node: NodeId) -> Result<f64> {
        if node.0 == 0 {
            return Ok(self.rhs_old.first().copied().unwrap_or(0.0));
        }
        self.rhs_old
            .get(node.0)
            .copied()
            .ok_or_else(|| DeviceError::InvalidNode {
                instance: instance.to_string(),
                node: node.0,
            })
    }
}

/// Hooks a device type exposes to the circuit-level drivers.
///
/// Every hook has a no-op default so a device type only implements the
/// services it takes part in.
pub trait DeviceType {
    /// Device type name used in diagnostics
    fn name(&self) -> &str;

    fn instance_count(&self) -> usize;

    /// Run one noise operation over every instance of this type. The total
    /// output noise density of all instances is added to `on_dens`.
    fn noise(
        &mut self,
        _mode: NoiseMode,
        _operation: NoiseOperation,
        _ctx: &SimContext,
        _data: &mut NoiseData,
        _sink: &mut dyn NoiseSink,
        _on_dens: &mut f64,
    ) -> Result<()> {
        Ok(())
    }

    /// Compare predicted and freshly computed terminal currents. A mismatch
    /// bumps `ctx`'s non-convergence counter; it is not an error.
    fn conv_test(&self, _ctx: &mut SimContext) -> Result<()> {
        Ok(())
    }

    fn soa_check(&mut self, _ctx: &SimContext) -> Result<()> {
        Ok(())
    }

    /// Clear SOA warning counters before a new run.
    fn soa_reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noncon_only_increments() {
        let mut ctx = SimContext::default();
        assert_eq!(ctx.noncon(), 0);
        ctx.flag_nonconvergence();
        ctx.flag_nonconvergence();
        assert_eq!(ctx.noncon(), 2);
    }

    #[test]
    fn test_node_voltage_ground_and_bounds() {
        let mut ctx = SimContext::default();
        assert_eq!(ctx.node_voltage("M1", NodeId(0)).unwrap(), 0.0);
        ctx.rhs_old = vec![0.0, 1.2];
        assert_eq!(ctx.node_voltage("M1", NodeId(1)).unwrap(), 1.2);
        assert!(matches!(
            ctx.node_voltage("M1", NodeId(5)),
            Err(DeviceError::InvalidNode { node: 5, .. })
        ));
    }

    #[test]
    fn test_soa_modes() {
        assert!(AnalysisMode::Tran.checks_soa());
        assert!(AnalysisMode::DcOp.checks_soa());
        assert!(!AnalysisMode::Ac.checks_soa());
        assert!(!AnalysisMode::Noise.checks_soa());
    }
}
