//! BSIM Newton Convergence Test
//!
//! After each Newton iteration the drain and bulk currents are predicted
//! from the last device load by a first-order expansion in the voltage
//! change since that load:
//!
//! ```text
//! cdhat = cd + sum(g_i * dV_i)
//! ```
//!
//! and compared with the currents the load actually produced. A mismatch
//! larger than `reltol * max(|cdhat|, |cd|) + abstol` marks the iteration
//! as not converged.

use super::types::{BiasState, BsimInstance, ChannelMode, MosType};
use super::BsimModel;
use crate::device::SimContext;
use crate::error::Result;

/// Predicted and actual terminal currents of one instance [A]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentPrediction {
    /// Drain current from the last load
    pub cd: f64,
    /// First-order prediction of the drain current
    pub cdhat: f64,
    /// Combined bulk current from the last load
    pub cb: f64,
    /// First-order prediction of the combined bulk current
    pub cbhat: f64,
}

/// Drain-current mismatch test, inclusive at the tolerance boundary.
///
/// A mismatch exactly equal to `reltol * max(|predicted|, |actual|) + abstol`
/// counts as not converged. [`bulk_mismatch`] tolerates that same value.
pub fn drain_mismatch(predicted: f64, actual: f64, reltol: f64, abstol: f64) -> bool {
    let tol = reltol * predicted.abs().max(actual.abs()) + abstol;
    (predicted - actual).abs() >= tol
}

/// Bulk-current mismatch test, exclusive at the tolerance boundary
pub fn bulk_mismatch(predicted: f64, actual: f64, reltol: f64, abstol: f64) -> bool {
    let tol = reltol * predicted.abs().max(actual.abs()) + abstol;
    (predicted - actual).abs() > tol
}

/// Terminal voltages of `inst` in the newest iterate, polarity applied
pub fn present_bias(inst: &BsimInstance, mos_type: MosType, ctx: &SimContext) -> Result<BiasState> {
    let sign = mos_type.sign();
    let n = &inst.nodes;
    let v = |node| ctx.node_voltage(&inst.name, node);
    let vs = v(n.s_prime)?;
    let vbs = sign * (v(n.b)? - vs);
    let vgs = sign * (v(n.g)? - vs);
    let vds = sign * (v(n.d_prime)? - vs);
    Ok(BiasState {
        vgs,
        vds,
        vbs,
        vbd: vbs - vds,
    })
}

/// Predict the terminal currents at `bias` from the stored operating point.
pub fn predict_currents(inst: &BsimInstance, bias: &BiasState) -> CurrentPrediction {
    let op = &inst.op;
    let last = &op.state;
    let vgd = bias.vgs - bias.vds;
    let vgdo = last.vgs - last.vds;
    let delvbs = bias.vbs - last.vbs;
    let delvbd = bias.vbd - last.vbd;
    let delvgs = bias.vgs - last.vgs;
    let delvds = bias.vds - last.vds;
    let delvgd = vgd - vgdo;

    let (cd, cdhat) = match op.mode {
        ChannelMode::Forward => {
            let cd = op.ids - op.ibd + op.isub;
            let cdhat = cd - op.gbd * delvbd
                + (op.gmbs + op.gbbs) * delvbs
                + (op.gm + op.gbgs) * delvgs
                + (op.gds + op.gbds) * delvds;
            (cd, cdhat)
        }
        ChannelMode::Reverse => {
            let cd = op.ids - op.ibd;
            let cdhat = cd + (op.gmbs - op.gbd) * delvbd + op.gm * delvgd - op.gds * delvds;
            (cd, cdhat)
        }
    };

    let cb = op.ibs + op.ibd - op.isub;
    let cbhat = match op.mode {
        ChannelMode::Forward => {
            cb + op.gbd * delvbd + (op.gbs - op.gbbs) * delvbs
                - op.gbgs * delvgs
                - op.gbds * delvds
        }
        ChannelMode::Reverse => {
            cb + op.gbs * delvbs + (op.gbd - op.gbbs) * delvbd - op.gbgs * delvgd
                + op.gbds * delvds
        }
    };

    CurrentPrediction {
        cd,
        cdhat,
        cb,
        cbhat,
    }
}

impl BsimModel {
    /// Check every instance of this model. Returns `false` after flagging
    /// the first instance whose currents disagree; later instances are not
    /// visited.
    pub fn conv_test(&self, ctx: &mut SimContext) -> Result<bool> {
        for inst in &self.instances {
            if inst.off && ctx.init_fix {
                continue;
            }
            let bias = present_bias(inst, self.params.mos_type, ctx)?;
            let p = predict_currents(inst, &bias);
            if drain_mismatch(p.cdhat, p.cd, ctx.reltol, ctx.abstol)
                || bulk_mismatch(p.cbhat, p.cb, ctx.reltol, ctx.abstol)
            {
                ctx.flag_nonconvergence();
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsim::params::BsimParams;
    use crate::bsim::types::{MosNodes, OperatingPoint, SizeDependParams};
    use crate::device::NodeId;

    fn next_up(x: f64) -> f64 {
        f64::from_bits(x.to_bits() + 1)
    }

    fn next_down(x: f64) -> f64 {
        f64::from_bits(x.to_bits() - 1)
    }

    // d=1 g=2 s=0 b=0
    fn inst(op: OperatingPoint) -> BsimInstance {
        BsimInstance::new(
            "M1",
            MosNodes::four_terminal(NodeId(1), NodeId(2), NodeId(0), NodeId(0)),
            SizeDependParams::default(),
        )
        .with_op(op)
    }

    fn loaded_op() -> OperatingPoint {
        OperatingPoint {
            ids: 1e-3,
            ibd: -1e-12,
            ibs: -1e-12,
            isub: 1e-9,
            gm: 2e-3,
            gds: 5e-5,
            gmbs: 3e-4,
            gbd: 1e-12,
            gbs: 1e-12,
            gbbs: 1e-10,
            gbgs: 2e-10,
            gbds: 3e-10,
            state: BiasState {
                vgs: 1.0,
                vds: 1.5,
                vbs: 0.0,
                vbd: -1.5,
            },
            ..OperatingPoint::default()
        }
    }

    fn ctx_at(vd: f64, vg: f64) -> SimContext {
        let mut ctx = SimContext::new(300.15, 1e-3, 1e-12);
        ctx.rhs_old = vec![0.0, vd, vg];
        ctx
    }

    #[test]
    fn test_drain_boundary() {
        // |1.5 - 1.0| = 0.5 = tol exactly
        assert!(drain_mismatch(1.0, 1.5, 0.0, 0.5));
        assert!(!drain_mismatch(1.0, 1.5, 0.0, next_up(0.5)));
        assert!(drain_mismatch(1.0, 1.5, 0.0, next_down(0.5)));
    }

    #[test]
    fn test_bulk_boundary() {
        assert!(!bulk_mismatch(1.0, 1.5, 0.0, 0.5));
        assert!(!bulk_mismatch(1.0, 1.5, 0.0, next_up(0.5)));
        assert!(bulk_mismatch(1.0, 1.5, 0.0, next_down(0.5)));
    }

    #[test]
    fn test_equal_currents_never_flag() {
        for (reltol, abstol) in [(1e-3, 1e-12), (1e-9, 1e-18), (0.5, 1.0)] {
            assert!(!drain_mismatch(2.5e-3, 2.5e-3, reltol, abstol));
            assert!(!bulk_mismatch(2.5e-3, 2.5e-3, reltol, abstol));
        }
    }

    #[test]
    fn test_unchanged_bias_predicts_stored_current() {
        let i = inst(loaded_op());
        let p = predict_currents(&i, &i.op.state);
        assert_eq!(p.cd, p.cdhat);
        assert_eq!(p.cb, p.cbhat);
        assert_eq!(p.cd, 1e-3 + 1e-12 + 1e-9);
    }

    #[test]
    fn test_reverse_mode_grouping() {
        let mut op = loaded_op();
        op.mode = ChannelMode::Reverse;
        let i = inst(op);
        let bias = BiasState {
            vgs: 1.1,
            vds: 1.5,
            vbs: 0.0,
            vbd: -1.5,
        };
        let p = predict_currents(&i, &bias);
        // only vgd moved: cdhat = cd + gm * 0.1
        assert_eq!(p.cd, op.ids - op.ibd);
        assert!((p.cdhat - (p.cd + op.gm * 0.1)).abs() < 1e-15);
        assert!((p.cbhat - (p.cb - op.gbgs * 0.1)).abs() < 1e-20);
    }

    #[test]
    fn test_converged_instance_leaves_counter() {
        let model = BsimModel {
            name: "nch".to_string(),
            params: BsimParams::nmos_default(),
            instances: vec![inst(loaded_op())],
        };
        let mut ctx = ctx_at(1.5, 1.0);
        assert!(model.conv_test(&mut ctx).unwrap());
        assert_eq!(ctx.noncon(), 0);
    }

    #[test]
    fn test_moved_gate_flags_and_stops() {
        let mut second = inst(loaded_op());
        second.name = "M2".to_string();
        // M2 points at a node that does not exist; reaching it would error
        second.nodes.g = NodeId(9);
        let model = BsimModel {
            name: "nch".to_string(),
            params: BsimParams::nmos_default(),
            instances: vec![inst(loaded_op()), second],
        };
        let mut ctx = ctx_at(1.5, 1.2);
        assert!(!model.conv_test(&mut ctx).unwrap());
        assert_eq!(ctx.noncon(), 1);
    }

    #[test]
    fn test_off_instance_skipped_during_init_fix() {
        let mut i = inst(loaded_op());
        i.off = true;
        let model = BsimModel {
            name: "nch".to_string(),
            params: BsimParams::nmos_default(),
            instances: vec![i],
        };
        let mut ctx = ctx_at(1.5, 1.2);
        ctx.init_fix = true;
        assert!(model.conv_test(&mut ctx).unwrap());
        ctx.init_fix = false;
        assert!(!model.conv_test(&mut ctx).unwrap());
        assert_eq!(ctx.noncon(), 1);
    }

    #[test]
    fn test_pmos_polarity() {
        let mut op = loaded_op();
        op.state = BiasState {
            vgs: 1.0,
            vds: 1.5,
            vbs: 0.0,
            vbd: -1.5,
        };
        let model = BsimModel {
            name: "pch".to_string(),
            params: BsimParams::pmos_default(),
            instances: vec![inst(op)],
        };
        let mut ctx = ctx_at(-1.5, -1.0);
        assert!(model.conv_test(&mut ctx).unwrap());
    }
}
