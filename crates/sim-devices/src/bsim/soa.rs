//! Safe-operating-area check
//!
//! Compares terminal voltage magnitudes against the model's maxima and
//! warns about each kind of violation until the context's budget for that
//! kind is used up.

use log::warn;

use super::BsimModel;
use crate::device::SimContext;
use crate::error::Result;

/// Number of warnings already emitted per voltage kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoaWarnings {
    pub vgs: usize,
    pub vgd: usize,
    pub vgb: usize,
    pub vds: usize,
    pub vbs: usize,
    pub vbd: usize,
}

impl SoaWarnings {
    pub fn total(&self) -> usize {
        self.vgs + self.vgd + self.vgb + self.vds + self.vbs + self.vbd
    }
}

fn check_limit(
    instance: &str,
    label: &str,
    value: f64,
    max: f64,
    count: &mut usize,
    max_warns: usize,
) {
    if value > max && *count < max_warns {
        warn!(
            "{}: |{}|={} has exceeded {}_max={}",
            instance, label, value, label, max
        );
        *count += 1;
    }
}

impl BsimModel {
    pub fn soa_check(&self, ctx: &SimContext, warnings: &mut SoaWarnings) -> Result<()> {
        let p = &self.params;
        let max_warns = ctx.soa_max_warns;
        for inst in &self.instances {
            let n = &inst.nodes;
            let v = |node| ctx.node_voltage(&inst.name, node);
            let (vg, vb) = (v(n.g)?, v(n.b)?);
            let (vdp, vsp) = (v(n.d_prime)?, v(n.s_prime)?);
            let name = inst.name.as_str();

            check_limit(name, "Vgs", (vg - vsp).abs(), p.vgs_max, &mut warnings.vgs, max_warns);
            check_limit(name, "Vgd", (vg - vdp).abs(), p.vgd_max, &mut warnings.vgd, max_warns);
            check_limit(name, "Vgb", (vg - vb).abs(), p.vgb_max, &mut warnings.vgb, max_warns);
            check_limit(name, "Vds", (vdp - vsp).abs(), p.vds_max, &mut warnings.vds, max_warns);
            check_limit(name, "Vbs", (vb - vsp).abs(), p.vbs_max, &mut warnings.vbs, max_warns);
            check_limit(name, "Vbd", (vb - vdp).abs(), p.vbd_max, &mut warnings.vbd, max_warns);
        }
        Ok(())
    }
}
