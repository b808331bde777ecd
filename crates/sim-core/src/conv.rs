use log::debug;
use sim_devices::SimContext;

use crate::circuit::Circuit;
use crate::error::Result;

/// Run the convergence test of every device type for one Newton iteration.
///
/// Every device type is visited even after an earlier one flagged a
/// mismatch. The iteration counts as converged when the context's
/// non-convergence counter did not move.
pub fn conv_test(circuit: &Circuit, ctx: &mut SimContext) -> Result<bool> {
    let start = ctx.noncon();
    for device in &circuit.devices {
        let before = ctx.noncon();
        device.conv_test(ctx)?;
        if ctx.noncon() != before {
            debug!("{}: not converged", device.name());
        }
    }
    Ok(ctx.noncon() == start)
}
