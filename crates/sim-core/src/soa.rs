use log::debug;
use sim_devices::SimContext;

use crate::circuit::Circuit;
use crate::error::Result;

/// Check terminal voltages of every device type against their limits.
/// Small-signal analyses are skipped.
pub fn soa_check(circuit: &mut Circuit, ctx: &SimContext) -> Result<()> {
    if !ctx.analysis.checks_soa() {
        debug!("soa check skipped in {:?}", ctx.analysis);
        return Ok(());
    }
    for device in &mut circuit.devices {
        device.soa_check(ctx)?;
    }
    Ok(())
}

/// Forget every warning issued so far.
pub fn soa_reset_all(circuit: &mut Circuit) {
    for device in &mut circuit.devices {
        device.soa_reset();
    }
}
