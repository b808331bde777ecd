use sim_devices::noise::{NoiseData, NoiseMode, NoiseOperation, NoiseSink};
use sim_devices::SimContext;

use crate::circuit::Circuit;
use crate::error::Result;

/// One noise operation over every device type, followed by the
/// circuit-wide channels.
///
/// Device channels come first, in registration order. The circuit adds
/// `onoise_spectrum`/`inoise_spectrum` in density mode and
/// `onoise_total`/`inoise_total` in integrated mode.
///
/// Returns the total output noise density summed over all instances
/// (0 outside a density computation).
pub fn noise_pass(
    circuit: &mut Circuit,
    mode: NoiseMode,
    operation: NoiseOperation,
    ctx: &SimContext,
    data: &mut NoiseData,
    sink: &mut dyn NoiseSink,
) -> Result<f64> {
    let mut on_dens = 0.0;
    for device in &mut circuit.devices {
        device.noise(mode, operation, ctx, data, sink, &mut on_dens)?;
    }

    match operation {
        NoiseOperation::Register => match mode {
            NoiseMode::Density => {
                sink.allocate_channel("onoise_spectrum")?;
                sink.allocate_channel("inoise_spectrum")?;
            }
            NoiseMode::Integrated => {
                sink.allocate_channel("onoise_total")?;
                sink.allocate_channel("inoise_total")?;
            }
        },
        NoiseOperation::Compute => match mode {
            NoiseMode::Density => {
                if !data.job.summaries() || data.prt_summary {
                    sink.append_output(on_dens);
                    sink.append_output(on_dens * data.gain_sq_inv);
                }
            }
            NoiseMode::Integrated => {
                sink.append_output(data.out_noise);
                sink.append_output(data.in_noise);
            }
        },
        NoiseOperation::Close => {}
    }

    Ok(on_dens)
}
