//! BSIM3 Noise Sources
//!
//! Names and evaluates every noise source of a MOSFET and accumulates
//! their integrated contribution across a frequency sweep.
//!
//! ## Sources
//!
//! | Row | Nodes | Density |
//! |-----|-------|---------|
//! | `.rd` | d' - d | 4kT * Gd |
//! | `.rs` | s' - s | 4kT * Gs |
//! | `.id` | d' - s' | 4kT * Gch (legacy or physical channel conductance) |
//! | `.1overf` | d' - s' | legacy SPICE2 or oxide-trap flicker model |
//! | total | | sum of the four rows |
//!
//! Every density is multiplied by the gain-squared factor between its two
//! nodes taken from the adjoint response.
//!
//! ## Oxide-trap flicker model
//! ```text
//! Ssi = q^2 kT/q Id ueff / (1e8 f^Ef Cox Leff^2) * (A ln((N0+N*)/(Nl+N*)) + B (N0-Nl) + C (N0^2-Nl^2)/2)
//!     + kT/q Id^2 dLclm / (1e8 f^Ef Leff^2 Weff) * (A + B Nl + C Nl^2) / (Nl+N*)^2
//! N* = 2e14
//! ```
//! Below 0.1 V of gate overdrive the formula is blended with the
//! weak-inversion asymptote `Swi` as `Swi*Slimit/(Swi+Slimit)`.
//!
//! ## References
//! - BSIM3v3.2 Manual, Chapter 8 (Noise Modeling)
//! - K. K. Hung et al., "A Physics-Based MOSFET Noise Model for Circuit Simulators"

use log::debug;

use super::params::{BsimParams, CHARGE, KT_OVER_Q_PER_KELVIN, STRONG_INVERSION_MARGIN};
use super::types::{
    BsimInstance, FlickerFormula, MosNoiseDensities, MosNoiseSource, ThermalFormula,
};
use super::BsimModel;
use crate::device::SimContext;
use crate::error::Result;
use crate::noise::{
    eval_source, integrate, log_floor, NoiseData, NoiseMode, NoiseOperation, NoiseSink,
    SourceDensity, SourceKind, N_MINLOG,
};

/// Reference carrier density in the oxide-trap integral [1/m^2]
const N_STAR: f64 = 2.0e14;

/// Strong-inversion flicker noise of the oxide-trap model.
///
/// # Arguments
/// * `vgs` - Gate-source voltage [V]
/// * `vds` - Drain-source voltage [V], non-negative
/// * `model` - Model parameters
/// * `inst` - Instance providing size parameters and operating point
/// * `freq` - Frequency [Hz]
/// * `temp` - Temperature [K]
///
/// # Returns
/// * Flicker noise scalar, to be multiplied by the source gain
pub fn strong_inversion_noise_eval(
    vgs: f64,
    vds: f64,
    model: &BsimParams,
    inst: &BsimInstance,
    freq: f64,
    temp: f64,
) -> f64 {
    let p = &inst.size;
    let op = &inst.op;
    let cox = model.cox();
    let cd = op.ids.abs();

    // Channel length modulation beyond saturation
    let del_clm = if vds > op.vdsat {
        let esat = 2.0 * p.vsattemp / op.ueff;
        let t0 = ((vds - op.vdsat) / p.litl + model.em) / esat;
        p.litl * log_floor(t0)
    } else {
        0.0
    };

    let eff_freq = freq.powf(model.ef);
    let t1 = CHARGE * CHARGE * KT_OVER_Q_PER_KELVIN * cd * temp * op.ueff;
    let t2 = 1.0e8 * eff_freq * cox * p.leff * p.leff;

    // Carrier densities at the source and drain ends
    let vgst = vgs - op.von;
    let n0 = (cox * vgst / CHARGE).max(0.0);
    let nl = (cox * (vgst - vds.min(op.vdsat)) / CHARGE).max(0.0);

    let t3 = model.noia * log_floor((n0 + N_STAR) / (nl + N_STAR));
    let t4 = model.noib * (n0 - nl);
    let t5 = model.noic * 0.5 * (n0 * n0 - nl * nl);

    let t6 = KT_OVER_Q_PER_KELVIN * temp * cd * cd;
    let t7 = 1.0e8 * eff_freq * p.leff * p.leff * p.weff;
    let t8 = model.noia + model.noib * nl + model.noic * nl * nl;
    let t9 = (nl + N_STAR) * (nl + N_STAR);

    t1 / t2 * (t3 + t4 + t5) + t6 / t7 * del_clm * t8 / t9
}

/// Weak-inversion asymptote of the oxide-trap model
fn weak_inversion_noise(model: &BsimParams, inst: &BsimInstance, freq: f64, temp: f64) -> f64 {
    let p = &inst.size;
    let cd = inst.op.ids;
    let t10 = model.noia * KT_OVER_Q_PER_KELVIN * temp;
    let t11 = p.weff * p.leff * freq.powf(model.ef) * 4.0e36;
    t10 / t11 * cd * cd
}

/// Oxide-trap flicker noise at the stored bias, blended below strong inversion.
pub fn physical_flicker_noise(
    model: &BsimParams,
    inst: &BsimInstance,
    freq: f64,
    temp: f64,
) -> f64 {
    let mut vgs = inst.op.state.vgs;
    let mut vds = inst.op.state.vds;
    if vds < 0.0 {
        vds = -vds;
        vgs += vds;
    }
    let boundary = inst.op.von + STRONG_INVERSION_MARGIN;
    if vgs >= boundary {
        return strong_inversion_noise_eval(vgs, vds, model, inst, freq, temp);
    }

    let swi = weak_inversion_noise(model, inst, freq, temp);
    let slimit = strong_inversion_noise_eval(boundary, vds, model, inst, freq, temp);
    let sum = swi + slimit;
    if sum > 0.0 {
        swi * slimit / sum
    } else {
        0.0
    }
}

/// SPICE2 flicker noise: Kf * |Id|^Af / (f^Ef * Leff^2 * Cox)
pub fn legacy_flicker_noise(model: &BsimParams, inst: &BsimInstance, freq: f64) -> f64 {
    let leff = inst.size.leff;
    model.kf * (model.af * log_floor(inst.op.ids.abs())).exp()
        / (freq.powf(model.ef) * leff * leff * model.cox())
}

/// Flicker scalar selected by the model's flicker formula
pub fn flicker_noise(model: &BsimParams, inst: &BsimInstance, freq: f64, temp: f64) -> f64 {
    match model.flicker_noise {
        FlickerFormula::Legacy => legacy_flicker_noise(model, inst, freq),
        FlickerFormula::Physical => physical_flicker_noise(model, inst, freq, temp),
    }
}

/// Conductance whose thermal noise models the channel [S]
pub fn channel_noise_conductance(model: &BsimParams, inst: &BsimInstance) -> f64 {
    let op = &inst.op;
    match model.thermal_noise {
        ThermalFormula::Legacy => 2.0 / 3.0 * (op.gm + op.gds + op.gmbs).abs(),
        ThermalFormula::Physical => {
            let leff = inst.size.leff;
            op.ueff * (op.qinv / (leff * leff)).abs()
        }
    }
}

/// Output-referred densities of every source of `inst` at the current frequency.
pub fn evaluate_densities(
    model: &BsimParams,
    inst: &BsimInstance,
    ctx: &SimContext,
    data: &NoiseData,
) -> MosNoiseDensities {
    let n = &inst.nodes;
    let op = &inst.op;
    let temp = ctx.temp;

    let rd = eval_source(
        data,
        temp,
        SourceKind::Thermal {
            conductance: op.drain_conductance,
        },
        n.d_prime,
        n.d,
    );
    let rs = eval_source(
        data,
        temp,
        SourceKind::Thermal {
            conductance: op.source_conductance,
        },
        n.s_prime,
        n.s,
    );
    let id = eval_source(
        data,
        temp,
        SourceKind::Thermal {
            conductance: channel_noise_conductance(model, inst),
        },
        n.d_prime,
        n.s_prime,
    );
    let gain = eval_source(data, temp, SourceKind::Gain, n.d_prime, n.s_prime);
    let flicker = SourceDensity::new(gain.dens * flicker_noise(model, inst, data.freq, temp));

    MosNoiseDensities::new(rd, rs, id, flicker)
}

impl BsimModel {
    /// Run one noise operation over every instance of this model.
    pub fn noise(
        &mut self,
        mode: NoiseMode,
        operation: NoiseOperation,
        ctx: &SimContext,
        data: &mut NoiseData,
        sink: &mut dyn NoiseSink,
        on_dens: &mut f64,
    ) -> Result<()> {
        match operation {
            NoiseOperation::Register => self.register_channels(mode, data, sink),
            NoiseOperation::Compute => {
                match mode {
                    NoiseMode::Density => self.compute_densities(ctx, data, sink, on_dens),
                    NoiseMode::Integrated => self.report_integrated(data, sink),
                }
                Ok(())
            }
            // the analysis driver closes the plots
            NoiseOperation::Close => Ok(()),
        }
    }

    fn register_channels(
        &self,
        mode: NoiseMode,
        data: &NoiseData,
        sink: &mut dyn NoiseSink,
    ) -> Result<()> {
        if !data.job.summaries() {
            return Ok(());
        }
        for inst in &self.instances {
            for source in MosNoiseSource::ALL {
                match mode {
                    NoiseMode::Density => {
                        sink.allocate_channel(&format!("onoise.{}{}", inst.name, source.suffix()))?;
                    }
                    NoiseMode::Integrated => {
                        sink.allocate_channel(&format!(
                            "onoise_total.{}{}",
                            inst.name,
                            source.suffix()
                        ))?;
                        sink.allocate_channel(&format!(
                            "inoise_total.{}{}",
                            inst.name,
                            source.suffix()
                        ))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn compute_densities(
        &mut self,
        ctx: &SimContext,
        data: &mut NoiseData,
        sink: &mut dyn NoiseSink,
        on_dens: &mut f64,
    ) {
        let summaries = data.job.summaries();
        for inst in &mut self.instances {
            let dens = evaluate_densities(&self.params, inst, ctx, data);
            *on_dens += dens.total.dens;

            if data.is_first_sample() {
                for source in MosNoiseSource::ALL {
                    inst.noise.row_mut(source).ln_last_dens = dens.get(source).ln_dens;
                }
                if data.at_sweep_start() {
                    for source in MosNoiseSource::ALL {
                        inst.noise.row_mut(source).reset_integrals();
                    }
                }
            } else {
                for source in MosNoiseSource::PHYSICAL {
                    let d = dens.get(source);
                    let ln_last = inst.noise.row(source).ln_last_dens;
                    let out = integrate(d.dens, d.ln_dens, ln_last, data);
                    let inp = integrate(
                        d.dens * data.gain_sq_inv,
                        d.ln_dens + data.ln_gain_inv,
                        ln_last + data.ln_gain_inv,
                        data,
                    );
                    inst.noise.row_mut(source).ln_last_dens = d.ln_dens;
                    data.out_noise += out;
                    data.in_noise += inp;
                    if summaries {
                        let row = inst.noise.row_mut(source);
                        row.out_noise += out;
                        row.in_noise += inp;
                        inst.noise.total.out_noise += out;
                        inst.noise.total.in_noise += inp;
                    }
                }
            }

            if data.prt_summary {
                for source in MosNoiseSource::ALL {
                    sink.append_output(dens.get(source).dens);
                }
            }

            if dens.flicker.dens <= N_MINLOG {
                debug!(
                    "{}: flicker density at {} Hz clamped to floor",
                    inst.name, data.freq
                );
            }
        }
    }

    fn report_integrated(&self, data: &NoiseData, sink: &mut dyn NoiseSink) {
        if !data.job.summaries() {
            return;
        }
        for inst in &self.instances {
            for source in MosNoiseSource::ALL {
                let row = inst.noise.row(source);
                sink.append_output(row.out_noise);
                sink.append_output(row.in_noise);
            }
        }
    }
}
