//! JSON description of a device table, its bias and the sweep to run.
//!
//! ```json
//! {
//!   "options": { "temp": 300.0 },
//!   "noise": { "fstart": 10, "fstop": 1e6, "points": 5, "steps_summary": 1 },
//!   "models": [{ "name": "nch", "family": "bsim3", "mos_type": "nmos",
//!                "params": { "noimod": 2, "kf": "1e-26" } }],
//!   "instances": [{ "name": "M1", "model": "nch",
//!                   "nodes": { "d": 1, "g": 2, "s": 0, "b": 0, "d_prime": 1, "s_prime": 0 },
//!                   "op": { "ids": 1e-4, "gm": 1e-3 } }],
//!   "transfer": { "adjoint": [[0, 0], [1, 0], [0, 0]], "input_gain_sq": 1.0 },
//!   "rhs_old": [0.0, 1.2, 1.0]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sim_devices::bsim::{
    build_bsim_params, BsimDevice, BsimFamily, BsimInstance, BsimModel, MosNodes, MosType,
    OperatingPoint, SizeDependParams,
};

use crate::circuit::Circuit;
use crate::error::{Result, SimError};
use crate::options::{NoiseConfig, SimOptions};
use crate::sweep::Transfer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    pub name: String,
    #[serde(default)]
    pub family: BsimFamily,
    #[serde(default)]
    pub mos_type: MosType,
    /// Raw model parameters; numbers or strings with magnitude suffixes
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

impl ModelCard {
    pub fn build(&self) -> BsimModel {
        let params: HashMap<String, String> = self
            .params
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.to_ascii_lowercase(), text)
            })
            .collect();
        BsimModel::new(
            self.name.clone(),
            build_bsim_params(&params, self.mos_type == MosType::Pmos),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceCard {
    pub name: String,
    pub model: String,
    pub nodes: MosNodes,
    #[serde(default)]
    pub size: SizeDependParams,
    #[serde(default)]
    pub op: OperatingPoint,
    #[serde(default)]
    pub off: bool,
}

/// Frequency-independent small-signal response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferCard {
    /// (re, im) of the adjoint response per node
    pub adjoint: Vec<[f64; 2]>,
    pub input_gain_sq: f64,
}

impl Default for TransferCard {
    fn default() -> Self {
        Self {
            adjoint: Vec::new(),
            input_gain_sq: 1.0,
        }
    }
}

impl TransferCard {
    pub fn transfer(&self) -> Transfer {
        Transfer {
            adjoint: self
                .adjoint
                .iter()
                .map(|[re, im]| Complex64::new(*re, *im))
                .collect(),
            input_gain_sq: self.input_gain_sq,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deck {
    pub options: SimOptions,
    pub noise: NoiseConfig,
    pub models: Vec<ModelCard>,
    pub instances: Vec<InstanceCard>,
    pub transfer: TransferCard,
    /// Newest Newton iterate for convergence and SOA checks
    pub rhs_old: Vec<f64>,
}

impl Deck {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Group models by family, in order of first appearance, and attach
    /// every instance to its model.
    pub fn build_circuit(&self) -> Result<Circuit> {
        let mut devices: Vec<BsimDevice> = Vec::new();
        for card in &self.models {
            let idx = match devices.iter().position(|d| d.family == card.family) {
                Some(idx) => idx,
                None => {
                    devices.push(BsimDevice::new(card.family));
                    devices.len() - 1
                }
            };
            devices[idx].models.push(card.build());
        }

        for card in &self.instances {
            let model = devices
                .iter_mut()
                .flat_map(|d| d.models.iter_mut())
                .find(|m| m.name == card.model)
                .ok_or_else(|| SimError::UnknownModel {
                    instance: card.name.clone(),
                    model: card.model.clone(),
                })?;
            let mut inst = BsimInstance::new(card.name.clone(), card.nodes, card.size)
                .with_op(card.op);
            inst.off = card.off;
            model.instances.push(inst);
        }

        let mut circuit = Circuit::new();
        for device in devices {
            circuit.add_device(device);
        }
        Ok(circuit)
    }

    pub fn context(&self) -> sim_devices::SimContext {
        let mut ctx = self.options.context();
        ctx.rhs_old = self.rhs_old.clone();
        ctx
    }
}
