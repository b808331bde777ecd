//! Device-model layer: MOSFET noise sources, Newton convergence checks and
//! the per-device-type protocol that circuit-level drivers dispatch through.

pub mod bsim;
pub mod device;
pub mod error;
pub mod noise;

pub use device::{AnalysisMode, DeviceType, NodeId, SimContext};
pub use error::{DeviceError, Result};
