//! Circuit-level drivers for the device layer: noise sweeps, Newton
//! convergence and safe-operating-area passes over every device type.

pub mod circuit;
pub mod conv;
pub mod deck;
pub mod error;
pub mod noise;
pub mod options;
pub mod psf;
pub mod result_store;
pub mod soa;
pub mod sweep;

pub use circuit::Circuit;
pub use error::{Result, SimError};
