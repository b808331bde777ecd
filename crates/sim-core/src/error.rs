use sim_devices::DeviceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid deck: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid noise sweep: {0}")]
    InvalidSweep(String),

    #[error("instance {instance} references unknown model {model}")]
    UnknownModel { instance: String, model: String },

    #[error("run {0} not found")]
    RunNotFound(usize),
}

pub type Result<T> = std::result::Result<T, SimError>;
