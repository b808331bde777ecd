use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("out of memory while allocating output channel {channel}")]
    OutOfMemory { channel: String },

    #[error("instance {instance}: node {node} is outside the solution vector")]
    InvalidNode { instance: String, node: usize },
}

pub type Result<T> = std::result::Result<T, DeviceError>;
