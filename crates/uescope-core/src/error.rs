use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Short read at address {address:#x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        address: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Pointer value {0:#x} is outside the valid address range")]
    InvalidPointer(u64),

    #[error("Invalid byte pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to resolve anchor '{anchor}': {message}")]
    AnchorUnresolved { anchor: String, message: String },

    #[error("Failed to decode interned name {index:#x}: {reason}")]
    NameDecodeFailed { index: u32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a read-level failure that a container or
    /// hierarchy walk should absorb rather than propagate.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            Error::MemoryReadFailed { .. } | Error::ShortRead { .. } | Error::InvalidPointer(_)
        )
    }
}
