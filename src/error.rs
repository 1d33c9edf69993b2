use thiserror::Error;

/// Result type for Key Light operations
pub type Result<T> = std::result::Result<T, KeylightError>;

/// Errors that can occur when managing or controlling Key Light devices
#[derive(Error, Debug)]
pub enum KeylightError {
    /// Input was rejected before any I/O was attempted
    #[error("invalid input: {0}")]
    Validation(String),

    /// The registry's durable store could not be read or written
    #[error("registry store error while trying to {action}")]
    Persistence {
        /// What the registry was doing when the store failed
        action: String,
        #[source]
        source: std::io::Error,
    },

    /// The device was unreachable, timed out, or rejected the request
    #[error("device transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The device response could not be decoded as the expected JSON shape
    #[error("malformed device response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The device response decoded but violated the protocol contract
    #[error("protocol violation from {address}: {detail}")]
    Protocol {
        /// Address of the offending device
        address: String,
        /// What the device got wrong
        detail: String,
    },
}

impl KeylightError {
    /// Create a new persistence error
    pub(crate) fn persistence(action: &str, source: std::io::Error) -> Self {
        KeylightError::Persistence {
            action: action.to_string(),
            source,
        }
    }

    /// Create a new protocol violation error
    pub(crate) fn protocol(address: &str, detail: &str) -> Self {
        KeylightError::Protocol {
            address: address.to_string(),
            detail: detail.to_string(),
        }
    }
}
