use thiserror::Error;

/// Faults at the Modbus session boundary.
///
/// Connectivity faults and timeouts invalidate the session, so the next
/// cycle reopens it. A device exception response means the session itself
/// is fine and only the requested operation was refused.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("modbus i/o failed: {0}")]
    Io(#[from] tokio_modbus::Error),

    #[error("no response within {0} seconds")]
    Timeout(u64),

    #[error("device returned exception: {0}")]
    Exception(tokio_modbus::Exception),

    #[error("empty response for register {0}")]
    EmptyResponse(u16),

    #[error("session is not connected")]
    NotConnected,
}

impl TransportError {
    /// True for faults that mean the underlying session is dead.
    pub fn is_connectivity(&self) -> bool {
        !matches!(self, Self::Exception(_) | Self::EmptyResponse(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no register profile for model {0:?}")]
    ProfileNotFound(String),

    #[error("register profile for model {model:?} is malformed: {reason}")]
    ProfileMalformed { model: String, reason: String },

    #[error("device unreachable: {0}")]
    TransportUnavailable(#[source] TransportError),

    #[error("write of {value} to register {address} rejected: {source}")]
    WriteRejected {
        address: u16,
        value: u16,
        #[source]
        source: TransportError,
    },

    #[error("{label:?} is not an option of register {key:?}")]
    InvalidOption { key: String, label: String },
}
