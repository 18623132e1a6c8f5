//! Server runtime errors.
//!
//! Room-level rejections are not errors at this layer; they travel to the
//! client as `roomError` events.

use std::{fmt, io};

use coopsweep_proto::ProtoError;

/// Errors that stop the server or end one connection.
#[derive(Debug)]
pub enum ServerError {
    /// Rejected runtime configuration
    Config(String),

    /// The listener could not bind its address
    Bind {
        /// Requested address
        address: String,
        /// Underlying socket error
        source: io::Error,
    },

    /// Socket read, write or accept failure
    Io(io::Error),

    /// A client broke line framing
    Protocol(ProtoError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Bind { address, source } => write!(f, "failed to bind {address}: {source}"),
            Self::Io(err) => write!(f, "transport error: {err}"),
            Self::Protocol(err) => write!(f, "protocol error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Bind { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::Protocol(err) => Some(err),
        }
    }
}

impl From<ProtoError> for ServerError {
    fn from(err: ProtoError) -> Self {
        Self::Protocol(err)
    }
}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
