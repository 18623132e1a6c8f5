//! Line-oriented JSON codec.
//!
//! One event per line. Encoders never emit a newline inside an event since
//! `serde_json` escapes control characters in strings.

use crate::{ClientEvent, ProtoError, ServerEvent};

/// Longest line accepted from a peer, in bytes.
pub const MAX_LINE_BYTES: usize = 16 * 1024;

/// Encode a server event as a single JSON line (without the trailing newline).
pub fn encode_server_event(event: &ServerEvent) -> Result<String, ProtoError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode one line received from a client.
pub fn decode_client_event(line: &str) -> Result<ClientEvent, ProtoError> {
    check_size(line)?;
    Ok(serde_json::from_str(line.trim())?)
}

/// Encode a client event as a single JSON line (without the trailing newline).
pub fn encode_client_event(event: &ClientEvent) -> Result<String, ProtoError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode one line received from the server.
pub fn decode_server_event(line: &str) -> Result<ServerEvent, ProtoError> {
    check_size(line)?;
    Ok(serde_json::from_str(line.trim())?)
}

fn check_size(line: &str) -> Result<(), ProtoError> {
    if line.len() > MAX_LINE_BYTES {
        return Err(ProtoError::TooLarge { size: line.len(), max: MAX_LINE_BYTES });
    }
    Ok(())
}
