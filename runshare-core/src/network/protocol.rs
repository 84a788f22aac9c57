//! Relay Protocol
//!
//! JSON text-frame encoding for [`RelayMessage`].

use super::error::NetworkError;
use super::message::RelayMessage;

/// Maximum accepted inbound frame size in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Encodes a message as a JSON text frame.
pub fn encode_message(message: &RelayMessage) -> Result<String, NetworkError> {
    serde_json::to_string(message).map_err(|e| NetworkError::Serialization(e.to_string()))
}

/// Decodes a JSON text frame.
pub fn decode_message(frame: &str) -> Result<RelayMessage, NetworkError> {
    if frame.len() > MAX_FRAME_SIZE {
        return Err(NetworkError::InvalidMessage(format!(
            "frame of {} bytes exceeds limit",
            frame.len()
        )));
    }
    serde_json::from_str(frame).map_err(|e| NetworkError::InvalidMessage(e.to_string()))
}
