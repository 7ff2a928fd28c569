//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and raw bytes. Nothing above this
//! module cares which format is used; it only needs something that
//! implements [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::{Envelope, ProtocolError};

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec is shared with every match task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes an [`Envelope`] and runs its protocol checks.
    ///
    /// # Errors
    /// Any decode error, or [`ProtocolError::InvalidMessage`] from
    /// [`Envelope::validate`].
    fn decode_envelope(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        let envelope: Envelope = self.decode(data)?;
        envelope.validate()?;
        Ok(envelope)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag, enabled by default.
///
/// ## Example
///
/// ```rust
/// use eriantys_protocol::{ClientAction, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::new("ada", ClientAction::SelectCloud { index: 1 });
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded = codec.decode_envelope(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
