//! Value formats and the wire-serializer seam.
//!
//! A *value format* turns a typed payload into bytes and back. A *wire
//! serializer* transforms already-encoded payload bytes on their way to and
//! from the broker (the signing serializer in `conveyor-security` is the one
//! production implementation).

use crate::errors::SerializationError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encoding used for the payload value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// UTF-8 JSON via `serde_json`. The conservative, human-auditable format.
    Json,
    /// Native binary via `bincode`. Compact, but decodes arbitrary
    /// caller-chosen shapes, so it is untrusted by default.
    Bincode,
}

impl ValueFormat {
    /// Short name of the format, as used in registry allow lists.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Bincode => "bincode",
        }
    }

    /// Encode a value in this format.
    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, SerializationError> {
        match self {
            Self::Json => serde_json::to_vec(value).map_err(|e| SerializationError::Encode {
                format: self.name(),
                message: e.to_string(),
            }),
            Self::Bincode => bincode::serialize(value).map_err(|e| SerializationError::Encode {
                format: self.name(),
                message: e.to_string(),
            }),
        }
    }

    /// Decode bytes produced by [`ValueFormat::encode`].
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, SerializationError> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| SerializationError::Decode {
                format: self.name(),
                message: e.to_string(),
            }),
            Self::Bincode => bincode::deserialize(bytes).map_err(|e| SerializationError::Decode {
                format: self.name(),
                message: e.to_string(),
            }),
        }
    }
}

/// A serializer that transforms payload bytes on the wire.
///
/// Implementations must be thread-safe: `wrap` and `unwrap` are called
/// concurrently from every worker thread without external locking.
pub trait WireSerializer: Send + Sync {
    /// Value format of the payload carried inside the wire frame.
    fn inner_format(&self) -> ValueFormat;

    /// Outbound transform applied after value encoding.
    fn wrap(&self, body: &[u8]) -> Result<Vec<u8>, SerializationError>;

    /// Inbound transform applied before value decoding.
    ///
    /// Returns the raw payload bytes for the inner value format. A failure
    /// here marks the whole message as rejected.
    fn unwrap(&self, wire: &[u8]) -> Result<Vec<u8>, SerializationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        task: String,
        attempts: u32,
    }

    /// Test: json round-trips a struct
    #[test]
    fn test_json_roundtrip() {
        let payload = Payload {
            task: "emails.send".into(),
            attempts: 3,
        };
        let bytes = ValueFormat::Json.encode(&payload).unwrap();
        let back: Payload = ValueFormat::Json.decode(&bytes).unwrap();
        assert_eq!(back, payload);
    }

    /// Test: bincode round-trips a struct
    #[test]
    fn test_bincode_roundtrip() {
        let payload = Payload {
            task: "emails.send".into(),
            attempts: 3,
        };
        let bytes = ValueFormat::Bincode.encode(&payload).unwrap();
        let back: Payload = ValueFormat::Bincode.decode(&bytes).unwrap();
        assert_eq!(back, payload);
    }

    /// Test: garbage bytes surface as a decode error naming the format
    #[test]
    fn test_json_decode_garbage_fails() {
        let err = ValueFormat::Json.decode::<Payload>(b"not json").unwrap_err();
        match err {
            SerializationError::Decode { format, .. } => assert_eq!(format, "json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
