//! Serialization error types.

use thiserror::Error;

/// Errors produced by the serializer registry and its codecs.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// No serializer registered under the given name.
    #[error("unknown serializer: {0:?}")]
    UnknownSerializer(String),

    /// No serializer registered for the given content type.
    #[error("unknown content type: {0:?}")]
    UnknownContentType(String),

    /// The content type is registered but disabled by the trust policy.
    #[error("refusing to decode disabled content type: {0:?}")]
    ContentTypeDisabled(String),

    /// Outbound encode was requested without a serializer name and no
    /// default serializer has been configured.
    #[error("no default serializer configured")]
    NoDefaultSerializer,

    /// A value could not be encoded in the requested format.
    #[error("encode failed ({format}): {message}")]
    Encode {
        /// Name of the value format that failed.
        format: &'static str,
        /// Underlying codec message.
        message: String,
    },

    /// Payload bytes could not be decoded in the stated format.
    #[error("decode failed ({format}): {message}")]
    Decode {
        /// Name of the value format that failed.
        format: &'static str,
        /// Underlying codec message.
        message: String,
    },

    /// A wire serializer refused the message (for the signing serializer
    /// this is an authentication failure; the message is poison and must
    /// not reach task execution).
    #[error("message rejected: {0}")]
    Rejected(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl SerializationError {
    /// Wrap a wire-serializer rejection, preserving the typed cause.
    pub fn rejected<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Rejected(Box::new(cause))
    }
}
