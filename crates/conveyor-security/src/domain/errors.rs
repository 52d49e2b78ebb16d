//! Security error taxonomy and the scoped error-classification wrapper.

use thiserror::Error;

/// Low-level cryptographic primitive failures.
///
/// These are the "expected" failures of the crypto backend. They never
/// escape this crate raw: [`reraise_security_errors`] converts them into
/// [`SecurityError`] at the service boundary so callers of signing and
/// verification code only ever catch one kind.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key bytes are not a recognized key file or not a valid key.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The private key is encrypted and no passphrase was supplied.
    #[error("private key is encrypted but no passphrase was supplied")]
    PassphraseRequired,

    /// Authenticated decryption of the key file failed.
    #[error("decryption failed (wrong passphrase or corrupted key file)")]
    DecryptionFailed,

    /// Symmetric encryption of key material failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Passphrase-based key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// Canonical encoding of a crypto structure failed.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// Signature verification failed at the primitive level.
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}

/// Authentication failures. Fatal to the message being processed (the
/// message is poison and must be rejected) but never to the worker process.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The signer certificate is not in the trust store, or is outside its
    /// validity window.
    #[error("untrusted certificate: {subject:?} (serial {serial})")]
    UntrustedCertificate {
        /// Subject of the offending certificate.
        subject: String,
        /// Serial of the offending certificate.
        serial: u64,
    },

    /// The envelope signature does not match the body under the stated
    /// digest and the embedded certificate's key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The envelope frame could not be parsed.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Certificate bytes could not be parsed or carry a bad self-signature.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A certificate required to be valid now is outside its window.
    #[error("certificate {subject:?} is outside its validity window")]
    CertificateExpired {
        /// Subject of the expired certificate.
        subject: String,
    },

    /// The configured certificate does not belong to the configured key.
    #[error("certificate public key does not match the signing key")]
    KeyCertificateMismatch,

    /// Two trust-store entries share a fingerprint.
    #[error("duplicate certificate in trust store: {subject:?} (serial {serial})")]
    DuplicateCertificate {
        /// Subject of the duplicated certificate.
        subject: String,
        /// Serial of the duplicated certificate.
        serial: u64,
    },

    /// The envelope names a digest algorithm this build does not know.
    #[error("unknown digest algorithm: {0:?}")]
    UnknownDigest(String),

    /// A cryptographic failure re-raised with scope context by
    /// [`reraise_security_errors`].
    #[error("{scope}: {source}")]
    Crypto {
        /// What was being attempted when the backend failed.
        scope: &'static str,
        /// The original failure, kind and message preserved.
        #[source]
        source: CryptoError,
    },
}

/// Setup/configuration failures. Always fatal to setup; surfaced at process
/// start with the original cause attached.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Authenticated serialization requested without the material for it.
    #[error("security is enabled but {setting} is not configured")]
    MissingSetting {
        /// Name of the absent configuration field.
        setting: &'static str,
    },

    /// A configured byte source could not be read.
    #[error("cannot read {what} from {source_desc}")]
    UnreadableSource {
        /// What the bytes were meant to be (key, certificate, ...).
        what: &'static str,
        /// Description of the source that failed.
        source_desc: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The cryptographic backend failed its capability probe.
    #[error("crypto provider unavailable: {reason}. Signed messaging cannot be enabled in this environment")]
    CryptoUnavailable {
        /// Why the probe failed.
        reason: String,
    },

    /// The configuration names a digest this build does not provide.
    #[error("unknown digest algorithm {name:?} in configuration")]
    UnknownDigest {
        /// The offending name.
        name: String,
    },

    /// The configuration names a payload serializer this build does not
    /// provide.
    #[error("unknown payload serializer {name:?} in configuration")]
    UnknownSerializer {
        /// The offending name.
        name: String,
    },

    /// The configuration file itself could not be parsed.
    #[error("cannot parse configuration file {path}: {message}")]
    Invalid {
        /// Path of the offending file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Top-level error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Per-message authentication failure.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Setup-time configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Raw cryptographic failure that has not yet crossed a
    /// [`reraise_security_errors`] boundary.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Registry/codec failure from the serialization layer.
    #[error(transparent)]
    Serialization(#[from] conveyor_serialization::SerializationError),

    /// Filesystem failure outside any configured byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run `op`, re-raising expected cryptographic failures as [`SecurityError`].
///
/// Only the listed kind, [`Error::Crypto`], is wrapped; the original kind
/// and message travel along as the error source. Every other kind
/// (configuration, I/O, serialization, and plain programming errors)
/// propagates unchanged so it is never misclassified as an authentication
/// problem. A successful result passes through untouched.
pub fn reraise_security_errors<T>(
    scope: &'static str,
    op: impl FnOnce() -> Result<T, Error>,
) -> Result<T, Error> {
    op().map_err(|err| match err {
        Error::Crypto(source) => Error::Security(SecurityError::Crypto { scope, source }),
        other => other,
    })
}
