//! # Conveyor Security
//!
//! Message-authenticity layer for the Conveyor task queue.
//!
//! Task payloads cross a broker the workers do not control. This crate makes
//! sure a payload is only ever deserialized after its signature has been
//! checked against a recognized sender certificate, and that no unsafe
//! serialization format stays decodable once security setup has run.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): pure cryptographic and framing logic, no I/O
//! - **Ports Layer** (`ports/`): capability traits for key/cert material
//! - **Adapters Layer** (`adapters/`): file, in-memory, and TOML config adapters
//! - **Services** (`store`, `serializer`, `setup`): trust store, signing
//!   serializer, and the bootstrap orchestrator
//!
//! ## Security Notes
//!
//! - **Flat trust**: a certificate is trusted iff its raw-bytes fingerprint is
//!   in the loaded trust store and it is inside its validity window. No chain
//!   walking, no revocation.
//! - **Verify before decode**: the signing serializer hands payload bytes to
//!   the value codec only after the envelope signature has been verified.
//! - **Fail closed**: every authentication failure is a [`SecurityError`];
//!   the message is poison and must be rejected, never executed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod serializer;
pub mod setup;
pub mod store;

// Re-export public API
pub use adapters::config::load_security_config;
pub use adapters::sources::{dir_sources, FileSource, MemorySource, NoPassphrase, StaticPassphrase};
pub use domain::certificate::{Certificate, CertificateBody, Fingerprint, CERTIFICATE_VERSION};
pub use domain::digest::DigestAlgorithm;
pub use domain::envelope::{SignedEnvelope, MAX_FIELD_LEN};
pub use domain::errors::{
    reraise_security_errors, ConfigError, CryptoError, Error, SecurityError,
};
pub use domain::keys::SigningKeyMaterial;
pub use ports::outbound::{ByteSource, PassphraseResolver};
pub use serializer::{register_auth, AuthSerializer};
pub use setup::{
    setup_global_security, setup_security, setup_security_with, CryptoProvider, SecurityConfig,
};
pub use store::TrustStore;
