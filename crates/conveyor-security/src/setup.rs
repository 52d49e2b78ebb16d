//! Security bootstrap: the capability probe and the setup orchestrator.
//!
//! `setup_security` is the single entry point application bootstrap calls.
//! It validates configuration, probes the crypto backend, loads the trust
//! store, registers the signing serializer, and locks down the registry's
//! trust policy, failing fast with a [`ConfigError`] on any misstep.

use crate::adapters::sources::{dir_sources, FileSource};
use crate::domain::digest::DigestAlgorithm;
use crate::domain::errors::{ConfigError, Error};
use crate::domain::keys::SigningKeyMaterial;
use crate::ports::outbound::PassphraseResolver;
use crate::serializer::{register_auth, AuthSerializer};
use crate::store::TrustStore;
use conveyor_serialization::{SerializerRegistry, ValueFormat, AUTH, BINCODE, JSON};
use ed25519_dalek::Verifier;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Security configuration, supplied once at bootstrap.
///
/// Re-running setup with a different configuration fully replaces the
/// previous registration and trust policy.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Serializer for outbound task payloads. `"auth"` enables signed
    /// messaging.
    #[serde(default = "default_task_serializer")]
    pub task_serializer: String,

    /// Value format carried inside signed envelopes.
    #[serde(default = "default_payload_serializer")]
    pub payload_serializer: String,

    /// Digest algorithm stamped into outbound envelopes.
    #[serde(default = "default_digest")]
    pub digest: String,

    /// Private key file of this worker.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Certificate file of this worker.
    #[serde(default)]
    pub certificate_file: Option<PathBuf>,

    /// Directory of certificates accepted for verification.
    #[serde(default)]
    pub trust_store_dir: Option<PathBuf>,

    /// Serializers to keep decodable. `None` means the conservative
    /// built-in default.
    #[serde(default)]
    pub trusted_serializers: Option<Vec<String>>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            task_serializer: default_task_serializer(),
            payload_serializer: default_payload_serializer(),
            digest: default_digest(),
            key_file: None,
            certificate_file: None,
            trust_store_dir: None,
            trusted_serializers: None,
        }
    }
}

fn default_task_serializer() -> String {
    JSON.to_owned()
}

fn default_payload_serializer() -> String {
    JSON.to_owned()
}

fn default_digest() -> String {
    "sha1".to_owned()
}

/// Proof that the cryptographic backend works in this process.
///
/// Constructed once through [`CryptoProvider::probe`], which runs a
/// deterministic sign/verify self-check; setup branches on the typed
/// result instead of discovering a broken backend mid-message.
pub struct CryptoProvider {
    _private: (),
}

impl CryptoProvider {
    /// Probe the backend.
    pub fn probe() -> Result<Self, ConfigError> {
        let key = SigningKeyMaterial::from_seed([0x42; 32]);
        let message = b"conveyor-security capability probe";

        let signature = ed25519_dalek::Signature::from_bytes(&key.sign(message));
        key.verifying_key()
            .verify(message, &signature)
            .map_err(|e| ConfigError::CryptoUnavailable {
                reason: format!("ed25519 self-check failed: {e}"),
            })?;

        Ok(Self { _private: () })
    }

    /// A probe result for an unavailable backend. Injection seam for
    /// exercising degraded-environment handling.
    pub fn unavailable(reason: impl Into<String>) -> Result<Self, ConfigError> {
        Err(ConfigError::CryptoUnavailable {
            reason: reason.into(),
        })
    }
}

/// Set up message security from configuration, probing the crypto backend.
///
/// See [`setup_security_with`] for the full contract.
pub fn setup_security(
    registry: &SerializerRegistry,
    config: &SecurityConfig,
    passphrase: &dyn PassphraseResolver,
) -> Result<(), Error> {
    setup_security_with(registry, config, passphrase, CryptoProvider::probe())
}

/// Set up message security from configuration and an already-probed crypto
/// provider.
///
/// Fails with a [`ConfigError`] when the backend probe failed (regardless
/// of other inputs), when authenticated mode is requested without key,
/// certificate, and trust-store sources, or when any source is unreadable.
/// On success the trust store is built, the signing serializer registered,
/// untrusted serializers disabled, and, in authenticated mode, the
/// default serializer set. Repeating the call with the same configuration
/// leaves the registry in the same observable state.
pub fn setup_security_with(
    registry: &SerializerRegistry,
    config: &SecurityConfig,
    passphrase: &dyn PassphraseResolver,
    provider: Result<CryptoProvider, ConfigError>,
) -> Result<(), Error> {
    let _provider = provider?;

    let allow_list = config.trusted_serializers.clone();
    if config.task_serializer != AUTH {
        disable_with(registry, allow_list.as_deref(), false);
        info!(
            task_serializer = %config.task_serializer,
            "security setup complete (unauthenticated mode)"
        );
        return Ok(());
    }

    let key_file = require(config.key_file.as_ref(), "security.key_file")?;
    let certificate_file = require(config.certificate_file.as_ref(), "security.certificate_file")?;
    let trust_store_dir = require(config.trust_store_dir.as_ref(), "security.trust_store_dir")?;

    let digest = DigestAlgorithm::from_name(&config.digest).ok_or_else(|| {
        ConfigError::UnknownDigest {
            name: config.digest.clone(),
        }
    })?;
    let inner = payload_format(&config.payload_serializer)?;

    let root_sources =
        dir_sources(trust_store_dir).map_err(|e| ConfigError::UnreadableSource {
            what: "trust store directory",
            source_desc: trust_store_dir.display().to_string(),
            source: e,
        })?;

    let key_source = FileSource::new(key_file);
    let cert_source = FileSource::new(certificate_file);
    let store = TrustStore::load(&key_source, &cert_source, &root_sources, passphrase)?;

    register_auth(registry, AuthSerializer::new(Arc::new(store), digest, inner));
    disable_with(registry, allow_list.as_deref(), true);
    registry.set_default_serializer(AUTH)?;

    info!(
        digest = digest.name(),
        payload_serializer = %config.payload_serializer,
        "security setup complete (authenticated mode)"
    );
    Ok(())
}

/// Set up message security against the process-wide registry.
pub fn setup_global_security(
    config: &SecurityConfig,
    passphrase: &dyn PassphraseResolver,
) -> Result<(), Error> {
    setup_security(conveyor_serialization::global_registry(), config, passphrase)
}

fn require<'a>(
    value: Option<&'a PathBuf>,
    setting: &'static str,
) -> Result<&'a PathBuf, ConfigError> {
    value.ok_or(ConfigError::MissingSetting { setting })
}

fn payload_format(name: &str) -> Result<ValueFormat, ConfigError> {
    match name {
        JSON => Ok(ValueFormat::Json),
        BINCODE => Ok(ValueFormat::Bincode),
        other => Err(ConfigError::UnknownSerializer {
            name: other.to_owned(),
        }),
    }
}

/// Disable everything outside the allow list. In authenticated mode the
/// `auth` serializer is always part of the allow list.
fn disable_with(registry: &SerializerRegistry, allow: Option<&[String]>, keep_auth: bool) {
    match allow {
        None => registry.disable_untrusted(None),
        Some(listed) => {
            let mut allow: Vec<&str> = listed.iter().map(String::as_str).collect();
            if keep_auth && !allow.contains(&AUTH) {
                allow.push(AUTH);
            }
            registry.disable_untrusted(Some(&allow));
        }
    }
}
