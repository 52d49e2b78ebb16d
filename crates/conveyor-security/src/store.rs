//! The certificate trust store.
//!
//! Holds the worker's private key and own certificate, plus the flat
//! allow-list of certificates accepted for verification. Trust is a
//! fingerprint lookup and a validity-window check; there is no chain
//! walking.

use crate::domain::certificate::{Certificate, Fingerprint};
use crate::domain::errors::{reraise_security_errors, Error, SecurityError};
use crate::domain::keys::SigningKeyMaterial;
use crate::ports::outbound::{ByteSource, PassphraseResolver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// In-memory holder of the local private key and the set of certificates
/// treated as authoritative for verification.
#[derive(Debug)]
pub struct TrustStore {
    key: SigningKeyMaterial,
    own_certificate: Certificate,
    trusted: HashMap<Fingerprint, Certificate>,
    /// Parse cache for inbound certificate bytes, keyed by raw-bytes
    /// fingerprint. Unbounded: the set of distinct signer certificates in a
    /// deployment is small and stable, and re-parsing per message would
    /// dominate the verify hot path.
    cache: RwLock<HashMap<Fingerprint, Arc<Certificate>>>,
}

impl TrustStore {
    /// Load a trust store from the given sources.
    ///
    /// Fails when the key cannot be read, parsed, or decrypted; when the
    /// own certificate is malformed, outside its validity window, or does
    /// not belong to the key; or when two trust roots share a fingerprint.
    /// Roots that are merely expired load with a warning; they simply
    /// never verify.
    pub fn load(
        key_source: &dyn ByteSource,
        cert_source: &dyn ByteSource,
        root_sources: &[Box<dyn ByteSource>],
        passphrase: &dyn PassphraseResolver,
    ) -> Result<Self, Error> {
        let key_bytes = read_source("private key", key_source)?;
        let resolved = passphrase.resolve();
        let key = reraise_security_errors("unable to load private key", || {
            let secret: Option<&[u8]> = resolved.as_deref().map(Vec::as_slice);
            Ok(SigningKeyMaterial::load(&key_bytes, secret)?)
        })?;

        let cert_bytes = read_source("certificate", cert_source)?;
        let own_certificate = Certificate::parse(&cert_bytes)?;
        if !own_certificate.is_currently_valid() {
            return Err(SecurityError::CertificateExpired {
                subject: own_certificate.subject().to_owned(),
            }
            .into());
        }
        let own_public_key = own_certificate.verifying_key().to_bytes();
        let pairing_ok: bool = own_public_key
            .as_slice()
            .ct_eq(&key.public_key_bytes())
            .into();
        if !pairing_ok {
            return Err(SecurityError::KeyCertificateMismatch.into());
        }

        let mut trusted = HashMap::new();
        for source in root_sources {
            let root_bytes = read_source("trusted certificate", source.as_ref())?;
            let root = Certificate::parse(&root_bytes)?;
            if root.has_expired() {
                warn!(
                    subject = %root.subject(),
                    serial = root.serial(),
                    source = %source.describe(),
                    "trust store contains an expired certificate; it will not verify"
                );
            }
            if let Some(existing) = trusted.insert(root.fingerprint(), root) {
                return Err(SecurityError::DuplicateCertificate {
                    subject: existing.subject().to_owned(),
                    serial: existing.serial(),
                }
                .into());
            }
        }

        info!(
            subject = %own_certificate.subject(),
            trusted_roots = trusted.len(),
            "trust store loaded"
        );

        Ok(Self {
            key,
            own_certificate,
            trusted,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Parse certificate bytes, consulting the fingerprint-keyed cache.
    ///
    /// Errs only for malformed input.
    pub fn certificate_for(&self, bytes: &[u8]) -> Result<Arc<Certificate>, SecurityError> {
        let fingerprint = Fingerprint::of(bytes);
        if let Some(cached) = self.cache.read().get(&fingerprint) {
            return Ok(Arc::clone(cached));
        }
        let parsed = Arc::new(Certificate::parse(bytes)?);
        self.cache
            .write()
            .insert(fingerprint, Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Whether a parsed certificate is trusted right now: present in the
    /// allow-list and inside its validity window.
    #[must_use]
    pub fn is_certificate_trusted(&self, certificate: &Certificate) -> bool {
        self.trusted.contains_key(&certificate.fingerprint()) && certificate.is_currently_valid()
    }

    /// Whether the given certificate bytes are trusted right now.
    ///
    /// Returns `false`, never an error, for syntactically valid but
    /// unknown or out-of-window certificates. Errs only for malformed
    /// input.
    pub fn is_trusted(&self, cert_bytes: &[u8]) -> Result<bool, SecurityError> {
        let certificate = self.certificate_for(cert_bytes)?;
        Ok(self.is_certificate_trusted(&certificate))
    }

    /// The worker's own certificate.
    #[must_use]
    pub fn own_certificate(&self) -> &Certificate {
        &self.own_certificate
    }

    /// Number of certificates in the allow-list.
    #[must_use]
    pub fn trusted_roots(&self) -> usize {
        self.trusted.len()
    }

    /// Sign a message with the store's private key.
    pub(crate) fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message)
    }
}

fn read_source(what: &'static str, source: &dyn ByteSource) -> Result<Vec<u8>, Error> {
    source.read().map_err(|io_err| {
        crate::domain::errors::ConfigError::UnreadableSource {
            what,
            source_desc: source.describe(),
            source: io_err,
        }
        .into()
    })
}
