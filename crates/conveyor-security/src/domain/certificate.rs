//! Sender identity certificates.
//!
//! A certificate is a bincode-encoded document: a body carrying the subject
//! identity, an Ed25519 public key, and a validity window, plus the key's
//! own signature over the canonical body encoding. The self-signature proves
//! key possession at issuance; trust itself is decided by the trust store's
//! flat fingerprint allow-list, never by chain walking.

use super::errors::{CryptoError, SecurityError};
use super::keys::SigningKeyMaterial;
use ed25519_dalek::{Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

/// Current certificate document version.
pub const CERTIFICATE_VERSION: u16 = 1;

/// SHA-256 fingerprint of a certificate's raw encoded bytes.
///
/// The trust store keys its allow-list and parse cache on this.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint arbitrary certificate bytes.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(bytes));
        Self(out)
    }

    /// Raw fingerprint bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time; fingerprints flow through trust decisions.
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.0);
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The signed portion of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    /// Document version; must equal [`CERTIFICATE_VERSION`].
    pub version: u16,
    /// Serial number, random at issuance.
    pub serial: u64,
    /// Subject identity (e.g. `"worker-17@dc1"`).
    pub subject: String,
    /// Issuer identity. Equals `subject` for self-signed certificates.
    pub issuer: String,
    /// Ed25519 public key of the subject.
    pub public_key: [u8; 32],
    /// Start of the validity window, unix seconds.
    pub not_before: u64,
    /// End of the validity window, unix seconds (inclusive).
    pub not_after: u64,
}

/// Wire form: body plus the self-signature over the canonical body encoding.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CertificateDocument {
    body: CertificateBody,
    #[serde_as(as = "Bytes")]
    signature: [u8; 64],
}

/// A parsed, self-signature-checked certificate.
///
/// Immutable once loaded; owned by the trust store that parsed it.
#[derive(Debug, Clone)]
pub struct Certificate {
    body: CertificateBody,
    verifying_key: VerifyingKey,
    raw: Vec<u8>,
    fingerprint: Fingerprint,
}

impl Certificate {
    /// Parse and validate certificate bytes.
    ///
    /// Checks document shape, version, validity-window sanity, public-key
    /// validity, and the self-signature. Does NOT decide trust; that is
    /// the trust store's call.
    pub fn parse(bytes: &[u8]) -> Result<Self, SecurityError> {
        let document: CertificateDocument = bincode::deserialize(bytes)
            .map_err(|e| SecurityError::MalformedCertificate(format!("undecodable: {e}")))?;

        if document.body.version != CERTIFICATE_VERSION {
            return Err(SecurityError::MalformedCertificate(format!(
                "unsupported version {}",
                document.body.version
            )));
        }
        if document.body.not_after < document.body.not_before {
            return Err(SecurityError::MalformedCertificate(
                "validity window ends before it starts".to_owned(),
            ));
        }

        let verifying_key = VerifyingKey::from_bytes(&document.body.public_key)
            .map_err(|_| SecurityError::MalformedCertificate("invalid public key".to_owned()))?;

        let canonical = bincode::serialize(&document.body).map_err(|e| {
            SecurityError::MalformedCertificate(format!("body re-encoding failed: {e}"))
        })?;
        let signature = ed25519_dalek::Signature::from_bytes(&document.signature);
        verifying_key.verify(&canonical, &signature).map_err(|_| {
            SecurityError::MalformedCertificate("self-signature check failed".to_owned())
        })?;

        Ok(Self {
            body: document.body,
            verifying_key,
            fingerprint: Fingerprint::of(bytes),
            raw: bytes.to_vec(),
        })
    }

    /// Issue a self-signed certificate for `key`, valid from now for
    /// `validity_secs` seconds.
    ///
    /// This is how deployments provision worker identities; the resulting
    /// bytes go into every peer's trust store directory.
    pub fn issue_self_signed(
        subject: &str,
        validity_secs: u64,
        key: &SigningKeyMaterial,
    ) -> Result<Self, CryptoError> {
        let now = now_unix();
        let body = CertificateBody {
            version: CERTIFICATE_VERSION,
            serial: OsRng.next_u64(),
            subject: subject.to_owned(),
            issuer: subject.to_owned(),
            public_key: key.public_key_bytes(),
            not_before: now,
            not_after: now.saturating_add(validity_secs),
        };

        let canonical =
            bincode::serialize(&body).map_err(|e| CryptoError::EncodingFailed(e.to_string()))?;
        let document = CertificateDocument {
            body: body.clone(),
            signature: key.sign(&canonical),
        };
        let raw = bincode::serialize(&document)
            .map_err(|e| CryptoError::EncodingFailed(e.to_string()))?;

        Ok(Self {
            body,
            verifying_key: key.verifying_key(),
            fingerprint: Fingerprint::of(&raw),
            raw,
        })
    }

    /// Subject identity.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.body.subject
    }

    /// Issuer identity.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.body.issuer
    }

    /// Serial number.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.body.serial
    }

    /// The subject's verification key.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Whether the certificate is valid at the given unix time.
    #[must_use]
    pub fn valid_at(&self, now: u64) -> bool {
        self.body.not_before <= now && now <= self.body.not_after
    }

    /// Whether the certificate is valid right now.
    #[must_use]
    pub fn is_currently_valid(&self) -> bool {
        self.valid_at(now_unix())
    }

    /// Whether the validity window has ended.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        now_unix() > self.body.not_after
    }

    /// Raw encoded bytes, exactly as parsed or issued.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Fingerprint of the raw encoded bytes.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}


/// Current unix time in seconds.
pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
