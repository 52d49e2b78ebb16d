//! The authenticated (signing) serializer.
//!
//! Outbound payload bytes are digested, signed with the trust store's
//! private key, and framed together with the signer's certificate. Inbound
//! envelopes are verified against the trust store before a single payload
//! byte reaches the value codec.

use crate::domain::digest::DigestAlgorithm;
use crate::domain::envelope::SignedEnvelope;
use crate::domain::errors::{Error, SecurityError};
use crate::store::TrustStore;
use conveyor_serialization::{
    SerializationError, SerializerRegistry, ValueFormat, WireSerializer, AUTH, CONTENT_TYPE_AUTH,
};
use ed25519_dalek::Verifier;
use std::sync::Arc;
use tracing::warn;

/// Signs outbound payloads and verifies inbound envelopes.
///
/// Stateless per call; `sign` and `verify` are safe to call concurrently
/// from any number of worker threads.
pub struct AuthSerializer {
    store: Arc<TrustStore>,
    digest: DigestAlgorithm,
    inner: ValueFormat,
}

impl AuthSerializer {
    /// Create a serializer signing with `digest` over payloads encoded in
    /// the `inner` value format.
    pub fn new(store: Arc<TrustStore>, digest: DigestAlgorithm, inner: ValueFormat) -> Self {
        Self {
            store,
            digest,
            inner,
        }
    }

    /// Digest algorithm stamped into outbound envelopes.
    #[must_use]
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    /// Sign payload bytes into a wire envelope.
    pub fn sign(&self, body: &[u8]) -> Result<Vec<u8>, Error> {
        let digest_bytes = self.digest.digest(body);
        let signature = self.store.sign(&digest_bytes);

        let envelope = SignedEnvelope {
            body: body.to_vec(),
            algorithm: self.digest.name().to_owned(),
            signature: signature.to_vec(),
            certificate: self.store.own_certificate().raw().to_vec(),
        };
        Ok(envelope.encode()?)
    }

    /// Verify a wire envelope and hand back the raw payload bytes.
    ///
    /// Rejection order: malformed frame, then untrusted certificate, then
    /// unknown digest, then signature mismatch. The signature is checked
    /// even for trusted signers; a trusted certificate whose key did not
    /// produce this signature is still a forgery.
    pub fn verify(&self, wire: &[u8]) -> Result<Vec<u8>, Error> {
        let envelope = SignedEnvelope::decode(wire)?;

        let certificate = self.store.certificate_for(&envelope.certificate)?;
        if !self.store.is_certificate_trusted(&certificate) {
            warn!(
                subject = %certificate.subject(),
                serial = certificate.serial(),
                "rejecting message: signer certificate is not trusted"
            );
            return Err(SecurityError::UntrustedCertificate {
                subject: certificate.subject().to_owned(),
                serial: certificate.serial(),
            }
            .into());
        }

        let algorithm = DigestAlgorithm::from_name(&envelope.algorithm)
            .ok_or_else(|| SecurityError::UnknownDigest(envelope.algorithm.clone()))?;
        let digest_bytes = algorithm.digest(&envelope.body);

        let signature_bytes: [u8; 64] = envelope
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| SecurityError::InvalidSignature)?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature_bytes);
        certificate
            .verifying_key()
            .verify(&digest_bytes, &signature)
            .map_err(|_| {
                warn!(
                    subject = %certificate.subject(),
                    "rejecting message: signature does not verify"
                );
                SecurityError::InvalidSignature
            })?;

        Ok(envelope.body)
    }
}

impl WireSerializer for AuthSerializer {
    fn inner_format(&self) -> ValueFormat {
        self.inner
    }

    fn wrap(&self, body: &[u8]) -> Result<Vec<u8>, SerializationError> {
        self.sign(body).map_err(SerializationError::rejected)
    }

    fn unwrap(&self, wire: &[u8]) -> Result<Vec<u8>, SerializationError> {
        self.verify(wire).map_err(SerializationError::rejected)
    }
}

/// Register `serializer` as the registry's `auth` serializer.
///
/// Re-registration replaces any serializer from a previous setup.
pub fn register_auth(registry: &SerializerRegistry, serializer: AuthSerializer) {
    registry.register_wire(AUTH, CONTENT_TYPE_AUTH, Arc::new(serializer));
}
