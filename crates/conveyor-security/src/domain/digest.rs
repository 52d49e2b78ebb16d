//! Digest algorithms used to hash a payload body before signing.
//!
//! The algorithm name travels inside the signed envelope, so the namespace
//! here is part of the wire contract. `sha1` is the interop default; the
//! SHA-2 and SHA-3 entries exist for deployments that configure a stronger
//! hash. Signatures are always Ed25519 regardless of digest, so an attacker
//! choosing a weaker listed digest still cannot forge a signature.

use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};
use sha3::Sha3_256;

/// A named digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// SHA-1. Wire-format default.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
    /// SHA3-256.
    Sha3_256,
}

impl DigestAlgorithm {
    /// Resolve an algorithm from its wire name.
    ///
    /// Returns `None` for names outside the closed namespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            "sha3-256" => Some(Self::Sha3_256),
            _ => None,
        }
    }

    /// Wire name of the algorithm.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Sha3_256 => "sha3-256",
        }
    }

    /// Hash `data` with this algorithm.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
            Self::Sha3_256 => Sha3_256::digest(data).to_vec(),
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        Self::Sha1
    }
}
