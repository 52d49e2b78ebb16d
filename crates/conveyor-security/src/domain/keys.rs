//! Signing key material.
//!
//! An Ed25519 signing key plus its on-disk form: a bincode `StoredKey` that
//! is either a plain seed or a passphrase-encrypted blob (Argon2id key
//! derivation, ChaCha20-Poly1305 authenticated encryption). Seed buffers are
//! zeroized as soon as the live key is constructed.

use super::errors::CryptoError;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

/// Salt length for key derivation (16 bytes)
pub const SALT_LEN: usize = 16;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_LEN: usize = 12;

/// Ed25519 seed length (32 bytes)
pub const SEED_LEN: usize = 32;

// Argon2id parameters tuned for passphrase-based key encryption:
// 64 MB memory, 3 iterations, 4 lanes.
const ARGON2_MEMORY_KB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

/// On-disk key file layout.
#[derive(Serialize, Deserialize)]
enum StoredKey {
    /// Unencrypted seed.
    Plain {
        seed: [u8; SEED_LEN],
    },
    /// Passphrase-encrypted seed.
    Encrypted {
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
    },
}

/// The worker's private signing key.
///
/// Owned exclusively by the trust store once loaded; never serialized or
/// logged. The seed is cleared from memory on drop.
#[derive(Debug)]
pub struct SigningKeyMaterial {
    key: SigningKey,
}

impl SigningKeyMaterial {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct from a raw seed.
    #[must_use]
    pub fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// The matching verification key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Raw bytes of the matching verification key.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Sign a message. Ed25519 is deterministic, so this needs no RNG.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message).to_bytes()
    }

    /// Load a key file produced by [`export_plain`](Self::export_plain) or
    /// [`export_encrypted`](Self::export_encrypted).
    ///
    /// A passphrase is required for encrypted files and ignored for plain
    /// ones. A wrong passphrase surfaces as [`CryptoError::DecryptionFailed`].
    pub fn load(bytes: &[u8], passphrase: Option<&[u8]>) -> Result<Self, CryptoError> {
        let stored: StoredKey = bincode::deserialize(bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(format!("unrecognized key file: {e}")))?;

        match stored {
            StoredKey::Plain { mut seed } => {
                let key = SigningKey::from_bytes(&seed);
                seed.zeroize();
                Ok(Self { key })
            }
            StoredKey::Encrypted {
                salt,
                nonce,
                ciphertext,
            } => {
                let passphrase = passphrase.ok_or(CryptoError::PassphraseRequired)?;
                let mut derived = derive_key(passphrase, &salt)?;
                let cipher = ChaCha20Poly1305::new(Key::from_slice(&derived));
                derived.zeroize();

                let plaintext = Zeroizing::new(
                    cipher
                        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
                        .map_err(|_| CryptoError::DecryptionFailed)?,
                );
                if plaintext.len() != SEED_LEN {
                    return Err(CryptoError::InvalidPrivateKey(format!(
                        "decrypted seed has length {}, expected {SEED_LEN}",
                        plaintext.len()
                    )));
                }
                let mut seed = [0u8; SEED_LEN];
                seed.copy_from_slice(&plaintext);
                let key = SigningKey::from_bytes(&seed);
                seed.zeroize();
                Ok(Self { key })
            }
        }
    }

    /// Serialize the key as an unencrypted key file.
    pub fn export_plain(&self) -> Result<Vec<u8>, CryptoError> {
        let stored = StoredKey::Plain {
            seed: self.key.to_bytes(),
        };
        bincode::serialize(&stored).map_err(|e| CryptoError::EncodingFailed(e.to_string()))
    }

    /// Serialize the key as a passphrase-encrypted key file.
    pub fn export_encrypted(&self, passphrase: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        let mut derived = derive_key(passphrase, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&derived));
        derived.zeroize();

        let seed = Zeroizing::new(self.key.to_bytes());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), seed.as_slice())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let stored = StoredKey::Encrypted {
            salt,
            nonce,
            ciphertext,
        };
        bincode::serialize(&stored).map_err(|e| CryptoError::EncodingFailed(e.to_string()))
    }
}

impl Drop for SigningKeyMaterial {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes = self.key.to_bytes();
        bytes.zeroize();
    }
}

/// Derive a 32-byte symmetric key from a passphrase with Argon2id.
fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; 32], CryptoError> {
    use argon2::{Algorithm, Argon2, Params, Version};

    let params = Params::new(ARGON2_MEMORY_KB, ARGON2_ITERATIONS, ARGON2_PARALLELISM, Some(32))
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut out)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Ok(out)
}
