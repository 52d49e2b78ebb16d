//! Outbound ports: where key and certificate material comes from.
//!
//! Setup never reads files directly; it goes through these capabilities so
//! embedders can supply secret-manager fetches and tests can supply
//! in-memory bytes without touching the filesystem.

use zeroize::Zeroizing;

/// A source of key or certificate bytes.
///
/// Reads are local and synchronous; they happen once, at setup time.
pub trait ByteSource: Send + Sync {
    /// Human-readable description of the source, used in error messages.
    fn describe(&self) -> String;

    /// Read the full contents of the source.
    fn read(&self) -> std::io::Result<Vec<u8>>;
}

/// Resolves the passphrase protecting the private key, if there is one.
///
/// Supplied by configuration, never hardcoded. The resolved passphrase is
/// zeroized after the key is loaded.
pub trait PassphraseResolver: Send + Sync {
    /// Produce the passphrase, or `None` when the key is unencrypted.
    fn resolve(&self) -> Option<Zeroizing<Vec<u8>>>;
}
