//! Cryptographic provider traits for pluggable crypto backends.
//!
//! The handshake engine never touches a cipher, hash or curve directly. It
//! asks a [`CryptoProvider`], which holds static references to trait objects
//! each representing one cryptographic capability.
//!
//! # Architecture
//!
//! - **TLS 1.2 cipher suites** ([`SupportedTls12CipherSuite`]): factory for
//!   CBC block ciphers, plus the MAC and PRF hash of the suite
//! - **TLS 1.3 cipher suites** ([`SupportedTls13CipherSuite`]): factory for
//!   AEAD ciphers
//! - **Key exchange groups** ([`SupportedKxGroup`]): factory for ephemeral
//!   ECDHE key pairs
//! - **Signature verification** ([`SignatureVerifier`]): verify a peer
//!   signature against its certificate
//! - **Key provider** ([`KeyProvider`]): load the server private key
//! - **Secure random** ([`SecureRandom`])
//! - **Hash provider** ([`HashProvider`]): factory for hash contexts
//! - **PRF provider** ([`PrfProvider`]): TLS 1.2 PRF
//! - **HMAC provider** ([`HmacProvider`])
//! - **HKDF provider** ([`HkdfProvider`]): TLS 1.3 key derivation
//!
//! # Using a Custom Provider
//!
//! ```no_run
//! use std::sync::Arc;
//! use tlsengine::Config;
//! use tlsengine::crypto::rust_crypto;
//!
//! let config = Arc::new(
//!     Config::builder()
//!         .with_crypto_provider(rust_crypto::default_provider())
//!         .build()
//!         .unwrap()
//! );
//! ```
//!
//! A custom provider is built by implementing the traits, creating static
//! instances of the implementations and filling in a [`CryptoProvider`].
//! Any field can be borrowed from the default provider.
//!
//! # Thread Safety
//!
//! All provider traits require `Send + Sync + UnwindSafe + RefUnwindSafe`.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

use once_cell::sync::OnceCell;
use zeroize::Zeroizing;

use crate::types::{
    CipherSuite, HashAlgorithm, KeyAlgorithm, KeyExchangeAlgorithm, NamedGroup, SignatureScheme,
};

// ============================================================================
// Marker Trait
// ============================================================================

/// Marker trait for types that are safe to use in crypto provider components.
///
/// Automatically implemented for all types satisfying the bounds.
pub trait CryptoSafe: Send + Sync + Debug + UnwindSafe + RefUnwindSafe {}

impl<T: Send + Sync + Debug + UnwindSafe + RefUnwindSafe> CryptoSafe for T {}

// ============================================================================
// Instance Traits (created by factories)
// ============================================================================

/// Block cipher in CBC mode, without padding.
///
/// `data` must be a multiple of the block size. The TLS record layer does
/// its own padding.
pub trait BlockCipher: CryptoSafe {
    /// Block size in bytes.
    fn block_len(&self) -> usize;

    /// Encrypt `data` in place under `iv`.
    fn encrypt(&self, iv: &[u8], data: &mut [u8]) -> Result<(), String>;

    /// Decrypt `data` in place under `iv`.
    fn decrypt(&self, iv: &[u8], data: &mut [u8]) -> Result<(), String>;
}

/// AEAD cipher for in-place sealing and opening.
pub trait AeadCipher: CryptoSafe {
    /// Encrypt `data` in place, appending the authentication tag.
    fn seal(&self, nonce: &[u8], aad: &[u8], data: &mut Vec<u8>) -> Result<(), String>;

    /// Decrypt `data` in place, verifying and removing the authentication tag.
    fn open(&self, nonce: &[u8], aad: &[u8], data: &mut Vec<u8>) -> Result<(), String>;
}

/// Stateful hash context for incremental hashing.
pub trait HashContext: CryptoSafe {
    /// Update the hash with new data.
    fn update(&mut self, data: &[u8]);

    /// Finalize a clone of the context. The original can keep going.
    fn clone_and_finalize(&self) -> Vec<u8>;
}

/// Active key exchange instance (ephemeral key pair for one handshake).
pub trait ActiveKeyExchange: CryptoSafe {
    /// The public key to send to the peer.
    fn pub_key(&self) -> &[u8];

    /// Complete the exchange with the peer's public key.
    ///
    /// Consumes the ephemeral private key.
    fn complete(self: Box<Self>, peer_pub: &[u8]) -> Result<Zeroizing<Vec<u8>>, String>;

    /// The named group of this exchange.
    fn group(&self) -> NamedGroup;
}

/// A loaded server private key.
pub trait PrivateKey: CryptoSafe {
    /// Public key algorithm of the key.
    fn algorithm(&self) -> KeyAlgorithm;

    /// Sign `data` using `scheme`. The data is hashed by the implementation.
    fn sign(&self, data: &[u8], scheme: SignatureScheme) -> Result<Vec<u8>, String>;

    /// Decrypt a PKCS#1 v1.5 ciphertext (TLS 1.2 RSA key exchange).
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, String>;
}

// ============================================================================
// Factory Traits (used by CryptoProvider)
// ============================================================================

/// TLS 1.2 cipher suite support (factory for [`BlockCipher`] instances).
pub trait SupportedTls12CipherSuite: CryptoSafe {
    /// The cipher suite this supports.
    fn suite(&self) -> CipherSuite;

    /// How the pre-master secret is established.
    fn key_exchange(&self) -> KeyExchangeAlgorithm;

    /// Hash of the PRF and the Finished transcript.
    fn hash_algorithm(&self) -> HashAlgorithm;

    /// Hash of the record MAC.
    fn mac_algorithm(&self) -> HashAlgorithm;

    /// Key material lengths: (mac_key_len, enc_key_len).
    fn key_lengths(&self) -> (usize, usize);

    /// Create a cipher instance with the given key.
    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn BlockCipher>, String>;
}

/// TLS 1.3 cipher suite support (factory for [`AeadCipher`] instances).
///
/// TLS 1.3 suites only name the AEAD and hash. Key exchange is negotiated
/// separately.
pub trait SupportedTls13CipherSuite: CryptoSafe {
    /// The cipher suite this supports.
    fn suite(&self) -> CipherSuite;

    /// Hash algorithm used by this suite.
    fn hash_algorithm(&self) -> HashAlgorithm;

    /// AEAD key length in bytes.
    fn key_len(&self) -> usize;

    /// AEAD nonce/IV length in bytes.
    fn iv_len(&self) -> usize;

    /// AEAD tag length in bytes.
    fn tag_len(&self) -> usize;

    /// Create a cipher instance with the given key.
    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn AeadCipher>, String>;
}

/// Key exchange group support (factory for [`ActiveKeyExchange`]).
pub trait SupportedKxGroup: CryptoSafe {
    /// Named group for this key exchange group.
    fn name(&self) -> NamedGroup;

    /// Start a new key exchange, generating an ephemeral key pair.
    fn start_exchange(&self) -> Result<Box<dyn ActiveKeyExchange>, String>;
}

/// Signature verification against certificates.
pub trait SignatureVerifier: CryptoSafe {
    /// Verify `signature` over `data` with the key in a DER-encoded X.509
    /// certificate.
    fn verify_signature(
        &self,
        cert_der: &[u8],
        data: &[u8],
        signature: &[u8],
        scheme: SignatureScheme,
    ) -> Result<(), String>;
}

/// Private key parser (factory for [`PrivateKey`]).
pub trait KeyProvider: CryptoSafe {
    /// Parse and load a private key from DER or PEM bytes.
    fn load_private_key(&self, key_der: &[u8]) -> Result<Box<dyn PrivateKey>, String>;
}

/// Secure random number generator.
pub trait SecureRandom: CryptoSafe {
    /// Fill buffer with cryptographically secure random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<(), String>;
}

/// Hash provider (factory for [`HashContext`]).
pub trait HashProvider: CryptoSafe {
    /// Create a new hash context for the specified algorithm.
    fn create_hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn HashContext>, String>;
}

/// TLS 1.2 PRF (RFC 5246 Section 5).
pub trait PrfProvider: CryptoSafe {
    /// PRF(secret, label, seed) truncated to `output_len` bytes.
    fn prf_tls12(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        output_len: usize,
        hash: HashAlgorithm,
    ) -> Result<Zeroizing<Vec<u8>>, String>;
}

/// HMAC provider.
pub trait HmacProvider: CryptoSafe {
    /// Compute HMAC_hash(key, data).
    fn hmac(&self, hash: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, String>;
}

/// HKDF provider for TLS 1.3 key derivation (RFC 5869).
pub trait HkdfProvider: CryptoSafe {
    /// PRK = HKDF-Extract(salt, IKM)
    fn hkdf_extract(
        &self,
        hash: HashAlgorithm,
        salt: &[u8],
        ikm: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, String>;

    /// OKM = HKDF-Expand(PRK, info, L)
    fn hkdf_expand(
        &self,
        hash: HashAlgorithm,
        prk: &[u8],
        info: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, String>;

    /// HKDF-Expand-Label (RFC 8446 Section 7.1).
    ///
    /// HkdfLabel = struct {
    ///     uint16 length;
    ///     opaque label<7..255> = "tls13 " + Label;
    ///     opaque context<0..255> = Context;
    /// }
    fn hkdf_expand_label(
        &self,
        hash: HashAlgorithm,
        secret: &[u8],
        label: &[u8],
        context: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, String>;
}

// ============================================================================
// Core Provider Struct
// ============================================================================

/// Cryptographic provider for the TLS engine.
///
/// Holds references to all cryptographic components. Any component can be
/// replaced with a custom implementation.
///
/// # Version-Specific Components
///
/// - **TLS 1.2**: `tls12_cipher_suites` and `prf_provider`
/// - **TLS 1.3**: `tls13_cipher_suites` and `hkdf_provider`
///
/// The remaining components are shared.
#[derive(Debug, Clone)]
pub struct CryptoProvider {
    // =========================================================================
    // Shared components
    // =========================================================================
    /// Supported key exchange groups.
    pub kx_groups: &'static [&'static dyn SupportedKxGroup],

    /// Signature verification for client certificates.
    pub signature_verification: &'static dyn SignatureVerifier,

    /// Key provider for parsing the server private key.
    pub key_provider: &'static dyn KeyProvider,

    /// Secure random number generator.
    pub secure_random: &'static dyn SecureRandom,

    /// Hash provider for transcript hashing.
    pub hash_provider: &'static dyn HashProvider,

    /// HMAC provider for record MACs and TLS 1.3 Finished.
    pub hmac_provider: &'static dyn HmacProvider,

    // =========================================================================
    // TLS 1.2 specific components
    // =========================================================================
    /// Supported TLS 1.2 cipher suites.
    pub tls12_cipher_suites: &'static [&'static dyn SupportedTls12CipherSuite],

    /// PRF for TLS 1.2 key derivation.
    pub prf_provider: &'static dyn PrfProvider,

    // =========================================================================
    // TLS 1.3 specific components
    // =========================================================================
    /// Supported TLS 1.3 cipher suites.
    pub tls13_cipher_suites: &'static [&'static dyn SupportedTls13CipherSuite],

    /// HKDF provider for TLS 1.3 key derivation.
    pub hkdf_provider: &'static dyn HkdfProvider,
}

static DEFAULT: OnceCell<CryptoProvider> = OnceCell::new();

impl CryptoProvider {
    /// Install a default crypto provider for the process.
    ///
    /// [`Config::builder()`](crate::Config::builder) uses it when no explicit
    /// provider is given. Returns the provider back if a default was already
    /// installed.
    pub fn install_default(provider: CryptoProvider) -> Result<(), CryptoProvider> {
        DEFAULT.set(provider)
    }

    /// Get the default crypto provider, if one has been installed.
    pub fn get_default() -> Option<&'static CryptoProvider> {
        DEFAULT.get()
    }

    /// The TLS 1.2 implementation of `suite`, if supported.
    pub fn find_tls12_suite(
        &self,
        suite: CipherSuite,
    ) -> Option<&'static dyn SupportedTls12CipherSuite> {
        self.tls12_cipher_suites
            .iter()
            .copied()
            .find(|s| s.suite() == suite)
    }

    /// The TLS 1.3 implementation of `suite`, if supported.
    pub fn find_tls13_suite(
        &self,
        suite: CipherSuite,
    ) -> Option<&'static dyn SupportedTls13CipherSuite> {
        self.tls13_cipher_suites
            .iter()
            .copied()
            .find(|s| s.suite() == suite)
    }

    /// The key exchange implementation of `group`, if supported.
    pub fn find_kx_group(&self, group: NamedGroup) -> Option<&'static dyn SupportedKxGroup> {
        self.kx_groups.iter().copied().find(|g| g.name() == group)
    }

    /// Sanity check that the provider can run at least one handshake.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.tls12_cipher_suites.is_empty() && self.tls13_cipher_suites.is_empty() {
            return Err("crypto provider has no cipher suites".to_string());
        }
        for s in self.tls12_cipher_suites {
            if s.suite().is_tls13() {
                return Err(format!("{:?} is not a TLS 1.2 cipher suite", s.suite()));
            }
        }
        for s in self.tls13_cipher_suites {
            if !s.suite().is_tls13() {
                return Err(format!("{:?} is not a TLS 1.3 cipher suite", s.suite()));
            }
        }
        let needs_kx = !self.tls13_cipher_suites.is_empty()
            || self
                .tls12_cipher_suites
                .iter()
                .any(|s| s.key_exchange() == KeyExchangeAlgorithm::Ecdhe);
        if needs_kx && self.kx_groups.is_empty() {
            return Err("crypto provider has ECDHE suites but no key exchange groups".to_string());
        }
        Ok(())
    }
}
