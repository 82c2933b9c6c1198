//! RustCrypto cryptographic provider implementation.
//!
//! A pure Rust backend built from crates of the
//! [RustCrypto](https://github.com/RustCrypto) organization. It is the
//! provider [`Config`](crate::Config) falls back to when neither an explicit
//! nor an installed default provider exists.
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

mod cipher_suite;
mod hash;
mod hkdf;
mod hmac;
mod kx_group;
mod sign;
mod tls12;

use crate::crypto::provider::CryptoProvider;

/// Get the default RustCrypto-based crypto provider.
///
/// # Supported Cipher Suites
///
/// TLS 1.2:
/// - `TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256` (0xC027)
/// - `TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA` (0xC013)
/// - `TLS_RSA_WITH_AES_128_CBC_SHA256` (0x003C)
/// - `TLS_RSA_WITH_AES_128_CBC_SHA` (0x002F)
///
/// TLS 1.3:
/// - `TLS_AES_256_GCM_SHA384` (0x1302)
/// - `TLS_CHACHA20_POLY1305_SHA256` (0x1303)
/// - `TLS_AES_128_GCM_SHA256` (0x1301)
///
/// # Supported Key Exchange Groups
///
/// - `x25519`, `x448`
/// - `secp521r1`, `secp384r1`, `secp256r1`
///
/// # Signatures
///
/// - RSA PKCS#1 v1.5 and RSA-PSS (rsae) with SHA-256/384/512, for signing
///   and verification
/// - ECDSA with P-256 and P-384, for client certificate verification
///
/// # Key Formats
///
/// PKCS#8 DER (RSA and EC), PKCS#1 DER (RSA) and PEM encoded versions of
/// both.
pub fn default_provider() -> CryptoProvider {
    CryptoProvider {
        kx_groups: kx_group::ALL_KX_GROUPS,
        signature_verification: &sign::SIGNATURE_VERIFIER,
        key_provider: &sign::KEY_PROVIDER,
        secure_random: &tls12::SECURE_RANDOM,
        hash_provider: &hash::HASH_PROVIDER,
        hmac_provider: &hmac::HMAC_PROVIDER,
        tls12_cipher_suites: cipher_suite::ALL_TLS12_CIPHER_SUITES,
        prf_provider: &tls12::PRF_PROVIDER,
        tls13_cipher_suites: cipher_suite::ALL_TLS13_CIPHER_SUITES,
        hkdf_provider: &hkdf::HKDF_PROVIDER,
    }
}
