//! Cryptographic capabilities used by the handshake engine.
//!
//! [`provider`] defines the pluggable backend traits and [`rust_crypto`] is
//! the default backend. [`Tls12Suite`] and [`Tls13Suite`] wrap a negotiated
//! suite with the key material of one connection.

mod key_schedule;
pub mod provider;
pub mod rust_crypto;
mod suite12;
mod suite13;

pub use key_schedule::{KeySchedule, Secret};
pub use provider::{
    ActiveKeyExchange, AeadCipher, BlockCipher, CryptoProvider, CryptoSafe, HashContext,
    HashProvider, HkdfProvider, HmacProvider, KeyProvider, PrfProvider, PrivateKey, SecureRandom,
    SignatureVerifier, SupportedKxGroup, SupportedTls12CipherSuite, SupportedTls13CipherSuite,
};
pub use suite12::{Role, Tls12Suite};
pub use suite13::{certificate_verify_content, Tls13Suite};
pub use suite13::{CLIENT_CERTIFICATE_VERIFY_CONTEXT, SERVER_CERTIFICATE_VERIFY_CONTEXT};

// Shared types needed by provider implementations
pub use crate::types::{
    CipherSuite, HashAlgorithm, KeyAlgorithm, KeyExchangeAlgorithm, NamedGroup, SignatureScheme,
};
