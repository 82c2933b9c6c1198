//! tlsengine
//!
//! A server-side TLS 1.2 and TLS 1.3 handshake and record protection engine.
//! Sans-IO: the transport parses records from the wire, hands them to a
//! [`Context`], and sends whatever [`Output`] comes back.
//!
//! Cryptography is pluggable through [`crypto::CryptoProvider`]. The default
//! provider is built on the RustCrypto crates.
//!
//! TLS 1.2 suites:
//!
//! - `TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256`
//! - `TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA`
//! - `TLS_RSA_WITH_AES_128_CBC_SHA256`
//! - `TLS_RSA_WITH_AES_128_CBC_SHA`
//!
//! TLS 1.3 suites:
//!
//! - `TLS_AES_256_GCM_SHA384`
//! - `TLS_CHACHA20_POLY1305_SHA256`
//! - `TLS_AES_128_GCM_SHA256`
//!
//! Only RSA server certificates are supported. Client certificates may be RSA
//! or ECDSA.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

#[macro_use]
extern crate log;

mod alert;
pub mod certificate;
mod config;
mod context;
pub mod crypto;
mod error;
pub mod message;
pub mod negotiation;
mod output;
pub mod session;
mod types;
mod util;

pub use alert::{Alert, AlertDescription, AlertLevel};
pub use certificate::{ClientCertVerifier, ServerIdentity};
pub use config::{Config, ConfigBuilder};
pub use context::Context;
pub use error::Error;
pub use negotiation::Protocol;
pub use output::Output;
pub use session::{SessionInfo, State};
pub use types::{
    CipherSuite, ContentType, HashAlgorithm, KeyAlgorithm, KeyExchangeAlgorithm, NamedGroup,
    ProtocolVersion, SignatureScheme,
};
pub use util::to_hex;
