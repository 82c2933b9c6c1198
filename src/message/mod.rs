//! Handshake messages and records.
//!
//! Every value owns its bytes so that parsed records can be handed around
//! freely. Parsers are nom combinators; serializers append to a `Vec<u8>`.

mod certificate;
mod certificate_request;
mod certificate_verify;
mod client_hello;
mod client_key_exchange;
mod digitally_signed;
mod encrypted_extensions;
mod extension;
mod finished;
mod handshake;
mod id;
mod key_share;
mod key_update;
mod random;
mod record;
mod server_hello;
mod server_key_exchange;

pub use certificate::Certificate;
pub use certificate_request::{
    CertificateRequest, CLIENT_CERTIFICATE_TYPE_ECDSA_SIGN, CLIENT_CERTIFICATE_TYPE_RSA_SIGN,
};
pub use certificate_verify::CertificateVerify;
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use digitally_signed::DigitallySigned;
pub use encrypted_extensions::EncryptedExtensions;
pub use extension::{Extension, ExtensionContext, ExtensionType};
pub use finished::Finished;
pub use handshake::{Body, Handshake, MessageType};
pub use id::{InvalidLength, SessionId};
pub use key_share::KeyShareEntry;
pub use key_update::{KeyUpdate, KeyUpdateRequest};
pub use random::{Random, DOWNGRADE_TLS12};
pub use record::{Fragment, Record, MAX_FRAGMENT_LEN};
pub use server_hello::ServerHello;
pub use server_key_exchange::{ServerKeyExchange, CURVE_TYPE_NAMED_CURVE};
