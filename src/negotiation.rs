//! Parameter selection from a ClientHello.
//!
//! Every choice is made in server preference order: the client's ordering of
//! its lists never matters. A choice is also only made if the crypto provider
//! can perform it.

use std::fmt;

use crate::alert::AlertDescription;
use crate::config::Config;
use crate::crypto::{ActiveKeyExchange, CryptoProvider};
use crate::message::{ClientHello, KeyShareEntry, Random, SessionId};
use crate::output::Output;
use crate::types::{CipherSuite, KeyAlgorithm, NamedGroup, ProtocolVersion, SignatureScheme};
use crate::Error;

/// The protocol version a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tls12,
    Tls13,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tls12 => write!(f, "TLS 1.2"),
            Protocol::Tls13 => write!(f, "TLS 1.3"),
        }
    }
}

/// Everything decided while negotiating, plus the per-connection values the
/// handshake fills in as it goes.
pub struct NegotiationParams {
    pub protocol: Protocol,
    pub cipher_suite: CipherSuite,
    /// ECDHE curve. Set for ECDHE suites and TLS 1.3.
    pub curve: Option<NamedGroup>,
    pub signature_scheme: Option<SignatureScheme>,
    /// The client's key share for TLS 1.3.
    pub key_share: Option<KeyShareEntry>,
    pub client_version: ProtocolVersion,
    pub client_random: Random,
    pub server_random: Random,
    pub session_id: SessionId,
    /// Ephemeral ECDH key of a TLS 1.2 ECDHE handshake, dropped once the
    /// ClientKeyExchange is processed.
    pub ephemeral: Option<Box<dyn ActiveKeyExchange>>,
    pub require_client_certificate: bool,
    pub require_server_name: bool,
    pub enable_tls13: bool,
}

impl fmt::Debug for NegotiationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationParams")
            .field("protocol", &self.protocol)
            .field("cipher_suite", &self.cipher_suite)
            .field("curve", &self.curve)
            .field("signature_scheme", &self.signature_scheme)
            .field("key_share", &self.key_share.as_ref().map(|k| k.group))
            .field("ephemeral", &self.ephemeral.is_some())
            .finish()
    }
}

/// Outcome of [`negotiate`].
#[derive(Debug)]
pub enum Negotiation {
    Accepted(NegotiationParams),
    /// No acceptable parameters. The output is a fatal alert.
    Rejected(Output),
}

/// The most preferred group the client supports and the provider implements.
pub fn select_curve(groups: &[NamedGroup], provider: &CryptoProvider) -> Option<NamedGroup> {
    NamedGroup::PREFERENCE
        .into_iter()
        .find(|g| groups.contains(g) && provider.find_kx_group(*g).is_some())
}

/// The most preferred signature scheme for a certificate key.
///
/// Only RSA certificates can sign.
pub fn select_signature_algorithm(
    key_algorithm: KeyAlgorithm,
    algorithms: &[SignatureScheme],
) -> Option<SignatureScheme> {
    if key_algorithm != KeyAlgorithm::Rsa {
        return None;
    }
    SignatureScheme::RSA_PREFERENCE
        .into_iter()
        .find(|s| algorithms.contains(s))
}

/// The client key share for the most preferred group.
pub fn select_key_share<'a>(
    entries: &'a [KeyShareEntry],
    provider: &CryptoProvider,
) -> Option<&'a KeyShareEntry> {
    NamedGroup::PREFERENCE.into_iter().find_map(|g| {
        provider.find_kx_group(g)?;
        entries.iter().find(|e| e.group == g)
    })
}

/// Whether the client can complete a TLS 1.3 handshake with us.
pub fn is_tls13_capable(
    client_hello: &ClientHello,
    key_algorithm: KeyAlgorithm,
    provider: &CryptoProvider,
) -> bool {
    client_hello
        .supported_versions()
        .contains(&ProtocolVersion::TLS1_3)
        && select_key_share(client_hello.key_shares(), provider).is_some()
        && select_cipher_suite(client_hello, true, key_algorithm, provider).is_some()
}

/// The most preferred cipher suite offered by the client for the protocol
/// version.
///
/// A suite needing a curve or a signature is only chosen when both can be
/// selected.
pub fn select_cipher_suite(
    client_hello: &ClientHello,
    tls13: bool,
    key_algorithm: KeyAlgorithm,
    provider: &CryptoProvider,
) -> Option<CipherSuite> {
    let has_curve = select_curve(client_hello.supported_groups(), provider).is_some();
    let has_signature =
        select_signature_algorithm(key_algorithm, client_hello.signature_algorithms()).is_some();
    let offered = |s: &CipherSuite| client_hello.cipher_suites.contains(s);

    if tls13 {
        if !(has_curve && has_signature) {
            return None;
        }
        return CipherSuite::TLS13_PREFERENCE
            .into_iter()
            .find(|s| offered(s) && provider.find_tls13_suite(*s).is_some());
    }

    if key_algorithm != KeyAlgorithm::Rsa {
        return None;
    }
    CipherSuite::TLS12_RSA_PREFERENCE.into_iter().find(|s| {
        offered(s)
            && provider.find_tls12_suite(*s).is_some()
            && (!s.is_ecdhe() || (has_curve && has_signature))
    })
}

/// Decide protocol version, suite, curve, signature and key share.
///
/// Protocol failures come back as [`Negotiation::Rejected`]. An `Err` means
/// an internal invariant was broken.
pub fn negotiate(
    client_hello: &ClientHello,
    key_algorithm: KeyAlgorithm,
    config: &Config,
) -> Result<Negotiation, Error> {
    let provider = config.crypto_provider();
    let tls13 =
        config.enable_tls13() && is_tls13_capable(client_hello, key_algorithm, provider);

    let curve = select_curve(client_hello.supported_groups(), provider);
    let signature_scheme =
        select_signature_algorithm(key_algorithm, client_hello.signature_algorithms());

    let mut params = NegotiationParams {
        protocol: Protocol::Tls12,
        cipher_suite: CipherSuite::default(),
        curve: None,
        signature_scheme: None,
        key_share: None,
        client_version: client_hello.client_version,
        client_random: client_hello.random,
        server_random: Random::default(),
        session_id: SessionId::empty(),
        ephemeral: None,
        require_client_certificate: config.require_client_certificate(),
        require_server_name: config.require_server_name(),
        enable_tls13: config.enable_tls13(),
    };

    if tls13 {
        let cipher_suite = select_cipher_suite(client_hello, true, key_algorithm, provider)
            .ok_or_else(|| Error::Internal("no TLS 1.3 cipher suite".to_string()))?;
        let key_share = select_key_share(client_hello.key_shares(), provider)
            .ok_or_else(|| Error::Internal("no TLS 1.3 key share".to_string()))?;
        params.protocol = Protocol::Tls13;
        params.cipher_suite = cipher_suite;
        params.curve =
            Some(curve.ok_or_else(|| Error::Internal("no TLS 1.3 curve".to_string()))?);
        params.signature_scheme = Some(
            signature_scheme
                .ok_or_else(|| Error::Internal("no TLS 1.3 signature".to_string()))?,
        );
        params.key_share = Some(key_share.clone());

        debug!(
            "Negotiated TLS 1.3 {:?} with {:?}",
            cipher_suite, key_share.group
        );
        return Ok(Negotiation::Accepted(params));
    }

    if client_hello.client_version.as_u16() < ProtocolVersion::TLS1_2.as_u16() {
        return Ok(Negotiation::Rejected(Output::fatal(
            AlertDescription::ProtocolVersion,
            format!(
                "client version {:#06x} is below TLS 1.2",
                client_hello.client_version.as_u16()
            ),
        )));
    }

    let Some(cipher_suite) = select_cipher_suite(client_hello, false, key_algorithm, provider)
    else {
        return Ok(Negotiation::Rejected(Output::fatal(
            AlertDescription::HandshakeFailure,
            "no shared cipher suite",
        )));
    };

    params.cipher_suite = cipher_suite;
    params.curve = curve;
    params.signature_scheme = signature_scheme;

    debug!(
        "Negotiated TLS 1.2 {:?}, curve {:?}, signature {:?}",
        cipher_suite, curve, signature_scheme
    );
    Ok(Negotiation::Accepted(params))
}
