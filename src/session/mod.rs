// Server Handshake Flow:
//
// TLS 1.2
// 1. Client sends ClientHello
// 2. Server sends ServerHello, Certificate, ServerKeyExchange (ECDHE only),
//    CertificateRequest (if required), ServerHelloDone
// 3. Client sends Certificate (if requested), ClientKeyExchange,
//    CertificateVerify (if client cert), ChangeCipherSpec, Finished
// 4. Server verifies Finished, then sends ChangeCipherSpec, Finished
// 5. Handshake complete, application data can flow
//
// TLS 1.3
// 1. Client sends ClientHello with a key share
// 2. Server sends ServerHello, ChangeCipherSpec and one protected record
//    with EncryptedExtensions, CertificateRequest (if required),
//    Certificate, CertificateVerify, Finished
// 3. Client sends ChangeCipherSpec (ignored), then protected Certificate,
//    CertificateVerify (if client cert), Finished
// 4. Handshake complete, application data and KeyUpdate can flow

mod info;
mod protection;
mod tls12;
mod tls13;
mod transcript;

use std::sync::Arc;

pub use info::{Direction, SessionInfo};
pub use transcript::Transcript;

use crate::alert::{Alert, AlertDescription};
use crate::certificate::ServerIdentity;
use crate::crypto::{Role, Secret, Tls12Suite, Tls13Suite};
use crate::message::{ClientHello, Handshake, Random, Record, SessionId};
use crate::negotiation::{NegotiationParams, Protocol};
use crate::output::Output;
use crate::types::{CipherSuite, ContentType, SignatureScheme};
use crate::{Config, Error};

/// Handshake progress, in the order the states are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Nothing received yet.
    None,

    /// ClientHello accepted, server flight being built.
    ClientHello,

    /// Server flight sent. Awaiting the client's key exchange (1.2) or
    /// its protected flight (1.3).
    ServerHelloDone,

    /// Keys derived from the ClientKeyExchange.
    ClientKeyExchange,

    /// Client switched to protected records.
    ClientChangeCipherSpec,

    /// Client Finished verified.
    ClientFinished,

    /// Server Finished sent. Application data may flow.
    ServerFinished,
}

/// Signature schemes accepted for client CertificateVerify.
const CLIENT_SIGNATURE_SCHEMES: &[SignatureScheme] = &[
    SignatureScheme::ECDSA_SECP256R1_SHA256,
    SignatureScheme::ECDSA_SECP384R1_SHA384,
    SignatureScheme::RSA_PSS_RSAE_SHA256,
    SignatureScheme::RSA_PSS_RSAE_SHA384,
    SignatureScheme::RSA_PSS_RSAE_SHA512,
    SignatureScheme::RSA_PKCS1_SHA256,
    SignatureScheme::RSA_PKCS1_SHA384,
    SignatureScheme::RSA_PKCS1_SHA512,
];

/// Early exit from a handler.
pub(crate) enum Stop {
    /// Reported to the peer.
    Alert(Output),
    /// Reported to the caller.
    Fault(Error),
}

impl From<Error> for Stop {
    fn from(e: Error) -> Self {
        Stop::Fault(e)
    }
}

type Flow<T> = Result<T, Stop>;

fn fatal(description: AlertDescription, message: impl Into<String>) -> Stop {
    Stop::Alert(Output::fatal(description, message))
}

fn unexpected(what: impl std::fmt::Display, state: State) -> Stop {
    fatal(
        AlertDescription::UnexpectedMessage,
        format!("{} in state {:?}", what, state),
    )
}

trait OrAlert<T> {
    fn or_alert(self, description: AlertDescription) -> Flow<T>;
}

impl<T> OrAlert<T> for Result<T, String> {
    fn or_alert(self, description: AlertDescription) -> Flow<T> {
        self.map_err(|e| fatal(description, e))
    }
}

struct Keys13 {
    suite: Tls13Suite,
    /// Client application secret, installed once the client Finished checks.
    client_application_secret: Option<Secret>,
}

enum Keys {
    Tls12(Tls12Suite),
    Tls13(Box<Keys13>),
}

/// Per-connection handshake state machine.
pub struct Session {
    config: Arc<Config>,
    identity: Arc<ServerIdentity>,
    params: NegotiationParams,
    state: State,
    send_seq: u64,
    recv_seq: u64,
    transcript: Transcript,
    client_certificates: Option<Vec<Vec<u8>>>,
    client_certificate_verified: bool,
    keys: Keys,
    terminated: bool,
    info: SessionInfo,
}

impl Session {
    pub fn new(
        config: Arc<Config>,
        identity: Arc<ServerIdentity>,
        params: NegotiationParams,
    ) -> Result<Session, Error> {
        let provider = config.crypto_provider().clone();
        let keys = match params.protocol {
            Protocol::Tls12 => {
                let suite = provider
                    .find_tls12_suite(params.cipher_suite)
                    .ok_or_else(|| missing_suite(params.cipher_suite))?;
                Keys::Tls12(Tls12Suite::new(suite, provider, Role::Server))
            }
            Protocol::Tls13 => {
                let suite = provider
                    .find_tls13_suite(params.cipher_suite)
                    .ok_or_else(|| missing_suite(params.cipher_suite))?;
                Keys::Tls13(Box::new(Keys13 {
                    suite: Tls13Suite::new(suite, provider),
                    client_application_secret: None,
                }))
            }
        };

        Ok(Session {
            config,
            identity,
            params,
            state: State::None,
            send_seq: 0,
            recv_seq: 0,
            transcript: Transcript::new(),
            client_certificates: None,
            client_certificate_verified: false,
            keys,
            terminated: false,
            info: SessionInfo::new(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn protocol(&self) -> Protocol {
        self.params.protocol
    }

    pub fn cipher_suite(&self) -> CipherSuite {
        self.params.cipher_suite
    }

    pub fn params(&self) -> &NegotiationParams {
        &self.params
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn session_info(&self) -> &SessionInfo {
        &self.info
    }

    /// Client chain accepted by the validator, leaf first.
    pub fn client_certificates(&self) -> Option<&[Vec<u8>]> {
        self.client_certificates.as_deref()
    }

    /// Whether the next TLS 1.2 Handshake record is ciphertext.
    pub fn expects_encrypted_handshake(&self) -> bool {
        self.params.protocol == Protocol::Tls12 && self.state == State::ClientChangeCipherSpec
    }

    /// Handle one inbound record.
    pub fn process_record(&mut self, record: Record) -> Result<Output, Error> {
        if self.terminated {
            return Err(Error::SessionTerminated);
        }
        trace!("Process {:?} record in {:?}", record.content_type(), self.state);

        let flow = match self.params.protocol {
            Protocol::Tls12 => self.process_record12(record),
            Protocol::Tls13 => self.process_record13(record),
        };
        self.finish(flow)
    }

    /// Protect outbound application data.
    pub fn encrypt_application_data(&mut self, data: &[u8]) -> Result<Output, Error> {
        if self.terminated {
            return Err(Error::SessionTerminated);
        }
        if self.state != State::ServerFinished {
            return Err(Error::UnsupportedOperation(format!(
                "application data in state {:?}",
                self.state
            )));
        }
        if data.is_empty() {
            return Ok(Output::None);
        }

        let flow = match &self.keys {
            Keys::Tls12(suite) => {
                protection::seal_application_data12(suite, &mut self.send_seq, data)
            }
            Keys::Tls13(keys) => protection::seal13(
                &keys.suite,
                &mut self.send_seq,
                ContentType::ApplicationData,
                data,
            ),
        };
        self.finish(flow.map(Output::Packet))
    }

    fn finish(&mut self, flow: Flow<Output>) -> Result<Output, Error> {
        match flow {
            Ok(output) | Err(Stop::Alert(output)) => {
                if let Output::Alert {
                    description,
                    message,
                    fatal,
                } = &output
                {
                    if *fatal {
                        warn!("Fatal alert {}: {}", description, message);
                        self.terminated = true;
                    } else {
                        debug!("Alert {}: {}", description, message);
                    }
                }
                Ok(output)
            }
            Err(Stop::Fault(e)) => Err(e),
        }
    }

    fn on_alert(&mut self, alert: Alert) -> Output {
        if alert.description == AlertDescription::CloseNotify {
            debug!("Peer sent close_notify");
            self.terminated = true;
            return Output::Alert {
                description: AlertDescription::CloseNotify,
                message: "peer closed the connection".to_string(),
                fatal: false,
            };
        }
        Output::Alert {
            description: AlertDescription::UnexpectedMessage,
            message: format!("received {} alert", alert.description),
            fatal: alert.is_fatal(),
        }
    }

    fn record_info(&mut self, handshake: &Handshake, from: Direction) {
        if self.config.session_info() {
            self.info.record(handshake, from);
        }
    }

    /// Append a message to the transcript, recording it when enabled.
    fn append(&mut self, handshake: &Handshake, from: Direction) {
        self.transcript.push(handshake.to_bytes());
        self.record_info(handshake, from);
    }

    /// Checks shared by both versions before answering a ClientHello.
    fn accept_client_hello(&mut self, client_hello: &ClientHello) -> Flow<()> {
        if self.state != State::None {
            return Err(unexpected("ClientHello", self.state));
        }

        if self.params.require_server_name {
            let Some(names) = client_hello.server_names() else {
                return Err(fatal(
                    AlertDescription::MissingExtension,
                    "server_name extension is required",
                ));
            };
            if !names.iter().any(|n| self.identity.matches_server_name(n)) {
                return Err(fatal(
                    AlertDescription::UnrecognizedName,
                    format!("no certificate for {:?}", names),
                ));
            }
        }

        self.state = State::ClientHello;
        self.params.client_random = client_hello.random;

        let random = Random::new();
        self.params.server_random =
            if self.params.protocol == Protocol::Tls12 && self.params.enable_tls13 {
                random.with_downgrade_marker()
            } else {
                random
            };
        self.params.session_id = match self.params.protocol {
            Protocol::Tls12 => SessionId::random(),
            Protocol::Tls13 => client_hello.session_id,
        };

        debug!("ClientHello accepted for {}", self.params.protocol);
        Ok(())
    }

    /// Shared handling of a client Certificate message.
    fn client_certificate(&mut self, chain: Vec<Vec<u8>>) -> Flow<Output> {
        if self.state != State::ServerHelloDone {
            return Err(unexpected("Certificate", self.state));
        }
        if !self.params.require_client_certificate {
            return Err(fatal(
                AlertDescription::UnexpectedMessage,
                "client certificate was not requested",
            ));
        }
        if self.client_certificates.is_some() {
            return Err(fatal(
                AlertDescription::UnexpectedMessage,
                "repeated client Certificate",
            ));
        }
        if chain.is_empty() {
            let description = match self.params.protocol {
                Protocol::Tls12 => AlertDescription::HandshakeFailure,
                Protocol::Tls13 => AlertDescription::CertificateRequired,
            };
            return Err(fatal(description, "client sent no certificate"));
        }

        let verifier = self.config.client_cert_verifier().ok_or_else(|| {
            Error::ConfigError("client certificates are required but no validator is set".into())
        })?;
        if !verifier.verify(&chain) {
            return Err(fatal(
                AlertDescription::BadCertificate,
                "client certificate rejected",
            ));
        }

        debug!("Client certificate chain of {} accepted", chain.len());
        self.client_certificates = Some(chain);
        Ok(Output::None)
    }

    /// Leaf of the stored client chain, for a CertificateVerify arriving in `state`.
    /// Only one CertificateVerify is accepted per chain.
    fn client_leaf(&self, state: State) -> Flow<&[u8]> {
        if self.client_certificate_verified {
            return Err(fatal(
                AlertDescription::UnexpectedMessage,
                "repeated client CertificateVerify",
            ));
        }
        self.client_certificates
            .as_ref()
            .and_then(|c| c.first())
            .map(|c| c.as_slice())
            .ok_or_else(|| {
                fatal(
                    AlertDescription::UnexpectedMessage,
                    format!("CertificateVerify without a certificate in state {:?}", state),
                )
            })
    }
}

fn missing_suite(suite: CipherSuite) -> Error {
    Error::Internal(format!("{:?} is not in the crypto provider", suite))
}

fn merge(packets: &mut Vec<Record>, output: Output) -> Option<Output> {
    match output {
        Output::None => None,
        Output::Packet(records) => {
            packets.extend(records);
            None
        }
        other => Some(other),
    }
}

fn packet_or_none(packets: Vec<Record>) -> Output {
    if packets.is_empty() {
        Output::None
    } else {
        Output::Packet(packets)
    }
}
