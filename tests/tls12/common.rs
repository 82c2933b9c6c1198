//! Shared helpers for TLS 1.2 integration tests.

#![allow(unused)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate as X509Certificate;

use tlsengine::certificate::{generate_self_signed_ecdsa, generate_self_signed_rsa, CertifiedKey};
use tlsengine::crypto::{rust_crypto, CryptoProvider, Role, Tls12Suite};
use tlsengine::message::{
    Body, Certificate, CertificateRequest, CertificateVerify, ClientHello, ClientKeyExchange,
    DigitallySigned, Extension, Finished, Fragment, Handshake, MessageType, Random, Record,
    ServerHello, ServerKeyExchange, SessionId,
};
use tlsengine::{
    AlertDescription, CipherSuite, Config, ContentType, Context, NamedGroup, Output,
    ProtocolVersion, ServerIdentity, SignatureScheme, State,
};

/// RSA-2048 generation is slow, share one server certificate.
pub static SERVER_KEY: Lazy<CertifiedKey> =
    Lazy::new(|| generate_self_signed_rsa("localhost").expect("server certificate"));

pub static CLIENT_KEY: Lazy<CertifiedKey> =
    Lazy::new(|| generate_self_signed_ecdsa("client.test").expect("client certificate"));

/// A second client identity, distinct from [`CLIENT_KEY`].
pub static OTHER_CLIENT_KEY: Lazy<CertifiedKey> =
    Lazy::new(|| generate_self_signed_ecdsa("other.test").expect("client certificate"));

pub fn server(config: Config) -> Context {
    let _ = env_logger::try_init();
    let identity = ServerIdentity::new(
        vec![SERVER_KEY.certificate.clone()],
        &SERVER_KEY.private_key,
        config.crypto_provider(),
    )
    .expect("server identity");
    Context::new(Arc::new(config), Arc::new(identity))
}

/// Config that asks for and accepts any client certificate.
pub fn client_auth_config() -> Config {
    Config::builder()
        .require_client_certificate(true)
        .client_cert_verifier(|chain: &[Vec<u8>]| !chain.is_empty())
        .build()
        .expect("config")
}

/// Serialize `record` and parse it back the way a transport would.
pub fn deliver(server: &mut Context, record: Record) -> Output {
    let bytes = record.to_bytes();
    let (rest, parsed) = server.parse_record(&bytes).expect("parse record");
    assert!(rest.is_empty(), "trailing bytes after record");
    server.handle_record(parsed).expect("handle record")
}

pub fn alert_of(output: &Output) -> AlertDescription {
    match output {
        Output::Alert { description, .. } => *description,
        other => panic!("expected alert, got {:?}", other),
    }
}

/// Message types of the plaintext handshake records in `output`.
pub fn handshake_types(output: &Output) -> Vec<MessageType> {
    output
        .records()
        .iter()
        .filter_map(|r| match r {
            Record::Handshake(fragments) => Some(fragments),
            _ => None,
        })
        .flatten()
        .filter_map(|f| match f {
            Fragment::Plain(h) => Some(h.message_type()),
            Fragment::Encrypted(_) => None,
        })
        .collect()
}

/// Minimal TLS 1.2 client driving the server through its public surface.
pub struct Client12 {
    provider: CryptoProvider,
    pub hello: ClientHello,
    pub transcript: Vec<u8>,
    pub suite: Option<Tls12Suite>,
    pub server_hello: Option<ServerHello>,
    pub server_certificate: Option<Vec<u8>>,
    pub server_key_exchange: Option<ServerKeyExchange>,
    pub certificate_request: Option<CertificateRequest>,
    send_seq: u64,
    recv_seq: u64,
}

impl Client12 {
    pub fn new(suites: Vec<CipherSuite>) -> Self {
        Client12 {
            provider: rust_crypto::default_provider(),
            hello: ClientHello::new(
                ProtocolVersion::TLS1_2,
                Random::new(),
                SessionId::empty(),
                suites,
            ),
            transcript: Vec::new(),
            suite: None,
            server_hello: None,
            server_certificate: None,
            server_key_exchange: None,
            certificate_request: None,
            send_seq: 0,
            recv_seq: 0,
        }
    }

    /// Typical ECDHE offer: curves, point formats and RSA signatures.
    pub fn ecdhe(suites: Vec<CipherSuite>, groups: Vec<NamedGroup>) -> Self {
        Self::new(suites)
            .with_extension(Extension::SupportedGroups(groups))
            .with_extension(Extension::EcPointFormats(vec![0]))
            .with_extension(Extension::SignatureAlgorithms(vec![
                SignatureScheme::RSA_PSS_RSAE_SHA256,
                SignatureScheme::RSA_PKCS1_SHA256,
            ]))
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.hello = self.hello.with_extension(extension);
        self
    }

    pub fn provider(&self) -> &CryptoProvider {
        &self.provider
    }

    fn suite(&self) -> &Tls12Suite {
        self.suite.as_ref().expect("suite negotiated")
    }

    /// Wrap plaintext messages in a record, adding them to the transcript.
    pub fn send(&mut self, messages: Vec<Handshake>) -> Record {
        for m in &messages {
            self.transcript.extend_from_slice(&m.to_bytes());
        }
        Record::handshake(messages)
    }

    pub fn client_hello(&mut self) -> Record {
        let hello = Handshake::new(Body::ClientHello(self.hello.clone()));
        self.send(vec![hello])
    }

    /// Absorb the server's first flight.
    pub fn receive_flight(&mut self, output: &Output) {
        for record in output.records() {
            let bytes = record.to_bytes();
            let (_, record) = Record::parse(&bytes, false).expect("server record");
            let Record::Handshake(fragments) = record else {
                panic!("expected handshake record, got {:?}", record.content_type());
            };
            for fragment in fragments {
                let Fragment::Plain(handshake) = fragment else {
                    panic!("encrypted fragment in server flight");
                };
                self.transcript.extend_from_slice(&handshake.to_bytes());
                match handshake.body {
                    Body::ServerHello(sh) => {
                        let suite = self
                            .provider
                            .find_tls12_suite(sh.cipher_suite)
                            .expect("suite in provider");
                        self.suite = Some(Tls12Suite::new(
                            suite,
                            self.provider.clone(),
                            Role::Client,
                        ));
                        self.server_hello = Some(sh);
                    }
                    Body::Certificate(c) => {
                        self.server_certificate = c.leaf().map(|l| l.to_vec());
                    }
                    Body::ServerKeyExchange(ske) => self.server_key_exchange = Some(ske),
                    Body::CertificateRequest(cr) => self.certificate_request = Some(cr),
                    Body::ServerHelloDone => {}
                    other => panic!("unexpected {:?} in server flight", other.message_type()),
                }
            }
        }
    }

    /// Build ClientKeyExchange and derive the keys from it.
    pub fn client_key_exchange(&mut self) -> Handshake {
        let client_random = self.hello.random.to_bytes();
        let server_random = self
            .server_hello
            .as_ref()
            .expect("ServerHello")
            .random
            .to_bytes();

        let (cke, pre_master_secret) = match &self.server_key_exchange {
            None => {
                let mut pms = vec![0u8; 48];
                pms[..2].copy_from_slice(&self.hello.client_version.as_u16().to_be_bytes());
                self.provider
                    .secure_random
                    .fill(&mut pms[2..])
                    .expect("random");
                (ClientKeyExchange::rsa(&self.encrypt_to_server(&pms)), pms)
            }
            Some(ske) => {
                let leaf = self.server_certificate.as_ref().expect("server certificate");
                let content = ServerKeyExchange::signed_content(
                    &client_random,
                    &server_random,
                    ske.named_group,
                    &ske.public_key,
                );
                self.provider
                    .signature_verification
                    .verify_signature(leaf, &content, &ske.signed.signature, ske.signed.scheme)
                    .expect("ServerKeyExchange signature");

                let kx = self
                    .provider
                    .find_kx_group(ske.named_group)
                    .expect("group")
                    .start_exchange()
                    .expect("key pair");
                let public = kx.pub_key().to_vec();
                let shared = kx.complete(&ske.public_key).expect("shared secret");
                (ClientKeyExchange::ecdhe(&public), shared.to_vec())
            }
        };

        self.suite
            .as_mut()
            .expect("suite negotiated")
            .key_exchange(&pre_master_secret, &client_random, &server_random)
            .expect("key derivation");
        Handshake::new(Body::ClientKeyExchange(cke))
    }

    /// RSA-encrypt `data` under the server certificate's public key.
    pub fn encrypt_to_server(&self, data: &[u8]) -> Vec<u8> {
        let leaf = self.server_certificate.as_ref().expect("server certificate");
        let cert = X509Certificate::from_der(leaf).expect("server certificate DER");
        let spki = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .expect("spki");
        let key = RsaPublicKey::from_public_key_der(&spki).expect("RSA key");
        key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, data)
            .expect("RSA encrypt")
    }

    pub fn certificate(&self, key: &CertifiedKey) -> Handshake {
        Handshake::new(Body::Certificate(Certificate::new(vec![key
            .certificate
            .clone()])))
    }

    /// Sign everything sent and received so far.
    pub fn certificate_verify(&self, key: &CertifiedKey) -> Handshake {
        let private = self
            .provider
            .key_provider
            .load_private_key(&key.private_key)
            .expect("client key");
        let scheme = SignatureScheme::ECDSA_SECP256R1_SHA256;
        let signature = private.sign(&self.transcript, scheme).expect("sign");
        Handshake::new(Body::CertificateVerify(CertificateVerify::new(
            DigitallySigned::new(scheme, signature),
        )))
    }

    /// Encrypted Finished with the given verify_data.
    pub fn finished_with(&mut self, verify_data: Vec<u8>) -> Record {
        let message = Handshake::new(Body::Finished(Finished::new(verify_data)));
        let bytes = message.to_bytes();
        let encrypted = self
            .suite()
            .protect(self.send_seq, ContentType::Handshake, &bytes)
            .expect("protect Finished");
        self.send_seq += 1;
        self.transcript.extend_from_slice(&bytes);
        Record::Handshake(vec![Fragment::Encrypted(encrypted)])
    }

    pub fn finished(&mut self) -> Record {
        let verify_data = self
            .suite()
            .verify_data("client finished", &self.transcript)
            .expect("verify_data");
        self.finished_with(verify_data)
    }

    /// Check `[ChangeCipherSpec, Finished]` from the server.
    pub fn receive_finished(&mut self, output: &Output) {
        let records = output.records();
        assert_eq!(records.len(), 2, "expected ChangeCipherSpec and Finished");
        assert_eq!(records[0], Record::ChangeCipherSpec);

        let bytes = records[1].to_bytes();
        let (_, record) = Record::parse(&bytes, true).expect("Finished record");
        let Record::Handshake(fragments) = record else {
            panic!("expected handshake record");
        };
        let [Fragment::Encrypted(data)] = &fragments[..] else {
            panic!("expected one encrypted fragment");
        };

        let plaintext = self
            .suite()
            .unprotect(self.recv_seq, ContentType::Handshake, data)
            .expect("server Finished MAC");
        self.recv_seq += 1;

        let (_, handshake) = Handshake::parse(&plaintext, false).expect("server Finished");
        let Body::Finished(finished) = handshake.body else {
            panic!("expected Finished");
        };
        let expected = self
            .suite()
            .verify_data("server finished", &self.transcript)
            .expect("verify_data");
        assert_eq!(finished.verify_data, expected, "server verify_data");
        self.transcript.extend_from_slice(&plaintext);
    }

    pub fn seal(&mut self, data: &[u8]) -> Record {
        let body = self
            .suite()
            .protect(self.send_seq, ContentType::ApplicationData, data)
            .expect("protect");
        self.send_seq += 1;
        Record::ApplicationData(body)
    }

    pub fn open(&mut self, record: &Record) -> Vec<u8> {
        let Record::ApplicationData(body) = record else {
            panic!("expected application data, got {:?}", record.content_type());
        };
        let data = self
            .suite()
            .unprotect(self.recv_seq, ContentType::ApplicationData, body)
            .expect("unprotect");
        self.recv_seq += 1;
        data
    }

    /// Run a complete handshake without client authentication.
    pub fn handshake(&mut self, server: &mut Context) {
        let hello = self.client_hello();
        let flight = deliver(server, hello);
        self.receive_flight(&flight);
        assert_eq!(server.state(), State::ServerHelloDone);

        let cke = self.client_key_exchange();
        let record = self.send(vec![cke]);
        assert_eq!(deliver(server, record), Output::None);
        assert_eq!(deliver(server, Record::ChangeCipherSpec), Output::None);

        let finished = self.finished();
        let out = deliver(server, finished);
        self.receive_finished(&out);
        assert!(server.is_handshake_complete());
    }
}
