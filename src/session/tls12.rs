use zeroize::Zeroizing;

use super::protection;
use super::{
    fatal, merge, packet_or_none, unexpected, Direction, Flow, Keys, OrAlert, Session, State,
    Stop, CLIENT_SIGNATURE_SCHEMES,
};
use crate::alert::AlertDescription;
use crate::crypto::Tls12Suite;
use crate::message::{
    Body, Certificate, CertificateRequest, CertificateVerify, ClientHello, ClientKeyExchange,
    DigitallySigned, Extension, ExtensionType, Finished, Fragment, Handshake, Record, ServerHello,
    ServerKeyExchange, CLIENT_CERTIFICATE_TYPE_ECDSA_SIGN, CLIENT_CERTIFICATE_TYPE_RSA_SIGN,
};
use crate::output::Output;
use crate::types::{ContentType, ProtocolVersion};
use crate::Error;

const PRE_MASTER_SECRET_LEN: usize = 48;

impl Session {
    fn suite12(&self) -> Flow<&Tls12Suite> {
        match &self.keys {
            Keys::Tls12(suite) => Ok(suite),
            Keys::Tls13(_) => Err(wrong_protocol()),
        }
    }

    fn suite12_mut(&mut self) -> Flow<&mut Tls12Suite> {
        match &mut self.keys {
            Keys::Tls12(suite) => Ok(suite),
            Keys::Tls13(_) => Err(wrong_protocol()),
        }
    }

    pub(super) fn process_record12(&mut self, record: Record) -> Flow<Output> {
        match record {
            Record::Handshake(fragments) => self.handshake_record12(fragments),
            Record::ChangeCipherSpec => self.change_cipher_spec12(),
            Record::ApplicationData(body) => self.application_data12(&body),
            Record::Alert(alert) => Ok(self.on_alert(alert)),
        }
    }

    fn handshake_record12(&mut self, fragments: Vec<Fragment>) -> Flow<Output> {
        let mut packets = Vec::new();
        for fragment in fragments {
            let output = match fragment {
                Fragment::Plain(handshake) => {
                    self.append(&handshake, Direction::Client);
                    self.handshake12(handshake, None)?
                }
                Fragment::Encrypted(data) => self.encrypted_handshake12(&data)?,
            };
            if let Some(other) = merge(&mut packets, output) {
                return Ok(other);
            }
        }
        Ok(packet_or_none(packets))
    }

    fn encrypted_handshake12(&mut self, fragment: &[u8]) -> Flow<Output> {
        if self.state != State::ClientChangeCipherSpec {
            return Err(unexpected("encrypted handshake", self.state));
        }

        let (message, mac) = protection::open_finished12(self.suite12()?, fragment)?;
        let (_, handshake) = Handshake::parse(&message, false).map_err(|_| {
            fatal(AlertDescription::DecodeError, "malformed encrypted handshake")
        })?;

        // Only header || verify_data enters the transcript, never the MAC.
        self.append(&handshake, Direction::Client);
        self.handshake12(handshake, Some(mac))
    }

    fn handshake12(&mut self, handshake: Handshake, mac: Option<Vec<u8>>) -> Flow<Output> {
        trace!("Handshake {:?} in {:?}", handshake.message_type(), self.state);
        match handshake.body {
            Body::ClientHello(ch) => self.client_hello12(ch),
            Body::Certificate(c) => self.client_certificate(c.certificate_list),
            Body::ClientKeyExchange(cke) => self.client_key_exchange12(cke),
            Body::CertificateVerify(cv) => self.certificate_verify12(cv),
            Body::Finished(f) => match mac {
                Some(mac) => self.finished12(f, &mac),
                None => Err(fatal(
                    AlertDescription::UnexpectedMessage,
                    "unencrypted Finished",
                )),
            },
            Body::KeyUpdate(_) => Err(Stop::Fault(Error::UnsupportedOperation(
                "KeyUpdate is not part of TLS 1.2".into(),
            ))),
            other => Err(unexpected(other.message_type(), self.state)),
        }
    }

    fn client_hello12(&mut self, client_hello: ClientHello) -> Flow<Output> {
        self.accept_client_hello(&client_hello)?;

        let suite = self.suite12()?;
        let rsa = suite.is_rsa_key_exchange();
        let client_random = self.params.client_random.to_bytes();
        let server_random = self.params.server_random.to_bytes();

        let mut extensions = Vec::new();
        if client_hello.signals_renegotiation_info() {
            extensions.push(Extension::RenegotiationInfo(Vec::new()));
        }
        if !rsa
            && client_hello
                .find_extension(ExtensionType::EcPointFormats)
                .is_some()
        {
            // uncompressed
            extensions.push(Extension::EcPointFormats(vec![0]));
        }

        let mut messages = vec![
            Handshake::new(Body::ServerHello(ServerHello::new(
                ProtocolVersion::TLS1_2,
                self.params.server_random,
                self.params.session_id,
                suite.suite(),
                extensions,
            ))),
            Handshake::new(Body::Certificate(Certificate::new(
                self.identity.chain().to_vec(),
            ))),
        ];

        if !rsa {
            let (curve, scheme) = match (self.params.curve, self.params.signature_scheme) {
                (Some(c), Some(s)) => (c, s),
                _ => {
                    return Err(Stop::Fault(Error::Internal(
                        "ECDHE suite without curve or signature".into(),
                    )))
                }
            };
            let group = self
                .config
                .crypto_provider()
                .find_kx_group(curve)
                .ok_or_else(|| {
                    fatal(
                        AlertDescription::InternalError,
                        format!("{:?} is not in the crypto provider", curve),
                    )
                })?;
            let kx = group
                .start_exchange()
                .or_alert(AlertDescription::InternalError)?;
            let public_key = kx.pub_key().to_vec();

            let content =
                ServerKeyExchange::signed_content(&client_random, &server_random, curve, &public_key);
            let signature = suite
                .sign(self.identity.private_key(), &content, scheme)
                .or_alert(AlertDescription::InternalError)?;

            messages.push(Handshake::new(Body::ServerKeyExchange(ServerKeyExchange {
                named_group: curve,
                public_key,
                signed: DigitallySigned::new(scheme, signature),
            })));
            self.params.ephemeral = Some(kx);
            debug!("Ephemeral {:?} key generated", curve);
        }

        if self.params.require_client_certificate {
            messages.push(Handshake::new(Body::CertificateRequest(
                CertificateRequest::Tls12 {
                    certificate_types: vec![
                        CLIENT_CERTIFICATE_TYPE_RSA_SIGN,
                        CLIENT_CERTIFICATE_TYPE_ECDSA_SIGN,
                    ],
                    signature_algorithms: CLIENT_SIGNATURE_SCHEMES.to_vec(),
                    certificate_authorities: Vec::new(),
                },
            )));
        }

        messages.push(Handshake::new(Body::ServerHelloDone));

        for m in &messages {
            self.append(m, Direction::Server);
        }
        self.state = State::ServerHelloDone;
        debug!("Sent server flight of {} messages", messages.len());

        Ok(Output::Packet(vec![Record::handshake(messages)]))
    }

    fn client_key_exchange12(&mut self, cke: ClientKeyExchange) -> Flow<Output> {
        if self.state != State::ServerHelloDone {
            return Err(unexpected("ClientKeyExchange", self.state));
        }
        if self.params.require_client_certificate && self.client_certificates.is_none() {
            return Err(fatal(
                AlertDescription::HandshakeFailure,
                "client certificate required",
            ));
        }

        let pre_master_secret = if self.suite12()?.is_rsa_key_exchange() {
            let encrypted = cke.encrypted_pre_master_secret().ok_or_else(|| {
                fatal(AlertDescription::DecodeError, "malformed EncryptedPreMasterSecret")
            })?;
            self.rsa_pre_master_secret(encrypted)?
        } else {
            let public = cke
                .ecdh_public()
                .ok_or_else(|| fatal(AlertDescription::DecodeError, "malformed ECPoint"))?;
            let kx = self.params.ephemeral.take().ok_or_else(|| {
                Stop::Fault(Error::Internal("no ephemeral key for ECDHE".into()))
            })?;
            kx.complete(public)
                .or_alert(AlertDescription::HandshakeFailure)?
        };

        let client_random = self.params.client_random.to_bytes();
        let server_random = self.params.server_random.to_bytes();
        self.suite12_mut()?
            .key_exchange(&pre_master_secret, &client_random, &server_random)
            .or_alert(AlertDescription::InternalError)?;

        self.state = State::ClientKeyExchange;
        debug!("Master secret derived");
        Ok(Output::None)
    }

    /// Decrypt the pre-master secret. Any failure yields random bytes so the
    /// handshake fails at Finished instead of revealing the cause.
    fn rsa_pre_master_secret(&self, encrypted: &[u8]) -> Flow<Zeroizing<Vec<u8>>> {
        let version = self.params.client_version.as_u16().to_be_bytes();
        match self.identity.private_key().decrypt(encrypted) {
            Ok(pms) if pms.len() == PRE_MASTER_SECRET_LEN && pms[..2] == version => Ok(pms),
            _ => {
                debug!("Unusable pre-master secret, substituting random bytes");
                let mut pms = Zeroizing::new(vec![0u8; PRE_MASTER_SECRET_LEN]);
                self.config
                    .crypto_provider()
                    .secure_random
                    .fill(&mut pms)
                    .or_alert(AlertDescription::InternalError)?;
                Ok(pms)
            }
        }
    }

    fn certificate_verify12(&mut self, cv: CertificateVerify) -> Flow<Output> {
        if self.state != State::ClientKeyExchange {
            return Err(unexpected("CertificateVerify", self.state));
        }
        let leaf = self.client_leaf(self.state)?;
        let signed = self.transcript.without_last();
        self.suite12()?
            .verify(leaf, &signed, &cv.signed.signature, cv.signed.scheme)
            .or_alert(AlertDescription::BadCertificate)?;

        self.client_certificate_verified = true;
        debug!("Client CertificateVerify ({:?}) ok", cv.signed.scheme);
        Ok(Output::None)
    }

    fn change_cipher_spec12(&mut self) -> Flow<Output> {
        if self.state != State::ClientKeyExchange {
            return Err(unexpected("ChangeCipherSpec", self.state));
        }
        if self.client_certificates.is_some() && !self.client_certificate_verified {
            return Err(fatal(
                AlertDescription::UnexpectedMessage,
                "client certificate without CertificateVerify",
            ));
        }
        self.state = State::ClientChangeCipherSpec;
        Ok(Output::None)
    }

    fn finished12(&mut self, finished: Finished, mac: &[u8]) -> Flow<Output> {
        if self.state != State::ClientChangeCipherSpec {
            return Err(unexpected("Finished", self.state));
        }

        // Field borrow: sequence numbers and state change while `suite` is live.
        let Keys::Tls12(suite) = &self.keys else {
            return Err(wrong_protocol());
        };
        let expected = suite
            .verify_data("client finished", &self.transcript.without_last())
            .or_alert(AlertDescription::InternalError)?;
        if !bool::from(subtle::ConstantTimeEq::ct_eq(
            &expected[..],
            &finished.verify_data[..],
        )) {
            return Err(fatal(
                AlertDescription::BadRecordMac,
                "client Finished verify_data mismatch",
            ));
        }

        let message = Handshake::new(Body::Finished(finished)).to_bytes();
        suite
            .verify_mac(self.recv_seq, ContentType::Handshake, &message, mac)
            .or_alert(AlertDescription::BadRecordMac)?;
        self.recv_seq += 1;
        self.state = State::ClientFinished;
        debug!("Client Finished verified");

        let verify_data = suite
            .verify_data("server finished", &self.transcript.bytes())
            .or_alert(AlertDescription::InternalError)?;
        let server_finished = Handshake::new(Body::Finished(Finished::new(verify_data)));
        let bytes = server_finished.to_bytes();
        let encrypted = suite
            .protect(self.send_seq, ContentType::Handshake, &bytes)
            .or_alert(AlertDescription::InternalError)?;

        self.append(&server_finished, Direction::Server);
        self.send_seq += 1;
        self.state = State::ServerFinished;
        debug!("Handshake complete with {:?}", self.params.cipher_suite);

        Ok(Output::Packet(vec![
            Record::ChangeCipherSpec,
            Record::Handshake(vec![Fragment::Encrypted(encrypted)]),
        ]))
    }

    fn application_data12(&mut self, body: &[u8]) -> Flow<Output> {
        if self.state != State::ServerFinished {
            return Err(unexpected("application data", self.state));
        }
        let payload = self
            .suite12()?
            .unprotect(self.recv_seq, ContentType::ApplicationData, body)
            .or_alert(AlertDescription::BadRecordMac)?;
        self.recv_seq += 1;
        trace!("Received {} bytes of application data", payload.len());
        Ok(Output::Application(payload))
    }
}

fn wrong_protocol() -> Stop {
    Stop::Fault(Error::Internal("TLS 1.2 handler on a TLS 1.3 session".into()))
}
