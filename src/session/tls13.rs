use subtle::ConstantTimeEq;

use super::protection;
use super::{
    fatal, merge, packet_or_none, unexpected, Direction, Flow, Keys, Keys13, OrAlert, Session,
    State, Stop, CLIENT_SIGNATURE_SCHEMES,
};
use crate::alert::{Alert, AlertDescription};
use crate::crypto::{
    certificate_verify_content, CLIENT_CERTIFICATE_VERIFY_CONTEXT,
    SERVER_CERTIFICATE_VERIFY_CONTEXT,
};
use crate::message::{
    Body, Certificate, CertificateRequest, CertificateVerify, ClientHello, DigitallySigned,
    EncryptedExtensions, Extension, Finished, Fragment, Handshake, KeyShareEntry, KeyUpdate,
    Record, ServerHello,
};
use crate::output::Output;
use crate::types::{ContentType, ProtocolVersion};
use crate::Error;

impl Session {
    fn keys13(&self) -> Flow<&Keys13> {
        match &self.keys {
            Keys::Tls13(keys) => Ok(keys),
            Keys::Tls12(_) => Err(wrong_protocol()),
        }
    }

    fn keys13_mut(&mut self) -> Flow<&mut Keys13> {
        match &mut self.keys {
            Keys::Tls13(keys) => Ok(keys),
            Keys::Tls12(_) => Err(wrong_protocol()),
        }
    }

    fn transcript_hash13(&self, transcript: &[u8]) -> Flow<Vec<u8>> {
        self.keys13()?
            .suite
            .transcript_hash(transcript)
            .or_alert(AlertDescription::InternalError)
    }

    pub(super) fn process_record13(&mut self, record: Record) -> Flow<Output> {
        match record {
            Record::Handshake(fragments) => self.plain_handshake13(fragments),
            Record::ChangeCipherSpec => {
                if self.state != State::ServerHelloDone {
                    return Err(unexpected("ChangeCipherSpec", self.state));
                }
                trace!("Ignoring client ChangeCipherSpec");
                Ok(Output::None)
            }
            Record::ApplicationData(body) => self.protected_record13(&body),
            Record::Alert(alert) => Ok(self.on_alert(alert)),
        }
    }

    /// Only the first ClientHello travels in the clear.
    fn plain_handshake13(&mut self, fragments: Vec<Fragment>) -> Flow<Output> {
        let mut packets = Vec::new();
        for fragment in fragments {
            let Fragment::Plain(handshake) = fragment else {
                return Err(unexpected("encrypted handshake fragment", self.state));
            };
            self.append(&handshake, Direction::Client);
            let output = match handshake.body {
                Body::ClientHello(ch) => self.client_hello13(ch)?,
                other => {
                    return Err(unexpected(
                        format!("plaintext {}", other.message_type()),
                        self.state,
                    ))
                }
            };
            if let Some(other) = merge(&mut packets, output) {
                return Ok(other);
            }
        }
        Ok(packet_or_none(packets))
    }

    fn client_hello13(&mut self, client_hello: ClientHello) -> Flow<Output> {
        self.accept_client_hello(&client_hello)?;

        let internal = |what: &str| Stop::Fault(Error::Internal(format!("TLS 1.3 without {what}")));
        let key_share = self
            .params
            .key_share
            .clone()
            .ok_or_else(|| internal("a key share"))?;
        let scheme = self
            .params
            .signature_scheme
            .ok_or_else(|| internal("a signature scheme"))?;

        let group = self
            .config
            .crypto_provider()
            .find_kx_group(key_share.group)
            .ok_or_else(|| {
                fatal(
                    AlertDescription::InternalError,
                    format!("{:?} is not in the crypto provider", key_share.group),
                )
            })?;
        let kx = group
            .start_exchange()
            .or_alert(AlertDescription::InternalError)?;
        let server_public = kx.pub_key().to_vec();
        let shared_secret = kx
            .complete(&key_share.key_exchange)
            .or_alert(AlertDescription::HandshakeFailure)?;

        let server_hello = Handshake::new(Body::ServerHello(ServerHello::new(
            ProtocolVersion::TLS1_2,
            self.params.server_random,
            self.params.session_id,
            self.params.cipher_suite,
            vec![
                Extension::SupportedVersionsServer(ProtocolVersion::TLS1_3),
                Extension::KeyShareServer(KeyShareEntry::new(key_share.group, server_public)),
            ],
        )));
        self.append(&server_hello, Direction::Server);

        // Handshake traffic keys
        let hello_hash = self.transcript_hash13(&self.transcript.bytes())?;
        let keys = self.keys13_mut()?;
        let mut schedule = keys
            .suite
            .key_schedule()
            .or_alert(AlertDescription::InternalError)?;
        let (client_hs, server_hs) = schedule
            .derive_handshake_secrets(&shared_secret, &hello_hash)
            .or_alert(AlertDescription::InternalError)?;
        keys.suite
            .install_write_secret(server_hs)
            .or_alert(AlertDescription::InternalError)?;
        keys.suite
            .install_read_secret(client_hs)
            .or_alert(AlertDescription::InternalError)?;
        self.send_seq = 0;
        self.recv_seq = 0;
        debug!("Handshake traffic keys installed");

        let mut flight = vec![Handshake::new(Body::EncryptedExtensions(
            EncryptedExtensions::new(Vec::new()),
        ))];
        if self.params.require_client_certificate {
            flight.push(Handshake::new(Body::CertificateRequest(
                CertificateRequest::Tls13 {
                    context: Vec::new(),
                    extensions: vec![Extension::SignatureAlgorithms(
                        CLIENT_SIGNATURE_SCHEMES.to_vec(),
                    )],
                },
            )));
        }
        flight.push(Handshake::new(Body::Certificate(Certificate::new_tls13(
            Vec::new(),
            self.identity.chain().to_vec(),
        ))));
        for m in &flight {
            self.append(m, Direction::Server);
        }

        let th = self.transcript_hash13(&self.transcript.bytes())?;
        let content = certificate_verify_content(SERVER_CERTIFICATE_VERIFY_CONTEXT, &th);
        let signature = self
            .keys13()?
            .suite
            .sign(self.identity.private_key(), &content, scheme)
            .or_alert(AlertDescription::InternalError)?;
        let certificate_verify = Handshake::new(Body::CertificateVerify(CertificateVerify::new(
            DigitallySigned::new(scheme, signature),
        )));
        self.append(&certificate_verify, Direction::Server);
        flight.push(certificate_verify);

        let th = self.transcript_hash13(&self.transcript.bytes())?;
        let verify_data = self
            .keys13()?
            .suite
            .write_verify_data(&th)
            .or_alert(AlertDescription::InternalError)?;
        let finished = Handshake::new(Body::Finished(Finished::new(verify_data)));
        self.append(&finished, Direction::Server);
        flight.push(finished);

        let plaintext: Vec<u8> = flight.iter().flat_map(|m| m.to_bytes()).collect();
        let Keys::Tls13(keys) = &self.keys else {
            return Err(wrong_protocol());
        };
        let protected =
            protection::seal13(&keys.suite, &mut self.send_seq, ContentType::Handshake, &plaintext)?;

        // Application traffic keys, from the transcript through server Finished
        let th = self.transcript_hash13(&self.transcript.bytes())?;
        let (client_ap, server_ap) = schedule
            .derive_application_secrets(&th)
            .or_alert(AlertDescription::InternalError)?;
        let keys = self.keys13_mut()?;
        keys.suite
            .install_write_secret(server_ap)
            .or_alert(AlertDescription::InternalError)?;
        keys.client_application_secret = Some(client_ap);
        self.send_seq = 0;

        self.state = State::ServerHelloDone;
        debug!(
            "Sent TLS 1.3 server flight of {} messages",
            flight.len() + 1
        );

        let mut records = vec![Record::handshake([server_hello]), Record::ChangeCipherSpec];
        records.extend(protected);
        Ok(Output::Packet(records))
    }

    fn protected_record13(&mut self, body: &[u8]) -> Flow<Output> {
        if self.state == State::None {
            return Err(unexpected("protected record", self.state));
        }
        let (inner_type, content) = self
            .keys13()?
            .suite
            .decrypt(self.recv_seq, body)
            .or_alert(AlertDescription::BadRecordMac)?;
        self.recv_seq += 1;
        trace!("Opened {:?} record of {} bytes", inner_type, content.len());

        match inner_type {
            ContentType::Handshake => self.protected_handshake13(&content),
            ContentType::ApplicationData => {
                if self.state != State::ServerFinished {
                    return Err(unexpected("application data", self.state));
                }
                Ok(Output::Application(content))
            }
            ContentType::Alert => {
                let (_, alert) = Alert::parse(&content)
                    .map_err(|_| fatal(AlertDescription::DecodeError, "malformed alert"))?;
                Ok(self.on_alert(alert))
            }
            other => Err(unexpected(format!("{:?} content", other), self.state)),
        }
    }

    fn protected_handshake13(&mut self, content: &[u8]) -> Flow<Output> {
        let mut packets = Vec::new();
        let mut input = content;
        while !input.is_empty() {
            let (rest, handshake) = Handshake::parse(input, true).map_err(|_| {
                fatal(AlertDescription::DecodeError, "malformed handshake message")
            })?;
            input = rest;

            // Post-handshake messages stay out of the transcript.
            if self.state < State::ServerFinished {
                self.append(&handshake, Direction::Client);
            } else {
                self.record_info(&handshake, Direction::Client);
            }

            let output = match handshake.body {
                Body::Certificate(c) => self.client_certificate(c.certificate_list)?,
                Body::CertificateVerify(cv) => self.certificate_verify13(cv)?,
                Body::Finished(f) => self.finished13(f)?,
                Body::KeyUpdate(ku) => self.key_update13(ku)?,
                other => return Err(unexpected(other.message_type(), self.state)),
            };
            if let Some(other) = merge(&mut packets, output) {
                return Ok(other);
            }
        }
        Ok(packet_or_none(packets))
    }

    fn certificate_verify13(&mut self, cv: CertificateVerify) -> Flow<Output> {
        if self.state != State::ServerHelloDone {
            return Err(unexpected("CertificateVerify", self.state));
        }
        let th = self.transcript_hash13(&self.transcript.without_last())?;
        let content = certificate_verify_content(CLIENT_CERTIFICATE_VERIFY_CONTEXT, &th);
        let leaf = self.client_leaf(self.state)?;
        self.keys13()?
            .suite
            .verify(leaf, &content, &cv.signed.signature, cv.signed.scheme)
            .or_alert(AlertDescription::BadCertificate)?;

        self.client_certificate_verified = true;
        debug!("Client CertificateVerify ({:?}) ok", cv.signed.scheme);
        Ok(Output::None)
    }

    fn finished13(&mut self, finished: Finished) -> Flow<Output> {
        if self.state != State::ServerHelloDone {
            return Err(unexpected("Finished", self.state));
        }
        if self.params.require_client_certificate && self.client_certificates.is_none() {
            return Err(fatal(
                AlertDescription::CertificateRequired,
                "client certificate required",
            ));
        }
        if self.client_certificates.is_some() && !self.client_certificate_verified {
            return Err(fatal(
                AlertDescription::UnexpectedMessage,
                "client certificate without CertificateVerify",
            ));
        }

        let th = self.transcript_hash13(&self.transcript.without_last())?;
        let expected = self
            .keys13()?
            .suite
            .read_verify_data(&th)
            .or_alert(AlertDescription::InternalError)?;
        if !bool::from(expected.ct_eq(&finished.verify_data)) {
            return Err(fatal(
                AlertDescription::DecryptError,
                "client Finished verify_data mismatch",
            ));
        }

        let keys = self.keys13_mut()?;
        let secret = keys
            .client_application_secret
            .take()
            .ok_or_else(|| Stop::Fault(Error::Internal("no client application secret".into())))?;
        keys.suite
            .install_read_secret(secret)
            .or_alert(AlertDescription::InternalError)?;
        self.recv_seq = 0;

        self.state = State::ClientFinished;
        debug!("Client Finished verified");
        self.state = State::ServerFinished;
        debug!("Handshake complete with {:?}", self.params.cipher_suite);
        Ok(Output::None)
    }

    fn key_update13(&mut self, key_update: KeyUpdate) -> Flow<Output> {
        if self.state != State::ServerFinished {
            return Err(unexpected("KeyUpdate", self.state));
        }
        let Keys::Tls13(keys) = &mut self.keys else {
            return Err(wrong_protocol());
        };

        keys.suite
            .update_read_secret()
            .or_alert(AlertDescription::InternalError)?;
        self.recv_seq = 0;
        debug!("Receive key updated");

        if !key_update.is_update_requested() {
            return Ok(Output::None);
        }

        let reply = Handshake::new(Body::KeyUpdate(KeyUpdate::update_not_requested()));
        let records = protection::seal13(
            &keys.suite,
            &mut self.send_seq,
            ContentType::Handshake,
            &reply.to_bytes(),
        )?;
        keys.suite
            .update_write_secret()
            .or_alert(AlertDescription::InternalError)?;
        self.send_seq = 0;
        debug!("Send key updated");

        Ok(Output::Packet(records))
    }
}

fn wrong_protocol() -> Stop {
    Stop::Fault(Error::Internal("TLS 1.3 handler on a TLS 1.2 session".into()))
}
