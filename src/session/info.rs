use std::collections::BTreeMap;

use der::Decode;
use x509_cert::Certificate as X509Certificate;

use crate::message::{Body, CertificateRequest, Extension, Handshake};
use crate::util::to_hex;

/// Who sent a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Client,
    Server,
}

impl Direction {
    fn prefix(&self) -> &'static str {
        match self {
            Direction::Client => "Client",
            Direction::Server => "Server",
        }
    }
}

/// Decoded fields of the handshake messages seen so far.
///
/// Keyed by message name, then field name. Only filled when the
/// configuration enables it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl SessionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, message: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.get(message)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.entries
    }

    fn set(&mut self, message: &str, field: &str, value: String) {
        self.entries
            .entry(message.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    pub fn record(&mut self, handshake: &Handshake, from: Direction) {
        match &handshake.body {
            Body::ClientHello(ch) => {
                let m = "ClientHello";
                self.set(m, "ProtocolVersion", format!("{:?}", ch.client_version));
                self.set(m, "Random", to_hex(&ch.random.to_bytes()));
                self.set(m, "SessionId", to_hex(&ch.session_id));
                self.set(m, "CipherSuites", join(&ch.cipher_suites));
                self.set(m, "CompressionMethods", to_hex(&ch.compression_methods));
                self.record_extensions(m, &ch.extensions);
            }
            Body::ServerHello(sh) => {
                let m = "ServerHello";
                self.set(m, "ProtocolVersion", format!("{:?}", sh.server_version));
                self.set(m, "Random", to_hex(&sh.random.to_bytes()));
                self.set(m, "SessionId", to_hex(&sh.session_id));
                self.set(m, "CipherSuite", format!("{:?}", sh.cipher_suite));
                self.record_extensions(m, &sh.extensions);
            }
            Body::Certificate(c) => {
                let m = format!("{} Certificate", from.prefix());
                self.set(&m, "Count", c.certificate_list.len().to_string());
                if let Some(cert) = c.leaf().and_then(|d| X509Certificate::from_der(d).ok()) {
                    let tbs = &cert.tbs_certificate;
                    self.set(&m, "Subject", tbs.subject.to_string());
                    self.set(&m, "Issuer", tbs.issuer.to_string());
                    self.set(&m, "SerialNumber", to_hex(tbs.serial_number.as_bytes()));
                }
            }
            Body::ServerKeyExchange(ske) => {
                let m = "ServerKeyExchange";
                self.set(m, "NamedCurve", format!("{:?}", ske.named_group));
                self.set(m, "PublicKey", to_hex(&ske.public_key));
                self.set(m, "SignatureAlgorithm", format!("{:?}", ske.signed.scheme));
            }
            Body::CertificateRequest(cr) => {
                let m = "CertificateRequest";
                if let CertificateRequest::Tls12 {
                    certificate_types, ..
                } = cr
                {
                    self.set(m, "CertificateTypes", to_hex(certificate_types));
                }
                self.set(m, "SignatureAlgorithms", join(cr.signature_algorithms()));
            }
            Body::ClientKeyExchange(cke) => {
                self.set(
                    "ClientKeyExchange",
                    "Length",
                    cke.exchange_keys.len().to_string(),
                );
            }
            Body::CertificateVerify(cv) => {
                let m = format!("{} CertificateVerify", from.prefix());
                self.set(&m, "SignatureAlgorithm", format!("{:?}", cv.signed.scheme));
            }
            Body::KeyUpdate(ku) => {
                let m = format!("{} KeyUpdate", from.prefix());
                self.set(&m, "UpdateRequested", ku.is_update_requested().to_string());
            }
            _ => {
                let m = format!("{} {:?}", from.prefix(), handshake.message_type());
                self.set(&m, "Length", handshake.to_bytes().len().to_string());
            }
        }
    }

    fn record_extensions(&mut self, message: &str, extensions: &[Extension]) {
        for ext in extensions {
            let (name, value) = match ext {
                Extension::ServerName(names) => ("ServerName", names.join(",")),
                Extension::SupportedGroups(groups) => ("SupportedGroups", join(groups)),
                Extension::SignatureAlgorithms(s) => ("SignatureAlgorithms", join(s)),
                Extension::EcPointFormats(f) => ("EcPointFormats", to_hex(f)),
                Extension::SupportedVersionsClient(v) => ("SupportedVersions", join(v)),
                Extension::SupportedVersionsServer(v) => ("SupportedVersions", format!("{:?}", v)),
                Extension::KeyShareClient(entries) => (
                    "KeyShare",
                    join(&entries.iter().map(|e| e.group).collect::<Vec<_>>()),
                ),
                Extension::KeyShareServer(entry) => ("KeyShare", format!("{:?}", entry.group)),
                Extension::RenegotiationInfo(data) => ("RenegotiationInfo", to_hex(data)),
                Extension::Unknown {
                    extension_type,
                    data,
                } => {
                    self.set(
                        message,
                        &format!("Extensions/{:#06x}", extension_type),
                        to_hex(data),
                    );
                    continue;
                }
            };
            self.set(message, &format!("Extensions/{}", name), value);
        }
    }
}

fn join<T: std::fmt::Debug>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| format!("{:?}", i))
        .collect::<Vec<_>>()
        .join(",")
}
