use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::extension::{parse_extensions, serialize_extensions};
use super::{Extension, ExtensionContext, ExtensionType, KeyShareEntry, Random, SessionId};
use crate::types::{CipherSuite, NamedGroup, ProtocolVersion, SignatureScheme};
use crate::util::{all_of, with_u16_len, with_u8_len};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub client_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    pub fn new(
        client_version: ProtocolVersion,
        random: Random,
        session_id: SessionId,
        cipher_suites: Vec<CipherSuite>,
    ) -> Self {
        ClientHello {
            client_version,
            random,
            session_id,
            cipher_suites,
            compression_methods: vec![0],
            extensions: Vec::new(),
        }
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ClientHello> {
        let (input, client_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id) = SessionId::parse(input)?;
        let (input, suites) = length_data(be_u16)(input)?;
        let cipher_suites = all_of(CipherSuite::parse, suites)?;
        let (input, compression_methods) = length_data(be_u8)(input)?;

        // Extensions are optional in TLS 1.2.
        let (input, extensions) = if input.is_empty() {
            (input, Vec::new())
        } else {
            parse_extensions(input, ExtensionContext::ClientHello)?
        };

        Ok((
            input,
            ClientHello {
                client_version,
                random,
                session_id,
                cipher_suites,
                compression_methods: compression_methods.to_vec(),
                extensions,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.client_version.serialize(output);
        self.random.serialize(output);
        self.session_id.serialize(output);
        with_u16_len(output, |o| {
            for suite in &self.cipher_suites {
                o.extend_from_slice(&suite.as_u16().to_be_bytes());
            }
        });
        with_u8_len(output, |o| o.extend_from_slice(&self.compression_methods));
        if !self.extensions.is_empty() {
            serialize_extensions(&self.extensions, output);
        }
    }

    pub fn find_extension(&self, extension_type: ExtensionType) -> Option<&Extension> {
        self.extensions
            .iter()
            .find(|e| e.extension_type() == extension_type)
    }

    /// Host names from `server_name`, `None` if the extension is absent.
    pub fn server_names(&self) -> Option<&[String]> {
        self.extensions.iter().find_map(|e| match e {
            Extension::ServerName(names) => Some(names.as_slice()),
            _ => None,
        })
    }

    pub fn supported_groups(&self) -> &[NamedGroup] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::SupportedGroups(groups) => Some(groups.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn signature_algorithms(&self) -> &[SignatureScheme] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::SignatureAlgorithms(schemes) => Some(schemes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn supported_versions(&self) -> &[ProtocolVersion] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::SupportedVersionsClient(versions) => Some(versions.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn key_shares(&self) -> &[KeyShareEntry] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::KeyShareClient(entries) => Some(entries.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Whether the client signals RFC 5746 secure renegotiation support.
    pub fn signals_renegotiation_info(&self) -> bool {
        self.cipher_suites
            .contains(&CipherSuite::EMPTY_RENEGOTIATION_INFO_SCSV)
            || self
                .find_extension(ExtensionType::RenegotiationInfo)
                .is_some()
    }
}
