use nom::number::complete::be_u8;
use nom::IResult;

use super::extension::{parse_extensions, serialize_extensions};
use super::{Extension, ExtensionContext, KeyShareEntry, Random, SessionId};
use crate::types::{CipherSuite, ProtocolVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub server_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suite: CipherSuite,
    pub compression_method: u8,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    pub fn new(
        server_version: ProtocolVersion,
        random: Random,
        session_id: SessionId,
        cipher_suite: CipherSuite,
        extensions: Vec<Extension>,
    ) -> Self {
        ServerHello {
            server_version,
            random,
            session_id,
            cipher_suite,
            compression_method: 0,
            extensions,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerHello> {
        let (input, server_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id) = SessionId::parse(input)?;
        let (input, cipher_suite) = CipherSuite::parse(input)?;
        let (input, compression_method) = be_u8(input)?;

        let (input, extensions) = if input.is_empty() {
            (input, Vec::new())
        } else {
            parse_extensions(input, ExtensionContext::ServerHello)?
        };

        Ok((
            input,
            ServerHello {
                server_version,
                random,
                session_id,
                cipher_suite,
                compression_method,
                extensions,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.server_version.serialize(output);
        self.random.serialize(output);
        self.session_id.serialize(output);
        output.extend_from_slice(&self.cipher_suite.as_u16().to_be_bytes());
        output.push(self.compression_method);
        if !self.extensions.is_empty() {
            serialize_extensions(&self.extensions, output);
        }
    }

    /// The version selected through `supported_versions`, falling back to
    /// the legacy version field.
    pub fn selected_version(&self) -> ProtocolVersion {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::SupportedVersionsServer(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(self.server_version)
    }

    pub fn key_share(&self) -> Option<&KeyShareEntry> {
        self.extensions.iter().find_map(|e| match e {
            Extension::KeyShareServer(entry) => Some(entry),
            _ => None,
        })
    }
}
