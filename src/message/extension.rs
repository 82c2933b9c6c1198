//! Hello extensions (RFC 8446 Section 4.2).
//!
//! Several extensions have a different body depending on which message
//! carries them, e.g. `supported_versions` is a list in ClientHello but a
//! single version in ServerHello. [`ExtensionContext`] selects the form.

use nom::bytes::complete::take;
use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::KeyShareEntry;
use crate::types::{NamedGroup, ProtocolVersion, SignatureScheme};
use crate::util::{all_of, with_u16_len, with_u8_len};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionContext {
    ClientHello,
    ServerHello,
    EncryptedExtensions,
    CertificateRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionType {
    ServerName,
    SupportedGroups,
    EcPointFormats,
    SignatureAlgorithms,
    ApplicationLayerProtocolNegotiation,
    Padding,
    EncryptThenMac,
    ExtendedMasterSecret,
    SessionTicket,
    PreSharedKey,
    EarlyData,
    SupportedVersions,
    Cookie,
    PskKeyExchangeModes,
    CertificateAuthorities,
    PostHandshakeAuth,
    SignatureAlgorithmsCert,
    KeyShare,
    RenegotiationInfo,
    Unknown(u16),
}

impl ExtensionType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => ExtensionType::ServerName,
            0x000A => ExtensionType::SupportedGroups,
            0x000B => ExtensionType::EcPointFormats,
            0x000D => ExtensionType::SignatureAlgorithms,
            0x0010 => ExtensionType::ApplicationLayerProtocolNegotiation,
            0x0015 => ExtensionType::Padding,
            0x0016 => ExtensionType::EncryptThenMac,
            0x0017 => ExtensionType::ExtendedMasterSecret,
            0x0023 => ExtensionType::SessionTicket,
            0x0029 => ExtensionType::PreSharedKey,
            0x002A => ExtensionType::EarlyData,
            0x002B => ExtensionType::SupportedVersions,
            0x002C => ExtensionType::Cookie,
            0x002D => ExtensionType::PskKeyExchangeModes,
            0x002F => ExtensionType::CertificateAuthorities,
            0x0031 => ExtensionType::PostHandshakeAuth,
            0x0032 => ExtensionType::SignatureAlgorithmsCert,
            0x0033 => ExtensionType::KeyShare,
            0xFF01 => ExtensionType::RenegotiationInfo,
            _ => ExtensionType::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            ExtensionType::ServerName => 0x0000,
            ExtensionType::SupportedGroups => 0x000A,
            ExtensionType::EcPointFormats => 0x000B,
            ExtensionType::SignatureAlgorithms => 0x000D,
            ExtensionType::ApplicationLayerProtocolNegotiation => 0x0010,
            ExtensionType::Padding => 0x0015,
            ExtensionType::EncryptThenMac => 0x0016,
            ExtensionType::ExtendedMasterSecret => 0x0017,
            ExtensionType::SessionTicket => 0x0023,
            ExtensionType::PreSharedKey => 0x0029,
            ExtensionType::EarlyData => 0x002A,
            ExtensionType::SupportedVersions => 0x002B,
            ExtensionType::Cookie => 0x002C,
            ExtensionType::PskKeyExchangeModes => 0x002D,
            ExtensionType::CertificateAuthorities => 0x002F,
            ExtensionType::PostHandshakeAuth => 0x0031,
            ExtensionType::SignatureAlgorithmsCert => 0x0032,
            ExtensionType::KeyShare => 0x0033,
            ExtensionType::RenegotiationInfo => 0xFF01,
            ExtensionType::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ExtensionType> {
        let (input, value) = be_u16(input)?;
        Ok((input, ExtensionType::from_u16(value)))
    }
}

/// A decoded extension.
///
/// Extensions the engine does not act on are kept verbatim as `Unknown` so a
/// parsed message serializes back to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// Host names from `server_name`. Empty when echoed by the server.
    ServerName(Vec<String>),
    SupportedGroups(Vec<NamedGroup>),
    SignatureAlgorithms(Vec<SignatureScheme>),
    EcPointFormats(Vec<u8>),
    SupportedVersionsClient(Vec<ProtocolVersion>),
    SupportedVersionsServer(ProtocolVersion),
    KeyShareClient(Vec<KeyShareEntry>),
    KeyShareServer(KeyShareEntry),
    RenegotiationInfo(Vec<u8>),
    Unknown { extension_type: u16, data: Vec<u8> },
}

impl Extension {
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            Extension::ServerName(_) => ExtensionType::ServerName,
            Extension::SupportedGroups(_) => ExtensionType::SupportedGroups,
            Extension::SignatureAlgorithms(_) => ExtensionType::SignatureAlgorithms,
            Extension::EcPointFormats(_) => ExtensionType::EcPointFormats,
            Extension::SupportedVersionsClient(_) | Extension::SupportedVersionsServer(_) => {
                ExtensionType::SupportedVersions
            }
            Extension::KeyShareClient(_) | Extension::KeyShareServer(_) => ExtensionType::KeyShare,
            Extension::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            Extension::Unknown { extension_type, .. } => ExtensionType::from_u16(*extension_type),
        }
    }

    pub fn parse(input: &[u8], ctx: ExtensionContext) -> IResult<&[u8], Extension> {
        let (input, extension_type) = be_u16(input)?;
        let (input, data) = length_data(be_u16)(input)?;

        let extension = match Self::parse_body(ExtensionType::from_u16(extension_type), data, ctx)
        {
            Ok((_, Some(e))) => e,
            Ok((_, None)) => Extension::Unknown {
                extension_type,
                data: data.to_vec(),
            },
            Err(e) => return Err(e),
        };

        Ok((input, extension))
    }

    fn parse_body(
        extension_type: ExtensionType,
        data: &[u8],
        ctx: ExtensionContext,
    ) -> IResult<&[u8], Option<Extension>> {
        use ExtensionContext as C;

        let ext = match (extension_type, ctx) {
            (ExtensionType::ServerName, C::ClientHello) => {
                let (rest, list) = length_data(be_u16)(data)?;
                expect_all(rest)?;
                let entries = all_of(server_name_entry, list)?;
                let names = entries.into_iter().flatten().collect();
                Extension::ServerName(names)
            }
            (ExtensionType::ServerName, _) if data.is_empty() => Extension::ServerName(vec![]),
            (ExtensionType::SupportedGroups, _) => {
                let (rest, list) = length_data(be_u16)(data)?;
                expect_all(rest)?;
                Extension::SupportedGroups(all_of(NamedGroup::parse, list)?)
            }
            (ExtensionType::SignatureAlgorithms, _) => {
                let (rest, list) = length_data(be_u16)(data)?;
                expect_all(rest)?;
                Extension::SignatureAlgorithms(all_of(SignatureScheme::parse, list)?)
            }
            (ExtensionType::EcPointFormats, _) => {
                let (rest, list) = length_data(be_u8)(data)?;
                expect_all(rest)?;
                Extension::EcPointFormats(list.to_vec())
            }
            (ExtensionType::SupportedVersions, C::ClientHello) => {
                let (rest, list) = length_data(be_u8)(data)?;
                expect_all(rest)?;
                Extension::SupportedVersionsClient(all_of(ProtocolVersion::parse, list)?)
            }
            (ExtensionType::SupportedVersions, C::ServerHello) => {
                let (rest, version) = ProtocolVersion::parse(data)?;
                expect_all(rest)?;
                Extension::SupportedVersionsServer(version)
            }
            (ExtensionType::KeyShare, C::ClientHello) => {
                let (rest, list) = length_data(be_u16)(data)?;
                expect_all(rest)?;
                Extension::KeyShareClient(all_of(KeyShareEntry::parse, list)?)
            }
            (ExtensionType::KeyShare, C::ServerHello) => {
                let (rest, entry) = KeyShareEntry::parse(data)?;
                expect_all(rest)?;
                Extension::KeyShareServer(entry)
            }
            (ExtensionType::RenegotiationInfo, _) => {
                let (rest, info) = length_data(be_u8)(data)?;
                expect_all(rest)?;
                Extension::RenegotiationInfo(info.to_vec())
            }
            _ => return Ok((&[], None)),
        };

        Ok((&[], Some(ext)))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.extension_type().as_u16().to_be_bytes());
        with_u16_len(output, |o| self.serialize_body(o));
    }

    fn serialize_body(&self, output: &mut Vec<u8>) {
        match self {
            Extension::ServerName(names) => {
                if names.is_empty() {
                    return;
                }
                with_u16_len(output, |o| {
                    for name in names {
                        o.push(0); // host_name
                        with_u16_len(o, |o| o.extend_from_slice(name.as_bytes()));
                    }
                });
            }
            Extension::SupportedGroups(groups) => with_u16_len(output, |o| {
                for g in groups {
                    o.extend_from_slice(&g.as_u16().to_be_bytes());
                }
            }),
            Extension::SignatureAlgorithms(schemes) => with_u16_len(output, |o| {
                for s in schemes {
                    o.extend_from_slice(&s.as_u16().to_be_bytes());
                }
            }),
            Extension::EcPointFormats(formats) => {
                with_u8_len(output, |o| o.extend_from_slice(formats))
            }
            Extension::SupportedVersionsClient(versions) => with_u8_len(output, |o| {
                for v in versions {
                    v.serialize(o);
                }
            }),
            Extension::SupportedVersionsServer(version) => version.serialize(output),
            Extension::KeyShareClient(entries) => with_u16_len(output, |o| {
                for e in entries {
                    e.serialize(o);
                }
            }),
            Extension::KeyShareServer(entry) => entry.serialize(output),
            Extension::RenegotiationInfo(info) => {
                with_u8_len(output, |o| o.extend_from_slice(info))
            }
            Extension::Unknown { data, .. } => output.extend_from_slice(data),
        }
    }
}

/// Parse a list of extensions prefixed by a u16 length.
pub(crate) fn parse_extensions(
    input: &[u8],
    ctx: ExtensionContext,
) -> IResult<&[u8], Vec<Extension>> {
    let (input, data) = length_data(be_u16)(input)?;
    let extensions = all_of(|i| Extension::parse(i, ctx), data)?;
    Ok((input, extensions))
}

pub(crate) fn serialize_extensions(extensions: &[Extension], output: &mut Vec<u8>) {
    with_u16_len(output, |o| {
        for ext in extensions {
            ext.serialize(o);
        }
    });
}

fn server_name_entry(input: &[u8]) -> IResult<&[u8], Option<String>> {
    let (input, name_type) = be_u8(input)?;
    let (input, len) = be_u16(input)?;
    let (input, name) = take(len as usize)(input)?;
    // Only host_name(0) is defined.
    if name_type != 0 {
        return Ok((input, None));
    }
    Ok((input, Some(String::from_utf8_lossy(name).into_owned())))
}

fn expect_all(rest: &[u8]) -> Result<(), nom::Err<nom::error::Error<&[u8]>>> {
    crate::util::expect_empty(rest).map(|_| ())
}
