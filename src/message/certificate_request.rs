use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::extension::{parse_extensions, serialize_extensions};
use super::{Extension, ExtensionContext};
use crate::types::SignatureScheme;
use crate::util::{all_of, with_u16_len, with_u8_len};

/// rsa_sign client certificate type.
pub const CLIENT_CERTIFICATE_TYPE_RSA_SIGN: u8 = 1;
/// ecdsa_sign client certificate type.
pub const CLIENT_CERTIFICATE_TYPE_ECDSA_SIGN: u8 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateRequest {
    /// RFC 5246 Section 7.4.4.
    Tls12 {
        certificate_types: Vec<u8>,
        signature_algorithms: Vec<SignatureScheme>,
        certificate_authorities: Vec<Vec<u8>>,
    },
    /// RFC 8446 Section 4.3.2.
    Tls13 {
        context: Vec<u8>,
        extensions: Vec<Extension>,
    },
}

impl CertificateRequest {
    pub fn parse(input: &[u8], tls13: bool) -> IResult<&[u8], CertificateRequest> {
        if tls13 {
            let (input, context) = length_data(be_u8)(input)?;
            let (input, extensions) = parse_extensions(input, ExtensionContext::CertificateRequest)?;
            return Ok((
                input,
                CertificateRequest::Tls13 {
                    context: context.to_vec(),
                    extensions,
                },
            ));
        }

        let (input, certificate_types) = length_data(be_u8)(input)?;
        let (input, algorithms) = length_data(be_u16)(input)?;
        let signature_algorithms = all_of(SignatureScheme::parse, algorithms)?;
        let (input, authorities) = length_data(be_u16)(input)?;
        let certificate_authorities = all_of(distinguished_name, authorities)?;

        Ok((
            input,
            CertificateRequest::Tls12 {
                certificate_types: certificate_types.to_vec(),
                signature_algorithms,
                certificate_authorities,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            CertificateRequest::Tls12 {
                certificate_types,
                signature_algorithms,
                certificate_authorities,
            } => {
                with_u8_len(output, |o| o.extend_from_slice(certificate_types));
                with_u16_len(output, |o| {
                    for s in signature_algorithms {
                        o.extend_from_slice(&s.as_u16().to_be_bytes());
                    }
                });
                with_u16_len(output, |o| {
                    for dn in certificate_authorities {
                        with_u16_len(o, |o| o.extend_from_slice(dn));
                    }
                });
            }
            CertificateRequest::Tls13 {
                context,
                extensions,
            } => {
                with_u8_len(output, |o| o.extend_from_slice(context));
                serialize_extensions(extensions, output);
            }
        }
    }

    /// Signature schemes the server accepts for CertificateVerify.
    pub fn signature_algorithms(&self) -> &[SignatureScheme] {
        match self {
            CertificateRequest::Tls12 {
                signature_algorithms,
                ..
            } => signature_algorithms,
            CertificateRequest::Tls13 { extensions, .. } => extensions
                .iter()
                .find_map(|e| match e {
                    Extension::SignatureAlgorithms(s) => Some(s.as_slice()),
                    _ => None,
                })
                .unwrap_or(&[]),
        }
    }
}

fn distinguished_name(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, dn) = length_data(be_u16)(input)?;
    Ok((input, dn.to_vec()))
}
