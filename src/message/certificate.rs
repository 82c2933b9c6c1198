use nom::bytes::complete::take;
use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u24, be_u8};
use nom::IResult;

use crate::util::{all_of, with_u16_len, with_u24_len, with_u8_len};

/// Certificate message.
///
/// TLS 1.3 prefixes the list with a request context and gives every entry
/// its own extensions block (RFC 8446 Section 4.4.2). `context` is `Some`
/// for that form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub context: Option<Vec<u8>>,
    pub certificate_list: Vec<Vec<u8>>,
}

impl Certificate {
    pub fn new(certificate_list: Vec<Vec<u8>>) -> Self {
        Certificate {
            context: None,
            certificate_list,
        }
    }

    pub fn new_tls13(context: Vec<u8>, certificate_list: Vec<Vec<u8>>) -> Self {
        Certificate {
            context: Some(context),
            certificate_list,
        }
    }

    pub fn parse(input: &[u8], tls13: bool) -> IResult<&[u8], Certificate> {
        let (input, context) = if tls13 {
            let (input, context) = length_data(be_u8)(input)?;
            (input, Some(context.to_vec()))
        } else {
            (input, None)
        };

        let (input, list_len) = be_u24(input)?;
        let (input, list) = take(list_len as usize)(input)?;

        let certificate_list = if tls13 {
            all_of(tls13_entry, list)?
        } else {
            all_of(tls12_entry, list)?
        };

        Ok((
            input,
            Certificate {
                context,
                certificate_list,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        if let Some(context) = &self.context {
            with_u8_len(output, |o| o.extend_from_slice(context));
        }
        let tls13 = self.context.is_some();
        with_u24_len(output, |o| {
            for cert in &self.certificate_list {
                with_u24_len(o, |o| o.extend_from_slice(cert));
                if tls13 {
                    // No per-certificate extensions.
                    with_u16_len(o, |_| {});
                }
            }
        });
    }

    /// The end-entity certificate, if any.
    pub fn leaf(&self) -> Option<&[u8]> {
        self.certificate_list.first().map(|c| c.as_slice())
    }
}

fn tls12_entry(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, len) = be_u24(input)?;
    let (input, cert) = take(len as usize)(input)?;
    Ok((input, cert.to_vec()))
}

fn tls13_entry(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, cert) = tls12_entry(input)?;
    let (input, _extensions) = length_data(be_u16)(input)?;
    Ok((input, cert))
}
