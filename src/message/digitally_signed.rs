use nom::multi::length_data;
use nom::number::complete::be_u16;
use nom::IResult;

use crate::types::SignatureScheme;
use crate::util::with_u16_len;

/// A signature together with the scheme that produced it.
///
/// Shared by ServerKeyExchange and CertificateVerify in both versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitallySigned {
    pub scheme: SignatureScheme,
    pub signature: Vec<u8>,
}

impl DigitallySigned {
    pub fn new(scheme: SignatureScheme, signature: Vec<u8>) -> Self {
        DigitallySigned { scheme, signature }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], DigitallySigned> {
        let (input, scheme) = SignatureScheme::parse(input)?;
        let (input, signature) = length_data(be_u16)(input)?;
        Ok((
            input,
            DigitallySigned {
                scheme,
                signature: signature.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.scheme.as_u16().to_be_bytes());
        with_u16_len(output, |o| o.extend_from_slice(&self.signature));
    }
}
