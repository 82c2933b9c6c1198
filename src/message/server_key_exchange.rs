use nom::error::{Error, ErrorKind};
use nom::multi::length_data;
use nom::number::complete::be_u8;
use nom::{Err, IResult};

use super::DigitallySigned;
use crate::types::NamedGroup;
use crate::util::with_u8_len;

/// ECCurveType named_curve (RFC 8422 Section 5.4).
pub const CURVE_TYPE_NAMED_CURVE: u8 = 3;

/// ECDHE ServerKeyExchange (RFC 8422 Section 5.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyExchange {
    pub named_group: NamedGroup,
    pub public_key: Vec<u8>,
    pub signed: DigitallySigned,
}

impl ServerKeyExchange {
    /// Encode `ServerECDHParams`, the part covered by the signature.
    pub fn params_bytes(named_group: NamedGroup, public_key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + public_key.len());
        out.push(CURVE_TYPE_NAMED_CURVE);
        out.extend_from_slice(&named_group.as_u16().to_be_bytes());
        with_u8_len(&mut out, |o| o.extend_from_slice(public_key));
        out
    }

    /// The exact bytes the server signs:
    /// `client_random || server_random || ServerECDHParams`.
    pub fn signed_content(
        client_random: &[u8; 32],
        server_random: &[u8; 32],
        named_group: NamedGroup,
        public_key: &[u8],
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + 4 + public_key.len());
        out.extend_from_slice(client_random);
        out.extend_from_slice(server_random);
        out.extend_from_slice(&Self::params_bytes(named_group, public_key));
        out
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerKeyExchange> {
        let (input, curve_type) = be_u8(input)?;
        if curve_type != CURVE_TYPE_NAMED_CURVE {
            return Err(Err::Failure(Error::new(input, ErrorKind::Tag)));
        }
        let (input, named_group) = NamedGroup::parse(input)?;
        let (input, public_key) = length_data(be_u8)(input)?;
        let (input, signed) = DigitallySigned::parse(input)?;

        Ok((
            input,
            ServerKeyExchange {
                named_group,
                public_key: public_key.to_vec(),
                signed,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&Self::params_bytes(self.named_group, &self.public_key));
        self.signed.serialize(output);
    }
}
