use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use crate::types::NamedGroup;
use crate::util::with_u16_len;

/// A single key share (RFC 8446 Section 4.2.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: NamedGroup,
    pub key_exchange: Vec<u8>,
}

impl KeyShareEntry {
    pub fn new(group: NamedGroup, key_exchange: Vec<u8>) -> Self {
        KeyShareEntry {
            group,
            key_exchange,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], KeyShareEntry> {
        let (input, group) = NamedGroup::parse(input)?;
        let (input, len) = be_u16(input)?;
        let (input, key_exchange) = take(len as usize)(input)?;
        Ok((
            input,
            KeyShareEntry {
                group,
                key_exchange: key_exchange.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.group.as_u16().to_be_bytes());
        with_u16_len(output, |o| o.extend_from_slice(&self.key_exchange));
    }
}
