use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u8};

use crate::util::{with_u16_len, with_u8_len};

/// ClientKeyExchange (RFC 5246 Section 7.4.7).
///
/// The body layout depends on the negotiated key exchange, which the parser
/// does not know. The raw body is kept and decoded by the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeyExchange {
    pub exchange_keys: Vec<u8>,
}

impl ClientKeyExchange {
    /// An RSA-encrypted pre-master secret.
    pub fn rsa(encrypted_pre_master_secret: &[u8]) -> Self {
        let mut exchange_keys = Vec::new();
        with_u16_len(&mut exchange_keys, |o| {
            o.extend_from_slice(encrypted_pre_master_secret)
        });
        ClientKeyExchange { exchange_keys }
    }

    /// An ephemeral ECDH public point.
    pub fn ecdhe(public_key: &[u8]) -> Self {
        let mut exchange_keys = Vec::new();
        with_u8_len(&mut exchange_keys, |o| o.extend_from_slice(public_key));
        ClientKeyExchange { exchange_keys }
    }

    pub fn parse(input: &[u8]) -> nom::IResult<&[u8], ClientKeyExchange> {
        Ok((
            &[],
            ClientKeyExchange {
                exchange_keys: input.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.exchange_keys);
    }

    /// The `EncryptedPreMasterSecret`, if the body is well formed.
    pub fn encrypted_pre_master_secret(&self) -> Option<&[u8]> {
        match length_data::<_, _, nom::error::Error<&[u8]>, _>(be_u16)(&self.exchange_keys[..]) {
            Ok((rest, data)) if rest.is_empty() => Some(data),
            _ => None,
        }
    }

    /// The client's `ECPoint`, if the body is well formed.
    pub fn ecdh_public(&self) -> Option<&[u8]> {
        match length_data::<_, _, nom::error::Error<&[u8]>, _>(be_u8)(&self.exchange_keys[..]) {
            Ok((rest, data)) if rest.is_empty() && !data.is_empty() => Some(data),
            _ => None,
        }
    }
}
