//! Record layer values (RFC 5246 Section 6.2, RFC 8446 Section 5).
//!
//! A [`Record`] is what the transport hands to the engine and what the engine
//! hands back. Framing on the wire is the transport's business; these types
//! only know how to render and read one complete record.

use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::{Err, IResult};

use super::Handshake;
use crate::alert::Alert;
use crate::types::{ContentType, ProtocolVersion};
use crate::util::expect_empty;

/// Largest plaintext fragment a record may carry.
pub const MAX_FRAGMENT_LEN: usize = 16384;

/// Ciphertext may exceed the plaintext limit by this much.
const MAX_CIPHERTEXT_EXPANSION: usize = 2048;

/// One handshake-record fragment, either parsed or still protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Plain(Handshake),
    /// IV-prefixed CBC ciphertext of a single message (TLS 1.2 Finished).
    Encrypted(Vec<u8>),
}

impl Fragment {
    fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            Fragment::Plain(handshake) => handshake.serialize(output),
            Fragment::Encrypted(data) => output.extend_from_slice(data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Handshake(Vec<Fragment>),
    ChangeCipherSpec,
    /// Opaque record body. For TLS 1.3 this also carries protected
    /// handshake messages and alerts.
    ApplicationData(Vec<u8>),
    Alert(Alert),
}

impl Record {
    pub fn content_type(&self) -> ContentType {
        match self {
            Record::Handshake(_) => ContentType::Handshake,
            Record::ChangeCipherSpec => ContentType::ChangeCipherSpec,
            Record::ApplicationData(_) => ContentType::ApplicationData,
            Record::Alert(_) => ContentType::Alert,
        }
    }

    /// Wrap plaintext handshake messages in one record.
    pub fn handshake(messages: impl IntoIterator<Item = Handshake>) -> Record {
        Record::Handshake(messages.into_iter().map(Fragment::Plain).collect())
    }

    /// Read one record.
    ///
    /// `encrypted_handshake` tells the parser that a Handshake record body is
    /// ciphertext, which is the case between the client's ChangeCipherSpec and
    /// its Finished in TLS 1.2.
    pub fn parse(input: &[u8], encrypted_handshake: bool) -> IResult<&[u8], Record> {
        let (input, content_type) = ContentType::parse(input)?;
        let (input, version) = ProtocolVersion::parse(input)?;
        let (input, length) = be_u16(input)?;

        // Any 0x03xx is acceptable as a record version.
        if version.as_u16() >> 8 != 0x03 {
            return Err(Err::Failure(Error::new(input, ErrorKind::Tag)));
        }
        if length as usize > MAX_FRAGMENT_LEN + MAX_CIPHERTEXT_EXPANSION {
            return Err(Err::Failure(Error::new(input, ErrorKind::TooLarge)));
        }

        let (input, body) = take(length as usize)(input)?;

        let record = match content_type {
            ContentType::Handshake if encrypted_handshake => {
                Record::Handshake(vec![Fragment::Encrypted(body.to_vec())])
            }
            ContentType::Handshake => {
                let mut fragments = Vec::new();
                let mut rest = body;
                while !rest.is_empty() {
                    let (r, handshake) = Handshake::parse(rest, false)?;
                    fragments.push(Fragment::Plain(handshake));
                    rest = r;
                }
                if fragments.is_empty() {
                    return Err(Err::Failure(Error::new(body, ErrorKind::Eof)));
                }
                Record::Handshake(fragments)
            }
            ContentType::ChangeCipherSpec => {
                let (rest, value) = be_u8(body)?;
                expect_empty(rest)?;
                if value != 1 {
                    return Err(Err::Failure(Error::new(body, ErrorKind::Verify)));
                }
                Record::ChangeCipherSpec
            }
            ContentType::ApplicationData => Record::ApplicationData(body.to_vec()),
            ContentType::Alert => {
                let (rest, alert) = Alert::parse(body)?;
                expect_empty(rest)?;
                Record::Alert(alert)
            }
            ContentType::Unknown(_) => {
                return Err(Err::Failure(Error::new(body, ErrorKind::Switch)));
            }
        };

        Ok((input, record))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.content_type().as_u8());
        ProtocolVersion::TLS1_2.serialize(output);
        let at = output.len();
        output.extend_from_slice(&[0, 0]);
        match self {
            Record::Handshake(fragments) => {
                for f in fragments {
                    f.serialize(output);
                }
            }
            Record::ChangeCipherSpec => output.push(1),
            Record::ApplicationData(data) => output.extend_from_slice(data),
            Record::Alert(alert) => alert.serialize(output),
        }
        let len = (output.len() - at - 2) as u16;
        output[at..at + 2].copy_from_slice(&len.to_be_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize(&mut out);
        out
    }
}
