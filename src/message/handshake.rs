use std::fmt;

use nom::bytes::complete::take;
use nom::number::complete::{be_u24, be_u8};
use nom::IResult;

use super::{
    Certificate, CertificateRequest, CertificateVerify, ClientHello, ClientKeyExchange,
    EncryptedExtensions, Finished, KeyUpdate, ServerHello, ServerKeyExchange,
};
use crate::util::{expect_empty, put_u24};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    HelloRequest,
    ClientHello,
    ServerHello,
    NewSessionTicket,
    EndOfEarlyData,
    EncryptedExtensions,
    Certificate,
    ServerKeyExchange,
    CertificateRequest,
    ServerHelloDone,
    CertificateVerify,
    ClientKeyExchange,
    Finished,
    KeyUpdate,
    MessageHash,
    #[default]
    Unknown,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => MessageType::HelloRequest,
            1 => MessageType::ClientHello,
            2 => MessageType::ServerHello,
            4 => MessageType::NewSessionTicket,
            5 => MessageType::EndOfEarlyData,
            8 => MessageType::EncryptedExtensions,
            11 => MessageType::Certificate,
            12 => MessageType::ServerKeyExchange,
            13 => MessageType::CertificateRequest,
            14 => MessageType::ServerHelloDone,
            15 => MessageType::CertificateVerify,
            16 => MessageType::ClientKeyExchange,
            20 => MessageType::Finished,
            24 => MessageType::KeyUpdate,
            254 => MessageType::MessageHash,
            _ => MessageType::Unknown,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            MessageType::HelloRequest => 0,
            MessageType::ClientHello => 1,
            MessageType::ServerHello => 2,
            MessageType::NewSessionTicket => 4,
            MessageType::EndOfEarlyData => 5,
            MessageType::EncryptedExtensions => 8,
            MessageType::Certificate => 11,
            MessageType::ServerKeyExchange => 12,
            MessageType::CertificateRequest => 13,
            MessageType::ServerHelloDone => 14,
            MessageType::CertificateVerify => 15,
            MessageType::ClientKeyExchange => 16,
            MessageType::Finished => 20,
            MessageType::KeyUpdate => 24,
            MessageType::MessageHash => 254,
            MessageType::Unknown => 255,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], MessageType> {
        let (input, byte) = be_u8(input)?;
        Ok((input, Self::from_u8(byte)))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    EncryptedExtensions(EncryptedExtensions),
    Certificate(Certificate),
    ServerKeyExchange(ServerKeyExchange),
    CertificateRequest(CertificateRequest),
    ServerHelloDone,
    CertificateVerify(CertificateVerify),
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
    KeyUpdate(KeyUpdate),
    /// Any message the engine does not decode, with its type byte.
    Unknown(u8, Vec<u8>),
}

impl Body {
    pub fn message_type(&self) -> MessageType {
        match self {
            Body::HelloRequest => MessageType::HelloRequest,
            Body::ClientHello(_) => MessageType::ClientHello,
            Body::ServerHello(_) => MessageType::ServerHello,
            Body::EncryptedExtensions(_) => MessageType::EncryptedExtensions,
            Body::Certificate(_) => MessageType::Certificate,
            Body::ServerKeyExchange(_) => MessageType::ServerKeyExchange,
            Body::CertificateRequest(_) => MessageType::CertificateRequest,
            Body::ServerHelloDone => MessageType::ServerHelloDone,
            Body::CertificateVerify(_) => MessageType::CertificateVerify,
            Body::ClientKeyExchange(_) => MessageType::ClientKeyExchange,
            Body::Finished(_) => MessageType::Finished,
            Body::KeyUpdate(_) => MessageType::KeyUpdate,
            Body::Unknown(t, _) => MessageType::from_u8(*t),
        }
    }

    fn type_byte(&self) -> u8 {
        match self {
            Body::Unknown(t, _) => *t,
            _ => self.message_type().as_u8(),
        }
    }

    /// Parse a body of type `type_byte`. The whole input must be consumed.
    ///
    /// `tls13` selects the TLS 1.3 layout of Certificate and
    /// CertificateRequest.
    pub fn parse(input: &[u8], type_byte: u8, tls13: bool) -> IResult<&[u8], Body> {
        let (rest, body) = match MessageType::from_u8(type_byte) {
            MessageType::HelloRequest => (input, Body::HelloRequest),
            MessageType::ClientHello => {
                let (rest, m) = ClientHello::parse(input)?;
                (rest, Body::ClientHello(m))
            }
            MessageType::ServerHello => {
                let (rest, m) = ServerHello::parse(input)?;
                (rest, Body::ServerHello(m))
            }
            MessageType::EncryptedExtensions => {
                let (rest, m) = EncryptedExtensions::parse(input)?;
                (rest, Body::EncryptedExtensions(m))
            }
            MessageType::Certificate => {
                let (rest, m) = Certificate::parse(input, tls13)?;
                (rest, Body::Certificate(m))
            }
            MessageType::ServerKeyExchange => {
                let (rest, m) = ServerKeyExchange::parse(input)?;
                (rest, Body::ServerKeyExchange(m))
            }
            MessageType::CertificateRequest => {
                let (rest, m) = CertificateRequest::parse(input, tls13)?;
                (rest, Body::CertificateRequest(m))
            }
            MessageType::ServerHelloDone => (input, Body::ServerHelloDone),
            MessageType::CertificateVerify => {
                let (rest, m) = CertificateVerify::parse(input)?;
                (rest, Body::CertificateVerify(m))
            }
            MessageType::ClientKeyExchange => {
                let (rest, m) = ClientKeyExchange::parse(input)?;
                (rest, Body::ClientKeyExchange(m))
            }
            MessageType::Finished => {
                let (rest, m) = Finished::parse(input)?;
                (rest, Body::Finished(m))
            }
            MessageType::KeyUpdate => {
                let (rest, m) = KeyUpdate::parse(input)?;
                (rest, Body::KeyUpdate(m))
            }
            _ => (&input[input.len()..], Body::Unknown(type_byte, input.to_vec())),
        };
        let (rest, _) = expect_empty(rest)?;
        Ok((rest, body))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            Body::HelloRequest | Body::ServerHelloDone => {}
            Body::ClientHello(m) => m.serialize(output),
            Body::ServerHello(m) => m.serialize(output),
            Body::EncryptedExtensions(m) => m.serialize(output),
            Body::Certificate(m) => m.serialize(output),
            Body::ServerKeyExchange(m) => m.serialize(output),
            Body::CertificateRequest(m) => m.serialize(output),
            Body::CertificateVerify(m) => m.serialize(output),
            Body::ClientKeyExchange(m) => m.serialize(output),
            Body::Finished(m) => m.serialize(output),
            Body::KeyUpdate(m) => m.serialize(output),
            Body::Unknown(_, data) => output.extend_from_slice(data),
        }
    }
}

/// A complete handshake message: 4-byte header and body.
///
/// A parsed message remembers its wire bytes so the transcript sees exactly
/// what the peer sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub body: Body,
    raw: Option<Vec<u8>>,
}

impl Handshake {
    pub fn new(body: Body) -> Self {
        Handshake { body, raw: None }
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn parse(input: &[u8], tls13: bool) -> IResult<&[u8], Handshake> {
        let original = input;
        let (input, type_byte) = be_u8(input)?;
        let (input, length) = be_u24(input)?;
        let (input, body_bytes) = take(length as usize)(input)?;
        let (_, body) = Body::parse(body_bytes, type_byte, tls13)?;

        let raw = original[..4 + length as usize].to_vec();
        Ok((
            input,
            Handshake {
                body,
                raw: Some(raw),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        if let Some(raw) = &self.raw {
            output.extend_from_slice(raw);
            return;
        }
        output.push(self.body.type_byte());
        let at = output.len();
        put_u24(output, 0);
        self.body.serialize(output);
        let len = output.len() - at - 3;
        output[at..at + 3].copy_from_slice(&(len as u32).to_be_bytes()[1..]);
    }

    /// The message as it appears on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize(&mut out);
        out
    }
}

impl From<Body> for Handshake {
    fn from(body: Body) -> Self {
        Handshake::new(body)
    }
}
