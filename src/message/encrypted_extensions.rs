use nom::IResult;

use super::extension::{parse_extensions, serialize_extensions};
use super::{Extension, ExtensionContext};

/// EncryptedExtensions (RFC 8446 Section 4.3.1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedExtensions {
    pub extensions: Vec<Extension>,
}

impl EncryptedExtensions {
    pub fn new(extensions: Vec<Extension>) -> Self {
        EncryptedExtensions { extensions }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], EncryptedExtensions> {
        let (input, extensions) = parse_extensions(input, ExtensionContext::EncryptedExtensions)?;
        Ok((input, EncryptedExtensions { extensions }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        serialize_extensions(&self.extensions, output);
    }
}
