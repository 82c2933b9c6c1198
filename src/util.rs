//! Wire encoding helpers shared by the message serializers.

use std::fmt::Write;

use nom::error::{Error, ErrorKind};
use nom::multi::many0;
use nom::{Err, IResult, Parser};

/// Write `value` as a big-endian 24 bit integer.
pub(crate) fn put_u24(output: &mut Vec<u8>, value: usize) {
    output.extend_from_slice(&(value as u32).to_be_bytes()[1..]);
}

/// Write a u8 length prefix around whatever `f` appends.
pub(crate) fn with_u8_len(output: &mut Vec<u8>, f: impl FnOnce(&mut Vec<u8>)) {
    let at = output.len();
    output.push(0);
    f(output);
    let len = output.len() - at - 1;
    output[at] = len as u8;
}

/// Write a u16 length prefix around whatever `f` appends.
pub(crate) fn with_u16_len(output: &mut Vec<u8>, f: impl FnOnce(&mut Vec<u8>)) {
    let at = output.len();
    output.extend_from_slice(&[0, 0]);
    f(output);
    let len = (output.len() - at - 2) as u16;
    output[at..at + 2].copy_from_slice(&len.to_be_bytes());
}

/// Write a u24 length prefix around whatever `f` appends.
pub(crate) fn with_u24_len(output: &mut Vec<u8>, f: impl FnOnce(&mut Vec<u8>)) {
    let at = output.len();
    output.extend_from_slice(&[0, 0, 0]);
    f(output);
    let len = (output.len() - at - 3) as u32;
    output[at..at + 3].copy_from_slice(&len.to_be_bytes()[1..]);
}

/// Parse the entire `input` as a list of `f`, failing on trailing bytes.
pub(crate) fn all_of<'a, O, F>(f: F, input: &'a [u8]) -> Result<Vec<O>, Err<Error<&'a [u8]>>>
where
    F: Parser<&'a [u8], O, Error<&'a [u8]>>,
{
    let (rest, items) = many0(f)(input)?;
    if !rest.is_empty() {
        return Err(Err::Failure(Error::new(rest, ErrorKind::LengthValue)));
    }
    Ok(items)
}

/// Fail with `LengthValue` unless `input` is empty.
pub(crate) fn expect_empty(input: &[u8]) -> IResult<&[u8], ()> {
    if input.is_empty() {
        Ok((input, ()))
    } else {
        Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)))
    }
}

/// Lowercase hex rendering used by diagnostics.
pub fn to_hex(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for b in data {
        let _ = write!(s, "{:02x}", b);
    }
    s
}
