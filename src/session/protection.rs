//! Record protection steps the state machine applies around the suites.

use super::{fatal, Flow, OrAlert};
use crate::alert::AlertDescription;
use crate::crypto::{Tls12Suite, Tls13Suite};
use crate::message::{MessageType, Record, MAX_FRAGMENT_LEN};
use crate::types::ContentType;

/// MAC-then-encrypt `data` as application data records, one per
/// [`MAX_FRAGMENT_LEN`] chunk.
pub(super) fn seal_application_data12(
    suite: &Tls12Suite,
    send_seq: &mut u64,
    data: &[u8],
) -> Flow<Vec<Record>> {
    let mut records = Vec::with_capacity(data.len() / MAX_FRAGMENT_LEN + 1);
    for chunk in data.chunks(MAX_FRAGMENT_LEN) {
        let body = suite
            .protect(*send_seq, ContentType::ApplicationData, chunk)
            .or_alert(AlertDescription::InternalError)?;
        *send_seq += 1;
        records.push(Record::ApplicationData(body));
    }
    trace!("Sealed {} application data records", records.len());
    Ok(records)
}

/// AEAD-protect `data` with `inner_type`, one record per
/// [`MAX_FRAGMENT_LEN`] chunk.
pub(super) fn seal13(
    suite: &Tls13Suite,
    send_seq: &mut u64,
    inner_type: ContentType,
    data: &[u8],
) -> Flow<Vec<Record>> {
    let mut records = Vec::with_capacity(data.len() / MAX_FRAGMENT_LEN + 1);
    for chunk in data.chunks(MAX_FRAGMENT_LEN) {
        let body = suite
            .encrypt(*send_seq, inner_type, chunk)
            .or_alert(AlertDescription::InternalError)?;
        *send_seq += 1;
        records.push(Record::ApplicationData(body));
    }
    Ok(records)
}

/// Decrypt the client's encrypted Finished fragment.
///
/// Returns the handshake message (header and verify_data) and the trailing
/// MAC, which is checked by the Finished handler.
pub(super) fn open_finished12(suite: &Tls12Suite, fragment: &[u8]) -> Flow<(Vec<u8>, Vec<u8>)> {
    let plaintext = suite
        .decrypt(fragment)
        .or_alert(AlertDescription::BadRecordMac)?;

    let verify_len = suite.verify_data_length();
    let message_len = 4 + verify_len;
    if plaintext.len() != message_len + suite.mac_length() {
        return Err(fatal(
            AlertDescription::DecryptError,
            format!("encrypted handshake of {} bytes", plaintext.len()),
        ));
    }

    let length = u32::from_be_bytes([0, plaintext[1], plaintext[2], plaintext[3]]) as usize;
    if plaintext[0] != MessageType::Finished.as_u8() || length != verify_len {
        return Err(fatal(
            AlertDescription::DecryptError,
            format!(
                "encrypted handshake is type {} length {}, expected Finished",
                plaintext[0], length
            ),
        ));
    }

    let (message, mac) = plaintext.split_at(message_len);
    Ok((message.to_vec(), mac.to_vec()))
}
