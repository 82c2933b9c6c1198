//! TLS 1.2 failure paths and protocol violations.

use tlsengine::message::{Extension, Fragment, Record};
use tlsengine::{
    Alert, AlertDescription, CipherSuite, Config, Error, Output, ProtocolVersion, State,
};

use crate::common::*;

/// Run up to (and including) the client ChangeCipherSpec.
fn until_finished(server: &mut tlsengine::Context, client: &mut Client12) {
    let hello = client.client_hello();
    let flight = deliver(server, hello);
    client.receive_flight(&flight);
    let cke = client.client_key_exchange();
    let record = client.send(vec![cke]);
    assert_eq!(deliver(server, record), Output::None);
    assert_eq!(deliver(server, Record::ChangeCipherSpec), Output::None);
}

fn flip(record: Record, index: usize) -> Record {
    let Record::Handshake(mut fragments) = record else {
        panic!("expected handshake record");
    };
    let Some(Fragment::Encrypted(data)) = fragments.first_mut() else {
        panic!("expected encrypted fragment");
    };
    data[index] ^= 0x01;
    Record::Handshake(fragments)
}

#[test]
fn wrong_verify_data() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    until_finished(&mut server, &mut client);

    let finished = client.finished_with(vec![0; 12]);
    let out = deliver(&mut server, finished);
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
    assert!(out.is_fatal());
    assert!(server.is_terminated());
    assert!(!server.is_handshake_complete());
}

#[test]
fn tampered_verify_data() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    until_finished(&mut server, &mut client);

    // The IV xors into the first plaintext block: byte 4 is verify_data[0].
    let finished = flip(client.finished(), 4);
    let out = deliver(&mut server, finished);
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
}

#[test]
fn tampered_message_type() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    until_finished(&mut server, &mut client);

    let finished = flip(client.finished(), 0);
    let out = deliver(&mut server, finished);
    assert_eq!(alert_of(&out), AlertDescription::DecryptError);
}

#[test]
fn truncated_finished_ciphertext() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    until_finished(&mut server, &mut client);

    let Record::Handshake(mut fragments) = client.finished() else {
        unreachable!()
    };
    let Some(Fragment::Encrypted(data)) = fragments.first_mut() else {
        unreachable!()
    };
    data.truncate(20);
    let out = deliver(&mut server, Record::Handshake(fragments));
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
}

#[test]
fn unusable_pre_master_secret_fails_at_finished() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);

    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    // Keys come from a good secret, but the server gets one whose version
    // bytes do not match the ClientHello.
    let _ = client.client_key_exchange();
    let mut pms = vec![0x03, 0x01];
    pms.extend([7u8; 46]);
    let encrypted = client.encrypt_to_server(&pms);
    let bogus = tlsengine::message::Handshake::new(tlsengine::message::Body::ClientKeyExchange(
        tlsengine::message::ClientKeyExchange::rsa(&encrypted),
    ));
    let record = client.send(vec![bogus]);

    // No early alert: the server keeps going with random key material.
    assert_eq!(deliver(&mut server, record), Output::None);
    assert_eq!(deliver(&mut server, Record::ChangeCipherSpec), Output::None);

    let finished = client.finished();
    let out = deliver(&mut server, finished);
    assert!(out.is_fatal());
    assert!(matches!(
        alert_of(&out),
        AlertDescription::BadRecordMac | AlertDescription::DecryptError
    ));
}

#[test]
fn application_data_before_handshake_complete() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    deliver(&mut server, hello);

    let out = deliver(&mut server, Record::ApplicationData(vec![0; 48]));
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}

#[test]
fn encrypt_before_handshake_complete() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    deliver(&mut server, hello);

    assert!(matches!(
        server.encrypt_application_data(b"early"),
        Err(Error::UnsupportedOperation(_))
    ));
    assert!(!server.is_terminated());
}

#[test]
fn change_cipher_spec_before_key_exchange() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    deliver(&mut server, hello);

    let out = deliver(&mut server, Record::ChangeCipherSpec);
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
    assert_eq!(server.state(), State::ServerHelloDone);
}

#[test]
fn terminated_session_rejects_records() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    deliver(&mut server, hello);
    deliver(&mut server, Record::ChangeCipherSpec);

    assert!(matches!(
        server.handle_record(Record::ChangeCipherSpec),
        Err(Error::SessionTerminated)
    ));
    assert!(matches!(
        server.encrypt_application_data(b"late"),
        Err(Error::SessionTerminated)
    ));
}

#[test]
fn peer_fatal_alert() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    deliver(&mut server, hello);

    let out = deliver(
        &mut server,
        Record::Alert(Alert::fatal(AlertDescription::HandshakeFailure)),
    );
    assert!(out.is_fatal());
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
    assert!(server.is_terminated());
}

#[test]
fn peer_warning_alert_is_reported() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    deliver(&mut server, hello);

    let out = deliver(
        &mut server,
        Record::Alert(Alert::warning(AlertDescription::UserCanceled)),
    );
    assert!(!out.is_fatal());
    assert!(!server.is_terminated());
}

#[test]
fn no_shared_cipher_suite() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::Unknown(0x0005)]);
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);
    assert_eq!(alert_of(&out), AlertDescription::HandshakeFailure);
    assert!(server.is_terminated());
}

#[test]
fn tls11_client_rejected() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA]);
    client.hello.client_version = ProtocolVersion::TLS1_1;
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);
    assert_eq!(alert_of(&out), AlertDescription::ProtocolVersion);
}

#[test]
fn server_name_required_but_missing() {
    let config = Config::builder().require_server_name(true).build().unwrap();
    let mut server = server(config);
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);
    assert_eq!(alert_of(&out), AlertDescription::MissingExtension);
}

#[test]
fn server_name_does_not_match() {
    let config = Config::builder().require_server_name(true).build().unwrap();
    let mut server = server(config);
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256])
        .with_extension(Extension::ServerName(vec!["example.org".into()]));
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);
    assert_eq!(alert_of(&out), AlertDescription::UnrecognizedName);
}

#[test]
fn server_name_matches() {
    let config = Config::builder().require_server_name(true).build().unwrap();
    let mut server = server(config);
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256])
        .with_extension(Extension::ServerName(vec!["localhost".into()]));
    client.handshake(&mut server);
}

#[test]
fn renegotiation_info_is_echoed() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![
        CipherSuite::RSA_AES128_CBC_SHA256,
        CipherSuite::EMPTY_RENEGOTIATION_INFO_SCSV,
    ]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    let sh = client.server_hello.unwrap();
    assert!(sh
        .extensions
        .contains(&Extension::RenegotiationInfo(Vec::new())));
}

#[test]
fn tampered_application_data_mac() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    let record = client.seal(b"first");
    assert_eq!(
        deliver(&mut server, record),
        Output::Application(b"first".to_vec())
    );

    // IV | payload (2 blocks) | MAC (2 blocks) | padding. Flipping the first
    // byte of the block before the MAC tail only disturbs MAC bytes.
    let Record::ApplicationData(mut body) = client.seal(&[7; 32]) else {
        unreachable!()
    };
    assert_eq!(body.len(), 16 + 80);
    body[48] ^= 0x01;
    let out = deliver(&mut server, Record::ApplicationData(body));

    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
    assert!(out.is_fatal());
    assert!(server.is_terminated());
}

#[test]
fn replayed_application_data() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    let record = client.seal(b"once");
    assert_eq!(
        deliver(&mut server, record.clone()),
        Output::Application(b"once".to_vec())
    );

    // The receive sequence moved on, so the same bytes no longer verify.
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
}

#[test]
fn client_hello_altered_in_transit() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256])
        .with_extension(Extension::ServerName(vec!["localhost".into()]));

    // The client hashes its own hello; the server sees one byte changed in
    // the server name, which leaves both randoms and the key block intact.
    let mut bytes = client.client_hello().to_bytes();
    let at = bytes
        .windows(9)
        .position(|w| w == b"localhost")
        .expect("server name on the wire");
    bytes[at + 8] ^= 0x01;
    let (_, altered) = server.parse_record(&bytes).expect("parse record");
    let flight = server.handle_record(altered).expect("handle record");
    client.receive_flight(&flight);

    let cke = client.client_key_exchange();
    let record = client.send(vec![cke]);
    assert_eq!(deliver(&mut server, record), Output::None);
    assert_eq!(deliver(&mut server, Record::ChangeCipherSpec), Output::None);

    let finished = client.finished();
    let out = deliver(&mut server, finished);
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
    assert!(!server.is_handshake_complete());
}

#[test]
fn client_key_exchange_altered_in_transit() {
    let mut server = server(Config::default());
    let mut client = Client12::ecdhe(
        vec![CipherSuite::ECDHE_RSA_AES128_CBC_SHA256],
        vec![tlsengine::NamedGroup::Secp256r1],
    );

    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    // Swap in a different valid point: the server derives other keys and
    // hashes other bytes than the client did.
    let cke = client.client_key_exchange();
    let _ = client.send(vec![cke]);
    let mut other = Client12::ecdhe(
        vec![CipherSuite::ECDHE_RSA_AES128_CBC_SHA256],
        vec![tlsengine::NamedGroup::Secp256r1],
    );
    other.hello = client.hello.clone();
    other.receive_flight(&flight);
    let substitute = other.client_key_exchange();
    assert_eq!(
        deliver(&mut server, Record::handshake([substitute])),
        Output::None
    );
    assert_eq!(deliver(&mut server, Record::ChangeCipherSpec), Output::None);

    let finished = client.finished();
    let out = deliver(&mut server, finished);
    assert!(out.is_fatal());
    assert!(matches!(
        alert_of(&out),
        AlertDescription::BadRecordMac | AlertDescription::DecryptError
    ));
}
