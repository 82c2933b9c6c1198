//! TLS 1.3 failure paths and protocol violations.

use tlsengine::message::{Body, Finished, Handshake, Record};
use tlsengine::{Alert, AlertDescription, Config, ContentType, Error, NamedGroup, Output, State};

use crate::common::*;

fn after_server_flight() -> (tlsengine::Context, Client13) {
    let mut server = server(Config::default());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);
    (server, client)
}

#[test]
fn wrong_client_finished() {
    let (mut server, mut client) = after_server_flight();

    let finished = Handshake::new(Body::Finished(Finished::new(vec![0; 48])));
    let record = client.seal_handshake(&[finished]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::DecryptError);
    assert!(out.is_fatal());
    assert!(!server.is_handshake_complete());
}

#[test]
fn tampered_record() {
    let (mut server, mut client) = after_server_flight();

    let finished = client.finished();
    let Record::ApplicationData(mut body) = client.seal_handshake(&[finished]) else {
        unreachable!()
    };
    body[3] ^= 0x80;
    let out = deliver(&mut server, Record::ApplicationData(body));
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
}

#[test]
fn application_data_before_client_finished() {
    let (mut server, mut client) = after_server_flight();

    let record = client.seal(b"too early");
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}

#[test]
fn encrypt_before_handshake_complete() {
    let (mut server, _) = after_server_flight();
    assert!(matches!(
        server.encrypt_application_data(b"too early"),
        Err(Error::UnsupportedOperation(_))
    ));
}

#[test]
fn plaintext_handshake_after_hello() {
    let (mut server, client) = after_server_flight();

    let hello = Handshake::new(Body::ClientHello(client.hello.clone()));
    let out = deliver(&mut server, Record::handshake([hello]));
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}

#[test]
fn change_cipher_spec_after_handshake() {
    let mut server = server(Config::default());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    client.handshake(&mut server);

    let out = deliver(&mut server, Record::ChangeCipherSpec);
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}

#[test]
fn protected_close_notify() {
    let mut server = server(Config::default());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    client.handshake(&mut server);

    let mut alert = Vec::new();
    Alert::warning(AlertDescription::CloseNotify).serialize(&mut alert);
    let record = client.seal_as(ContentType::Alert, &alert);
    let out = deliver(&mut server, record);

    assert_eq!(alert_of(&out), AlertDescription::CloseNotify);
    assert!(!out.is_fatal());
    assert!(server.is_terminated());
    assert_eq!(server.state(), State::ServerFinished);
}

#[test]
fn protected_fatal_alert() {
    let (mut server, mut client) = after_server_flight();

    let mut alert = Vec::new();
    Alert::fatal(AlertDescription::BadCertificate).serialize(&mut alert);
    let record = client.seal_as(ContentType::Alert, &alert);
    let out = deliver(&mut server, record);

    assert!(out.is_fatal());
    assert!(server.is_terminated());
}

#[test]
fn no_common_tls13_suite_falls_back() {
    let mut server = server(Config::default());
    let mut client = Client13::new(
        vec![tlsengine::CipherSuite::RSA_AES128_CBC_SHA256],
        vec![NamedGroup::X25519],
    );
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);

    assert_eq!(server.protocol(), Some(tlsengine::Protocol::Tls12));
    assert!(!out.is_fatal());
}

#[test]
fn missing_key_share_falls_back() {
    let mut server = server(Config::default());
    let mut client = Client13::new(
        vec![
            tlsengine::CipherSuite::TLS13_AES_128_GCM_SHA256,
            tlsengine::CipherSuite::RSA_AES128_CBC_SHA256,
        ],
        vec![],
    );
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);

    assert_eq!(server.protocol(), Some(tlsengine::Protocol::Tls12));
    assert_eq!(
        server.cipher_suite(),
        Some(tlsengine::CipherSuite::RSA_AES128_CBC_SHA256)
    );
    assert!(!out.is_fatal());
}
