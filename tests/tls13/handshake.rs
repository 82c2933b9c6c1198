//! TLS 1.3 full handshakes and application data.

use tlsengine::message::{Extension, MessageType, Record};
use tlsengine::{CipherSuite, Config, ContentType, NamedGroup, Output, Protocol, ProtocolVersion};

use crate::common::*;

fn run(suites: Vec<CipherSuite>, groups: Vec<NamedGroup>) -> (tlsengine::Context, Client13) {
    let mut server = server(Config::default());
    let mut client = Client13::new(suites, groups);
    client.handshake(&mut server);
    assert_eq!(server.protocol(), Some(Protocol::Tls13));

    let record = client.seal(b"hello server");
    assert_eq!(
        deliver(&mut server, record),
        Output::Application(b"hello server".to_vec())
    );
    let out = server.encrypt_application_data(b"hello client").unwrap();
    let (inner, data) = client.open(&out.records()[0]);
    assert_eq!(inner, ContentType::ApplicationData);
    assert_eq!(data, b"hello client");

    (server, client)
}

#[test]
fn server_prefers_aes256() {
    let (server, _) = run(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    assert_eq!(
        server.cipher_suite(),
        Some(CipherSuite::TLS13_AES_256_GCM_SHA384)
    );
}

#[test]
fn chacha20_poly1305() {
    let (server, _) = run(
        vec![CipherSuite::TLS13_CHACHA20_POLY1305_SHA256],
        vec![NamedGroup::X25519],
    );
    assert_eq!(
        server.cipher_suite(),
        Some(CipherSuite::TLS13_CHACHA20_POLY1305_SHA256)
    );
}

#[test]
fn aes128_gcm_with_secp256r1() {
    let (server, _) = run(
        vec![CipherSuite::TLS13_AES_128_GCM_SHA256],
        vec![NamedGroup::Secp256r1],
    );
    assert_eq!(
        server.cipher_suite(),
        Some(CipherSuite::TLS13_AES_128_GCM_SHA256)
    );
}

#[test]
fn every_group() {
    for group in [
        NamedGroup::X25519,
        NamedGroup::X448,
        NamedGroup::Secp256r1,
        NamedGroup::Secp384r1,
        NamedGroup::Secp521r1,
    ] {
        let (_, client) = run(vec![CipherSuite::TLS13_AES_128_GCM_SHA256], vec![group]);
        let sh = client.server_hello.unwrap();
        assert_eq!(sh.key_share().unwrap().group, group);
    }
}

#[test]
fn key_share_follows_server_preference() {
    let (_, client) = run(
        ALL_SUITES.to_vec(),
        vec![NamedGroup::Secp256r1, NamedGroup::X25519],
    );
    assert_eq!(
        client.server_hello.unwrap().key_share().unwrap().group,
        NamedGroup::X25519
    );
}

#[test]
fn server_hello_layout() {
    let mut server = server(Config::default());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);

    let records = out.records();
    assert!(matches!(records[0], Record::Handshake(_)));
    assert_eq!(records[1], Record::ChangeCipherSpec);
    assert!(records[2..]
        .iter()
        .all(|r| matches!(r, Record::ApplicationData(_))));

    client.receive_flight(&out);
    let sh = client.server_hello.as_ref().unwrap();
    assert_eq!(sh.server_version, ProtocolVersion::TLS1_2);
    assert_eq!(sh.session_id, client.hello.session_id);
    assert!(!sh.random.has_downgrade_marker());
    assert_eq!(
        client.flight_types(),
        vec![
            MessageType::EncryptedExtensions,
            MessageType::Certificate,
            MessageType::CertificateVerify,
            MessageType::Finished
        ]
    );
}

#[test]
fn tls12_suites_in_hello_are_ignored() {
    let mut suites = ALL_SUITES.to_vec();
    suites.push(CipherSuite::ECDHE_RSA_AES128_CBC_SHA256);
    let (server, _) = run(suites, vec![NamedGroup::X25519]);
    assert!(server.cipher_suite().unwrap().is_tls13());
}

#[test]
fn tls13_disabled_negotiates_tls12() {
    let config = Config::builder().enable_tls13(false).build().unwrap();
    let mut server = server(config);
    let mut suites = ALL_SUITES.to_vec();
    suites.push(CipherSuite::ECDHE_RSA_AES128_CBC_SHA256);
    let mut client = Client13::new(suites, vec![NamedGroup::X25519]);
    let hello = client.client_hello();
    let out = deliver(&mut server, hello);

    assert_eq!(server.protocol(), Some(Protocol::Tls12));
    assert_eq!(
        server.cipher_suite(),
        Some(CipherSuite::ECDHE_RSA_AES128_CBC_SHA256)
    );
    assert_eq!(out.records().len(), 1);
}

#[test]
fn client_change_cipher_spec_is_ignored() {
    let mut server = server(Config::default());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    assert_eq!(deliver(&mut server, Record::ChangeCipherSpec), Output::None);

    let finished = client.finished();
    let record = client.seal_handshake(&[finished]);
    assert_eq!(deliver(&mut server, record), Output::None);
    assert!(server.is_handshake_complete());
}

#[test]
fn large_application_data_is_split() {
    let (mut server, mut client) = run(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);

    let data: Vec<u8> = (0..50_000u32).map(|i| i as u8).collect();
    let out = server.encrypt_application_data(&data).unwrap();
    let records = out.records();
    assert_eq!(records.len(), 4);

    let mut received = Vec::new();
    for record in records {
        received.extend(client.open(record).1);
    }
    assert_eq!(received, data);
}

#[test]
fn session_info_for_tls13() {
    let config = Config::builder().session_info(true).build().unwrap();
    let mut server = server(config);
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519])
        .with_extension(Extension::ServerName(vec!["localhost".into()]));
    client.handshake(&mut server);

    let info = server.session_info().unwrap();
    let ch = info.get("ClientHello").unwrap();
    assert_eq!(ch.get("Extensions/ServerName").unwrap(), "localhost");
    assert_eq!(ch.get("Extensions/KeyShare").unwrap(), "X25519");
    assert!(info.get("ServerHello").is_some());
    assert!(info.get("Server CertificateVerify").is_some());
}
