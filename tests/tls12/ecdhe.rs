//! TLS 1.2 handshakes with ephemeral ECDH key exchange.

use tlsengine::message::{Extension, ExtensionType, MessageType};
use tlsengine::{CipherSuite, Config, NamedGroup, Output, SignatureScheme};

use crate::common::*;

fn run(suite: CipherSuite, groups: Vec<NamedGroup>) -> Client12 {
    let mut server = server(Config::default());
    let mut client = Client12::ecdhe(vec![suite], groups);
    client.handshake(&mut server);
    assert_eq!(server.cipher_suite(), Some(suite));

    let record = client.seal(b"ping");
    assert_eq!(deliver(&mut server, record), Output::Application(b"ping".to_vec()));
    let out = server.encrypt_application_data(b"pong").unwrap();
    assert_eq!(client.open(&out.records()[0]), b"pong");
    client
}

#[test]
fn x25519_handshake() {
    let client = run(CipherSuite::ECDHE_RSA_AES128_CBC_SHA256, vec![NamedGroup::X25519]);
    let ske = client.server_key_exchange.unwrap();
    assert_eq!(ske.named_group, NamedGroup::X25519);
    assert_eq!(ske.public_key.len(), 32);
}

#[test]
fn secp256r1_handshake() {
    let client = run(CipherSuite::ECDHE_RSA_AES128_CBC_SHA, vec![NamedGroup::Secp256r1]);
    let ske = client.server_key_exchange.unwrap();
    assert_eq!(ske.named_group, NamedGroup::Secp256r1);
    // uncompressed point
    assert_eq!(ske.public_key[0], 0x04);
}

#[test]
fn secp384r1_handshake() {
    let client = run(
        CipherSuite::ECDHE_RSA_AES128_CBC_SHA256,
        vec![NamedGroup::Secp384r1],
    );
    assert_eq!(
        client.server_key_exchange.unwrap().named_group,
        NamedGroup::Secp384r1
    );
}

#[test]
fn server_prefers_x25519() {
    let client = run(
        CipherSuite::ECDHE_RSA_AES128_CBC_SHA256,
        vec![NamedGroup::Secp256r1, NamedGroup::X25519],
    );
    assert_eq!(
        client.server_key_exchange.unwrap().named_group,
        NamedGroup::X25519
    );
}

#[test]
fn signature_limited_to_client_offer() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::ECDHE_RSA_AES128_CBC_SHA256])
        .with_extension(Extension::SupportedGroups(vec![NamedGroup::X25519]))
        .with_extension(Extension::SignatureAlgorithms(vec![
            SignatureScheme::RSA_PKCS1_SHA384,
        ]));
    client.handshake(&mut server);
    assert_eq!(
        client.server_key_exchange.unwrap().signed.scheme,
        SignatureScheme::RSA_PKCS1_SHA384
    );
}

#[test]
fn ecdhe_flight_and_point_formats() {
    let mut server = server(Config::default());
    let mut client = Client12::ecdhe(
        vec![CipherSuite::ECDHE_RSA_AES128_CBC_SHA256],
        vec![NamedGroup::X25519],
    );
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    assert_eq!(
        handshake_types(&flight),
        vec![
            MessageType::ServerHello,
            MessageType::Certificate,
            MessageType::ServerKeyExchange,
            MessageType::ServerHelloDone
        ]
    );

    client.receive_flight(&flight);
    let sh = client.server_hello.unwrap();
    assert!(sh
        .extensions
        .iter()
        .any(|e| e.extension_type() == ExtensionType::EcPointFormats));
}

#[test]
fn ecdhe_preferred_over_rsa() {
    let mut server = server(Config::default());
    let mut client = Client12::ecdhe(
        vec![
            CipherSuite::RSA_AES128_CBC_SHA256,
            CipherSuite::ECDHE_RSA_AES128_CBC_SHA,
        ],
        vec![NamedGroup::Secp256r1],
    );
    client.handshake(&mut server);
    assert_eq!(
        server.cipher_suite(),
        Some(CipherSuite::ECDHE_RSA_AES128_CBC_SHA)
    );
}

#[test]
fn ecdhe_without_shared_curve_falls_back_to_rsa() {
    let mut server = server(Config::default());
    let mut client = Client12::ecdhe(
        vec![
            CipherSuite::ECDHE_RSA_AES128_CBC_SHA256,
            CipherSuite::RSA_AES128_CBC_SHA256,
        ],
        vec![NamedGroup::Unknown(0x0042)],
    );
    client.handshake(&mut server);
    assert_eq!(
        server.cipher_suite(),
        Some(CipherSuite::RSA_AES128_CBC_SHA256)
    );
}

#[test]
fn invalid_client_point_is_handshake_failure() {
    let mut server = server(Config::default());
    let mut client = Client12::ecdhe(
        vec![CipherSuite::ECDHE_RSA_AES128_CBC_SHA256],
        vec![NamedGroup::Secp256r1],
    );
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    // Not a point on the curve.
    let mut point = vec![0x04];
    point.extend([0xff; 64]);
    let cke = tlsengine::message::Handshake::new(tlsengine::message::Body::ClientKeyExchange(
        tlsengine::message::ClientKeyExchange::ecdhe(&point),
    ));
    let record = client.send(vec![cke]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), tlsengine::AlertDescription::HandshakeFailure);
    assert!(server.is_terminated());
}
