//! TLS 1.3 client certificate authentication.

use tlsengine::message::{CertificateRequest, Extension, MessageType};
use tlsengine::{AlertDescription, Config, NamedGroup, Output, SignatureScheme};

use crate::common::*;

fn after_server_flight(config: Config) -> (tlsengine::Context, Client13) {
    let mut server = server(config);
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);
    (server, client)
}

#[test]
fn ecdsa_client_certificate() {
    let (mut server, mut client) = after_server_flight(client_auth_config());
    assert_eq!(
        client.flight_types(),
        vec![
            MessageType::EncryptedExtensions,
            MessageType::CertificateRequest,
            MessageType::Certificate,
            MessageType::CertificateVerify,
            MessageType::Finished
        ]
    );

    let Some(CertificateRequest::Tls13 {
        context,
        extensions,
    }) = &client.certificate_request
    else {
        panic!("expected a TLS 1.3 CertificateRequest");
    };
    assert!(context.is_empty());
    let Some(Extension::SignatureAlgorithms(schemes)) = extensions.first() else {
        panic!("expected signature_algorithms");
    };
    assert!(schemes.contains(&SignatureScheme::ECDSA_SECP256R1_SHA256));

    let certificate = client.certificate(&CLIENT_KEY);
    let certificate_verify = client.certificate_verify(&CLIENT_KEY);
    let finished = client.finished();
    let record = client.seal_handshake(&[certificate, certificate_verify, finished]);
    assert_eq!(deliver(&mut server, record), Output::None);
    client.activate_application_keys();

    assert!(server.is_handshake_complete());
    assert_eq!(
        server.client_certificates().unwrap(),
        &[CLIENT_KEY.certificate.clone()][..]
    );

    let record = client.seal(b"authenticated");
    assert_eq!(
        deliver(&mut server, record),
        Output::Application(b"authenticated".to_vec())
    );
}

#[test]
fn messages_in_separate_records() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    let certificate = client.certificate(&CLIENT_KEY);
    let record = client.seal_handshake(&[certificate]);
    assert_eq!(deliver(&mut server, record), Output::None);

    let certificate_verify = client.certificate_verify(&CLIENT_KEY);
    let record = client.seal_handshake(&[certificate_verify]);
    assert_eq!(deliver(&mut server, record), Output::None);

    let finished = client.finished();
    let record = client.seal_handshake(&[finished]);
    assert_eq!(deliver(&mut server, record), Output::None);
    assert!(server.is_handshake_complete());
}

#[test]
fn finished_without_certificate() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    let finished = client.finished();
    let record = client.seal_handshake(&[finished]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::CertificateRequired);
    assert!(server.is_terminated());
}

#[test]
fn empty_certificate() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    let empty = tlsengine::message::Handshake::new(tlsengine::message::Body::Certificate(
        tlsengine::message::Certificate::new_tls13(Vec::new(), Vec::new()),
    ));
    let record = client.seal_handshake(&[empty]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::CertificateRequired);
}

#[test]
fn certificate_without_certificate_verify() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    let certificate = client.certificate(&CLIENT_KEY);
    let finished = client.finished();
    let record = client.seal_handshake(&[certificate, finished]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}

#[test]
fn certificate_verify_over_wrong_transcript() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    let certificate = client.certificate(&CLIENT_KEY);
    client.transcript.push(0);
    let certificate_verify = client.certificate_verify(&CLIENT_KEY);
    let record = client.seal_handshake(&[certificate, certificate_verify]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::BadCertificate);
}

#[test]
fn certificate_rejected_by_validator() {
    let config = Config::builder()
        .require_client_certificate(true)
        .client_cert_verifier(|_: &[Vec<u8>]| false)
        .build()
        .unwrap();
    let (mut server, mut client) = after_server_flight(config);

    let certificate = client.certificate(&CLIENT_KEY);
    let record = client.seal_handshake(&[certificate]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::BadCertificate);
}

#[test]
fn certificate_swapped_after_verify() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    // CertificateVerify proves CLIENT_KEY, then a different chain follows.
    let certificate = client.certificate(&CLIENT_KEY);
    let certificate_verify = client.certificate_verify(&CLIENT_KEY);
    let swapped = client.certificate(&OTHER_CLIENT_KEY);
    let finished = client.finished();
    let record = client.seal_handshake(&[certificate, certificate_verify, swapped, finished]);
    let out = deliver(&mut server, record);

    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
    assert!(out.is_fatal());
    assert!(server.is_terminated());
    assert!(!server.is_handshake_complete());
    assert_eq!(
        server.client_certificates().unwrap(),
        &[CLIENT_KEY.certificate.clone()][..]
    );
}

#[test]
fn repeated_certificate_verify() {
    let (mut server, mut client) = after_server_flight(client_auth_config());

    let certificate = client.certificate(&CLIENT_KEY);
    let first = client.certificate_verify(&CLIENT_KEY);
    let record = client.seal_handshake(&[certificate, first]);
    assert_eq!(deliver(&mut server, record), Output::None);

    let second = client.certificate_verify(&CLIENT_KEY);
    let record = client.seal_handshake(&[second]);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}
