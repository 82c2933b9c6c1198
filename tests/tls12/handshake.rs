//! TLS 1.2 handshakes with RSA key transport.

use tlsengine::message::{MessageType, Record};
use tlsengine::{CipherSuite, Config, Output, Protocol, State};

use crate::common::*;

#[test]
fn rsa_handshake_and_application_data() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);

    client.handshake(&mut server);
    assert_eq!(server.protocol(), Some(Protocol::Tls12));
    assert_eq!(server.cipher_suite(), Some(CipherSuite::RSA_AES128_CBC_SHA256));

    let record = client.seal(b"GET / HTTP/1.1\r\n\r\n");
    assert_eq!(
        deliver(&mut server, record),
        Output::Application(b"GET / HTTP/1.1\r\n\r\n".to_vec())
    );

    let out = server
        .encrypt_application_data(b"HTTP/1.1 200 OK\r\n\r\n")
        .expect("encrypt");
    let records = out.records();
    assert_eq!(records.len(), 1);
    assert_eq!(client.open(&records[0]), b"HTTP/1.1 200 OK\r\n\r\n");
}

#[test]
fn sha1_suite_handshake() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA]);

    client.handshake(&mut server);
    assert_eq!(server.cipher_suite(), Some(CipherSuite::RSA_AES128_CBC_SHA));

    // Several records in each direction keep sequence numbers aligned.
    for i in 0..3u8 {
        let record = client.seal(&[i; 10]);
        assert_eq!(deliver(&mut server, record), Output::Application(vec![i; 10]));
        let out = server.encrypt_application_data(&[i; 20]).expect("encrypt");
        assert_eq!(client.open(&out.records()[0]), vec![i; 20]);
    }
}

#[test]
fn rsa_flight_has_no_key_exchange() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);

    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    assert_eq!(
        handshake_types(&flight),
        vec![
            MessageType::ServerHello,
            MessageType::Certificate,
            MessageType::ServerHelloDone
        ]
    );
}

#[test]
fn large_application_data_is_split() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    let data = vec![0x5a; 40_000];
    let out = server.encrypt_application_data(&data).expect("encrypt");
    let records = out.records();
    assert_eq!(records.len(), 3);

    let mut received = Vec::new();
    for record in records {
        received.extend(client.open(record));
    }
    assert_eq!(received, data);
}

#[test]
fn empty_application_data_sends_nothing() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    assert_eq!(server.encrypt_application_data(&[]).unwrap(), Output::None);
}

#[test]
fn downgrade_marker_when_tls13_enabled() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    let random = client.server_hello.as_ref().unwrap().random;
    assert!(random.has_downgrade_marker());
}

#[test]
fn no_downgrade_marker_without_tls13() {
    let config = Config::builder().enable_tls13(false).build().unwrap();
    let mut server = server(config);
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    let random = client.server_hello.as_ref().unwrap().random;
    assert!(!random.has_downgrade_marker());
}

#[test]
fn session_info_records_messages() {
    let config = Config::builder().session_info(true).build().unwrap();
    let mut server = server(config);
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    let info = server.session_info().expect("session");
    assert!(info.get("ClientHello").is_some());
    assert_eq!(
        info.get("ServerHello").unwrap().get("CipherSuite").unwrap(),
        "RSA_AES128_CBC_SHA256"
    );
    assert_eq!(
        info.get("Server Certificate").unwrap().get("Subject").unwrap(),
        "CN=localhost"
    );
    assert!(info.get("ClientKeyExchange").is_some());
}

#[test]
fn session_info_disabled_by_default() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    assert!(server.session_info().unwrap().is_empty());
}

#[test]
fn close_notify_after_handshake() {
    let mut server = server(Config::default());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    client.handshake(&mut server);

    let out = deliver(
        &mut server,
        Record::Alert(tlsengine::Alert::warning(
            tlsengine::AlertDescription::CloseNotify,
        )),
    );
    assert!(!out.is_fatal());
    assert_eq!(alert_of(&out), tlsengine::AlertDescription::CloseNotify);
    assert!(server.is_terminated());
    assert_eq!(server.state(), State::ServerFinished);
}
