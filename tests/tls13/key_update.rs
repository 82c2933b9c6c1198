//! TLS 1.3 KeyUpdate in both directions.

use tlsengine::message::KeyUpdateRequest;
use tlsengine::{AlertDescription, Config, NamedGroup, Output};

use crate::common::*;

fn established() -> (tlsengine::Context, Client13) {
    let mut server = server(Config::builder().session_info(true).build().unwrap());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    client.handshake(&mut server);
    (server, client)
}

#[test]
fn update_not_requested() {
    let (mut server, mut client) = established();

    let record = client.key_update(false);
    assert_eq!(deliver(&mut server, record), Output::None);

    // Client data under the new key.
    let record = client.seal(b"after update");
    assert_eq!(
        deliver(&mut server, record),
        Output::Application(b"after update".to_vec())
    );

    // Server keys did not move.
    let out = server.encrypt_application_data(b"unchanged").unwrap();
    assert_eq!(client.open(&out.records()[0]).1, b"unchanged");
}

#[test]
fn update_requested() {
    let (mut server, mut client) = established();

    // Sequence numbers are non-zero before the update.
    let out = server.encrypt_application_data(b"one").unwrap();
    assert_eq!(client.open(&out.records()[0]).1, b"one");

    let record = client.key_update(true);
    let out = deliver(&mut server, record);
    let records = out.records();
    assert_eq!(records.len(), 1);

    let reply = client.receive_key_update(&records[0]);
    assert_eq!(reply.request_update, KeyUpdateRequest::UpdateNotRequested);

    let out = server.encrypt_application_data(b"two").unwrap();
    assert_eq!(client.open(&out.records()[0]).1, b"two");

    let record = client.seal(b"three");
    assert_eq!(
        deliver(&mut server, record),
        Output::Application(b"three".to_vec())
    );
}

#[test]
fn repeated_updates() {
    let (mut server, mut client) = established();

    for i in 0..5u8 {
        let record = client.key_update(i % 2 == 0);
        let out = deliver(&mut server, record);
        if i % 2 == 0 {
            client.receive_key_update(&out.records()[0]);
        } else {
            assert_eq!(out, Output::None);
        }

        let record = client.seal(&[i]);
        assert_eq!(deliver(&mut server, record), Output::Application(vec![i]));
        let out = server.encrypt_application_data(&[i, i]).unwrap();
        assert_eq!(client.open(&out.records()[0]).1, vec![i, i]);
    }
}

#[test]
fn key_update_is_recorded_outside_transcript() {
    let (mut server, mut client) = established();

    let record = client.key_update(true);
    deliver(&mut server, record);

    let info = server.session_info().unwrap();
    assert_eq!(
        info.get("Client KeyUpdate")
            .unwrap()
            .get("UpdateRequested")
            .unwrap(),
        "true"
    );
}

#[test]
fn key_update_during_handshake() {
    let mut server = server(Config::default());
    let mut client = Client13::new(ALL_SUITES.to_vec(), vec![NamedGroup::X25519]);
    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);

    let record = client.key_update(false);
    let out = deliver(&mut server, record);
    assert_eq!(alert_of(&out), AlertDescription::UnexpectedMessage);
}

#[test]
fn garbage_after_update() {
    let (mut server, mut client) = established();

    let record = client.key_update(false);
    assert_eq!(deliver(&mut server, record), Output::None);

    let out = deliver(
        &mut server,
        tlsengine::message::Record::ApplicationData(vec![0; 40]),
    );
    assert_eq!(alert_of(&out), AlertDescription::BadRecordMac);
    assert!(server.is_terminated());
}
