//! Every client message is refused outside the one state that accepts it.

use tlsengine::message::{Body, ClientKeyExchange, Finished, Handshake, Record};
use tlsengine::{AlertDescription, CipherSuite, Context, Output, State};

use crate::common::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Message {
    ClientHello,
    Certificate,
    CertificateVerify,
    ClientKeyExchange,
    ChangeCipherSpec,
    Finished,
    ApplicationData,
}

const MESSAGES: [Message; 7] = [
    Message::ClientHello,
    Message::Certificate,
    Message::CertificateVerify,
    Message::ClientKeyExchange,
    Message::ChangeCipherSpec,
    Message::Finished,
    Message::ApplicationData,
];

/// States in which the server waits for the client.
const STATES: [State; 5] = [
    State::None,
    State::ServerHelloDone,
    State::ClientKeyExchange,
    State::ClientChangeCipherSpec,
    State::ServerFinished,
];

/// Plaintext Finished is never accepted, so it has no entry.
fn accepted(state: State, message: Message) -> bool {
    matches!(
        (state, message),
        (State::None, Message::ClientHello)
            | (State::ServerHelloDone, Message::Certificate)
            | (State::ServerHelloDone, Message::ClientKeyExchange)
            | (State::ClientKeyExchange, Message::CertificateVerify)
            | (State::ClientKeyExchange, Message::ChangeCipherSpec)
            | (State::ServerFinished, Message::ApplicationData)
    )
}

fn record(message: Message, client: &Client12) -> Record {
    let handshake = |body| Record::handshake([Handshake::new(body)]);
    match message {
        Message::ClientHello => handshake(Body::ClientHello(client.hello.clone())),
        Message::Certificate => Record::handshake([client.certificate(&CLIENT_KEY)]),
        Message::CertificateVerify => Record::handshake([client.certificate_verify(&CLIENT_KEY)]),
        Message::ClientKeyExchange => {
            handshake(Body::ClientKeyExchange(ClientKeyExchange::rsa(&[0; 256])))
        }
        Message::ChangeCipherSpec => Record::ChangeCipherSpec,
        Message::Finished => handshake(Body::Finished(Finished::new(vec![0; 12]))),
        Message::ApplicationData => Record::ApplicationData(vec![0; 48]),
    }
}

/// Drive a client-authenticating handshake up to `state`.
fn drive(state: State) -> (Context, Client12) {
    let mut server = server(client_auth_config());
    let mut client = Client12::new(vec![CipherSuite::RSA_AES128_CBC_SHA256]);
    if state == State::None {
        return (server, client);
    }

    let hello = client.client_hello();
    let flight = deliver(&mut server, hello);
    client.receive_flight(&flight);
    if state == State::ServerHelloDone {
        return (server, client);
    }

    let certificate = client.certificate(&CLIENT_KEY);
    let cke = client.client_key_exchange();
    let record = client.send(vec![certificate, cke]);
    assert_eq!(deliver(&mut server, record), Output::None);
    if state == State::ClientKeyExchange {
        return (server, client);
    }

    let cv = client.certificate_verify(&CLIENT_KEY);
    let record = client.send(vec![cv]);
    assert_eq!(deliver(&mut server, record), Output::None);
    assert_eq!(deliver(&mut server, Record::ChangeCipherSpec), Output::None);
    if state == State::ClientChangeCipherSpec {
        return (server, client);
    }

    let finished = client.finished();
    let out = deliver(&mut server, finished);
    client.receive_finished(&out);
    (server, client)
}

#[test]
fn messages_outside_their_state() {
    for state in STATES {
        for message in MESSAGES {
            if accepted(state, message) {
                continue;
            }
            let (mut server, client) = drive(state);
            assert_eq!(server.state(), state);

            // Records go straight in so plaintext stays plaintext.
            let out = server
                .handle_record(record(message, &client))
                .expect("handle record");
            assert_eq!(
                alert_of(&out),
                AlertDescription::UnexpectedMessage,
                "{:?} in {:?}",
                message,
                state
            );
            assert!(out.is_fatal(), "{:?} in {:?}", message, state);
            assert!(server.is_terminated(), "{:?} in {:?}", message, state);
        }
    }
}
