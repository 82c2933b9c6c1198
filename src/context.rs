use std::sync::Arc;

use crate::alert::AlertDescription;
use crate::certificate::ServerIdentity;
use crate::message::{Body, Fragment, Record};
use crate::negotiation::{negotiate, Negotiation, Protocol};
use crate::output::Output;
use crate::session::{Session, SessionInfo, State};
use crate::types::CipherSuite;
use crate::{Config, Error};

/// One server-side TLS connection.
///
/// The first record must carry the ClientHello. It decides the protocol
/// version and cipher suite once; every record after that goes to the
/// handshake state machine.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use tlsengine::{Config, Context, Output, ServerIdentity};
/// # use tlsengine::message::Record;
/// # fn run(identity: ServerIdentity, wire: &[u8]) -> Result<(), tlsengine::Error> {
/// let config = Arc::new(Config::builder().build()?);
/// let mut ctx = Context::new(config, Arc::new(identity));
///
/// let (_, record) = ctx.parse_record(wire).expect("record");
/// match ctx.handle_record(record)? {
///     Output::Packet(_records) => { /* serialize and send */ }
///     Output::Application(_data) => { /* hand to the upper layer */ }
///     Output::Alert { .. } => { /* send alert, close if fatal */ }
///     Output::None => {}
/// }
/// # Ok(())
/// # }
/// ```
pub struct Context {
    config: Arc<Config>,
    identity: Arc<ServerIdentity>,
    session: Option<Session>,
    /// Negotiation failed with a fatal alert.
    rejected: bool,
}

impl Context {
    pub fn new(config: Arc<Config>, identity: Arc<ServerIdentity>) -> Self {
        Context {
            config,
            identity,
            session: None,
            rejected: false,
        }
    }

    /// Negotiate from the ClientHello in `record` and create the session.
    ///
    /// Returns `Output::None` when a session was created, or a fatal alert
    /// when no parameters are acceptable. The record itself is not
    /// processed; pass it to [`process_record`](Self::process_record) next.
    pub fn initialize(&mut self, record: &Record) -> Result<Output, Error> {
        if self.session.is_some() || self.rejected {
            return Err(Error::AlreadyInitialized);
        }

        let client_hello = match record {
            Record::Handshake(fragments) => fragments.first().and_then(|f| match f {
                Fragment::Plain(h) => match &h.body {
                    Body::ClientHello(ch) => Some(ch),
                    _ => None,
                },
                Fragment::Encrypted(_) => None,
            }),
            _ => None,
        };
        let Some(client_hello) = client_hello else {
            return Ok(self.reject(Output::fatal(
                AlertDescription::UnexpectedMessage,
                format!("expected ClientHello, got {:?} record", record.content_type()),
            )));
        };

        match negotiate(client_hello, self.identity.key_algorithm(), &self.config)? {
            Negotiation::Accepted(params) => {
                let session = Session::new(self.config.clone(), self.identity.clone(), params)?;
                self.session = Some(session);
                Ok(Output::None)
            }
            Negotiation::Rejected(alert) => Ok(self.reject(alert)),
        }
    }

    fn reject(&mut self, alert: Output) -> Output {
        if let Output::Alert {
            description,
            message,
            ..
        } = &alert
        {
            warn!("Negotiation failed, {}: {}", description, message);
        }
        self.rejected = true;
        alert
    }

    /// Hand one record to the negotiated session.
    pub fn process_record(&mut self, record: Record) -> Result<Output, Error> {
        if self.rejected {
            return Err(Error::SessionTerminated);
        }
        self.session
            .as_mut()
            .ok_or(Error::NotInitialized)?
            .process_record(record)
    }

    /// Negotiate on the first call, then process.
    pub fn handle_record(&mut self, record: Record) -> Result<Output, Error> {
        if self.session.is_none() && !self.rejected {
            let output = self.initialize(&record)?;
            if output != Output::None {
                return Ok(output);
            }
        }
        self.process_record(record)
    }

    /// Protect `data` as application data records.
    ///
    /// Only valid once the handshake is complete.
    pub fn encrypt_application_data(&mut self, data: &[u8]) -> Result<Output, Error> {
        if self.rejected {
            return Err(Error::SessionTerminated);
        }
        self.session
            .as_mut()
            .ok_or(Error::NotInitialized)?
            .encrypt_application_data(data)
    }

    /// Parse one record from the wire, knowing whether a TLS 1.2 Handshake
    /// record is ciphertext at this point.
    pub fn parse_record<'a>(&self, input: &'a [u8]) -> nom::IResult<&'a [u8], Record> {
        let encrypted = self
            .session
            .as_ref()
            .map(|s| s.expects_encrypted_handshake())
            .unwrap_or(false);
        Record::parse(input, encrypted)
    }

    pub fn state(&self) -> State {
        self.session.as_ref().map(|s| s.state()).unwrap_or(State::None)
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.session.as_ref().map(|s| s.protocol())
    }

    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.session.as_ref().map(|s| s.cipher_suite())
    }

    pub fn is_handshake_complete(&self) -> bool {
        self.state() == State::ServerFinished
    }

    pub fn is_terminated(&self) -> bool {
        self.rejected || self.session.as_ref().is_some_and(|s| s.is_terminated())
    }

    /// Fields of processed handshake messages, when enabled in the config.
    pub fn session_info(&self) -> Option<&SessionInfo> {
        self.session.as_ref().map(|s| s.session_info())
    }

    /// The client certificate chain accepted by the validator.
    pub fn client_certificates(&self) -> Option<&[Vec<u8>]> {
        self.session.as_ref().and_then(|s| s.client_certificates())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
