use thiserror::Error;

/// Faults raised by the engine.
///
/// These are programming or configuration errors. Protocol failures that must
/// be reported to the peer are never an `Error`; they surface as
/// [`Output::Alert`](crate::Output::Alert) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is inconsistent, e.g. client certificates are
    /// required but no verifier was installed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The server identity could not be loaded or uses an unsupported key.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// [`Context::initialize`](crate::Context::initialize) was called twice.
    #[error("Context is already initialized")]
    AlreadyInitialized,

    /// A record was handed to the context before negotiation.
    #[error("Context is not initialized")]
    NotInitialized,

    /// A fatal alert was produced earlier. The connection must be closed.
    #[error("Session is terminated")]
    SessionTerminated,

    /// The operation is not valid for the negotiated protocol version.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A crypto provider operation failed outside of the handshake.
    #[error("Crypto error: {0}")]
    CryptoError(String),

    /// An internal invariant did not hold.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
