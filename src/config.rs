use std::fmt;
use std::sync::Arc;

use crate::certificate::ClientCertVerifier;
use crate::crypto::{rust_crypto, CryptoProvider};
use crate::Error;

/// Server configuration.
///
/// Shared read-only between connections, typically behind an `Arc`.
#[derive(Clone)]
pub struct Config {
    require_client_certificate: bool,
    require_server_name: bool,
    enable_tls13: bool,
    session_info: bool,
    client_cert_verifier: Option<Arc<dyn ClientCertVerifier>>,
    crypto_provider: CryptoProvider,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            require_client_certificate: false,
            require_server_name: false,
            enable_tls13: true,
            session_info: false,
            client_cert_verifier: None,
            crypto_provider: None,
        }
    }

    /// Require a client certificate.
    ///
    /// This will cause the server to send a CertificateRequest message.
    /// Makes the server fail if the client does not send a certificate.
    #[inline(always)]
    pub fn require_client_certificate(&self) -> bool {
        self.require_client_certificate
    }

    /// Require the client to send a server_name matching the certificate
    /// subject CN.
    #[inline(always)]
    pub fn require_server_name(&self) -> bool {
        self.require_server_name
    }

    /// Whether TLS 1.3 may be negotiated.
    #[inline(always)]
    pub fn enable_tls13(&self) -> bool {
        self.enable_tls13
    }

    /// Whether to record the fields of processed handshake messages.
    #[inline(always)]
    pub fn session_info(&self) -> bool {
        self.session_info
    }

    /// Validator invoked for received client certificate chains.
    #[inline(always)]
    pub fn client_cert_verifier(&self) -> Option<&dyn ClientCertVerifier> {
        self.client_cert_verifier.as_deref()
    }

    /// Cryptographic provider.
    ///
    /// Provides all cryptographic operations (ciphers, key exchange, signing, etc.).
    #[inline(always)]
    pub fn crypto_provider(&self) -> &CryptoProvider {
        &self.crypto_provider
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("require_client_certificate", &self.require_client_certificate)
            .field("require_server_name", &self.require_server_name)
            .field("enable_tls13", &self.enable_tls13)
            .field("session_info", &self.session_info)
            .field("client_cert_verifier", &self.client_cert_verifier.is_some())
            .finish()
    }
}

/// Builder for server configuration.
pub struct ConfigBuilder {
    require_client_certificate: bool,
    require_server_name: bool,
    enable_tls13: bool,
    session_info: bool,
    client_cert_verifier: Option<Arc<dyn ClientCertVerifier>>,
    crypto_provider: Option<CryptoProvider>,
}

impl ConfigBuilder {
    /// Set whether to require a client certificate.
    ///
    /// A validator must be installed with
    /// [`client_cert_verifier`](Self::client_cert_verifier) as well.
    /// Defaults to false.
    pub fn require_client_certificate(mut self, require: bool) -> Self {
        self.require_client_certificate = require;
        self
    }

    /// Set whether the ClientHello must carry a matching server_name.
    ///
    /// Defaults to false.
    pub fn require_server_name(mut self, require: bool) -> Self {
        self.require_server_name = require;
        self
    }

    /// Set whether TLS 1.3 may be negotiated.
    ///
    /// With TLS 1.3 enabled, a TLS 1.2 ServerHello carries the downgrade
    /// marker in its random. Defaults to true.
    pub fn enable_tls13(mut self, enable: bool) -> Self {
        self.enable_tls13 = enable;
        self
    }

    /// Set whether to collect session info.
    ///
    /// Defaults to false.
    pub fn session_info(mut self, enable: bool) -> Self {
        self.session_info = enable;
        self
    }

    /// Set the client certificate validator.
    ///
    /// Any `Fn(&[Vec<u8>]) -> bool` closure works. It receives the DER chain,
    /// leaf first.
    pub fn client_cert_verifier(mut self, verifier: impl ClientCertVerifier + 'static) -> Self {
        self.client_cert_verifier = Some(Arc::new(verifier));
        self
    }

    /// Set a custom crypto provider.
    pub fn with_crypto_provider(mut self, provider: CryptoProvider) -> Self {
        self.crypto_provider = Some(provider);
        self
    }

    /// Build the configuration.
    ///
    /// The crypto provider is selected in the following priority order:
    /// 1. Explicit provider set via `with_crypto_provider()`
    /// 2. Default provider installed via `CryptoProvider::install_default()`
    /// 3. The RustCrypto provider
    ///
    /// Returns `Error::ConfigError` if the provider is invalid, or if client
    /// certificates are required without a validator.
    pub fn build(self) -> Result<Config, Error> {
        let crypto_provider = self
            .crypto_provider
            .or_else(|| CryptoProvider::get_default().cloned())
            .unwrap_or_else(rust_crypto::default_provider);

        crypto_provider.validate().map_err(Error::ConfigError)?;

        if self.require_client_certificate && self.client_cert_verifier.is_none() {
            return Err(Error::ConfigError(
                "client certificates are required but no validator is set".to_string(),
            ));
        }

        Ok(Config {
            require_client_certificate: self.require_client_certificate,
            require_server_name: self.require_server_name,
            enable_tls13: self.enable_tls13,
            session_info: self.session_info,
            client_cert_verifier: self.client_cert_verifier,
            crypto_provider,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            require_client_certificate: false,
            require_server_name: false,
            enable_tls13: true,
            session_info: false,
            client_cert_verifier: None,
            crypto_provider: CryptoProvider::get_default()
                .cloned()
                .unwrap_or_else(rust_crypto::default_provider),
        }
    }
}
