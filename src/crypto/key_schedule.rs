//! TLS 1.3 Key Schedule (RFC 8446 Section 7.1)
//!
//! The key schedule uses HKDF with the following structure. Without PSK
//! support the early secret is derived from zeros.
//!
//! ```text
//!              0
//!              |
//!              v
//!    PSK ->  HKDF-Extract = Early Secret
//!              |
//!              v
//!        Derive-Secret(., "derived", "")
//!              |
//!              v
//!    (EC)DHE -> HKDF-Extract = Handshake Secret
//!              |
//!              +-----> Derive-Secret(., "c hs traffic",
//!              |                     ClientHello...ServerHello)
//!              |                     = client_handshake_traffic_secret
//!              |
//!              +-----> Derive-Secret(., "s hs traffic",
//!              |                     ClientHello...ServerHello)
//!              |                     = server_handshake_traffic_secret
//!              v
//!        Derive-Secret(., "derived", "")
//!              |
//!              v
//!    0 -> HKDF-Extract = Master Secret
//!              |
//!              +-----> Derive-Secret(., "c ap traffic",
//!              |                     ClientHello...server Finished)
//!              |                     = client_application_traffic_secret_0
//!              |
//!              +-----> Derive-Secret(., "s ap traffic",
//!                                    ClientHello...server Finished)
//!                                    = server_application_traffic_secret_0
//! ```

use zeroize::Zeroizing;

use crate::crypto::provider::{CryptoProvider, HkdfProvider};
use crate::types::HashAlgorithm;

pub type Secret = Zeroizing<Vec<u8>>;

/// TLS 1.3 Key Schedule.
///
/// Tracks the current stage secret. Derived traffic secrets are returned to
/// the caller.
#[derive(Debug)]
pub struct KeySchedule {
    hkdf: &'static dyn HkdfProvider,
    hash: HashAlgorithm,
    /// Hash of the empty string, the context of every "derived" step.
    empty_hash: Vec<u8>,
    current_secret: Secret,
}

impl KeySchedule {
    /// Start a key schedule without PSK, ready for the ECDHE input.
    pub fn new(provider: &CryptoProvider, hash: HashAlgorithm) -> Result<Self, String> {
        let hkdf = provider.hkdf_provider;
        let hash_len = hash.output_len();
        let zeros = vec![0u8; hash_len];

        let empty_hash = provider.hash_provider.create_hash(hash)?.clone_and_finalize();

        // Early Secret = HKDF-Extract(0, 0)
        let early_secret = hkdf.hkdf_extract(hash, &[], &zeros)?;

        // Derive-Secret(Early Secret, "derived", "")
        let derived = hkdf.hkdf_expand_label(hash, &early_secret, b"derived", &empty_hash, hash_len)?;

        Ok(Self {
            hkdf,
            hash,
            empty_hash,
            current_secret: derived,
        })
    }

    /// Inject the ECDHE shared secret and derive handshake secrets.
    ///
    /// Returns (client_handshake_traffic_secret, server_handshake_traffic_secret).
    pub fn derive_handshake_secrets(
        &mut self,
        ecdhe_secret: &[u8],
        transcript_hash: &[u8],
    ) -> Result<(Secret, Secret), String> {
        let hash_len = self.hash.output_len();

        // Handshake Secret = HKDF-Extract(derived, ECDHE)
        let handshake_secret =
            self.hkdf
                .hkdf_extract(self.hash, &self.current_secret, ecdhe_secret)?;

        let client = self.hkdf.hkdf_expand_label(
            self.hash,
            &handshake_secret,
            b"c hs traffic",
            transcript_hash,
            hash_len,
        )?;
        let server = self.hkdf.hkdf_expand_label(
            self.hash,
            &handshake_secret,
            b"s hs traffic",
            transcript_hash,
            hash_len,
        )?;

        // Derive-Secret(Handshake Secret, "derived", "") for master secret
        self.current_secret = self.hkdf.hkdf_expand_label(
            self.hash,
            &handshake_secret,
            b"derived",
            &self.empty_hash,
            hash_len,
        )?;

        Ok((client, server))
    }

    /// Derive application traffic secrets.
    ///
    /// Returns (client_application_traffic_secret_0, server_application_traffic_secret_0).
    pub fn derive_application_secrets(
        &mut self,
        transcript_hash: &[u8],
    ) -> Result<(Secret, Secret), String> {
        let hash_len = self.hash.output_len();
        let zeros = vec![0u8; hash_len];

        // Master Secret = HKDF-Extract(derived, 0)
        let master_secret = self
            .hkdf
            .hkdf_extract(self.hash, &self.current_secret, &zeros)?;

        let client = self.hkdf.hkdf_expand_label(
            self.hash,
            &master_secret,
            b"c ap traffic",
            transcript_hash,
            hash_len,
        )?;
        let server = self.hkdf.hkdf_expand_label(
            self.hash,
            &master_secret,
            b"s ap traffic",
            transcript_hash,
            hash_len,
        )?;

        self.current_secret = master_secret;

        Ok((client, server))
    }
}
