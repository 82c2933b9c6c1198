//! TLS 1.3 cipher suite capability.
//!
//! Holds the per-direction AEAD state of one connection and the HKDF steps
//! that sit beside the key schedule: traffic key derivation, KeyUpdate and
//! Finished.

use std::fmt;

use zeroize::Zeroizing;

use super::key_schedule::{KeySchedule, Secret};
use crate::crypto::provider::{
    AeadCipher, CryptoProvider, PrivateKey, SupportedTls13CipherSuite,
};
use crate::types::{CipherSuite, ContentType, HashAlgorithm, SignatureScheme};

/// Context string of a server CertificateVerify (RFC 8446 Section 4.4.3).
pub const SERVER_CERTIFICATE_VERIFY_CONTEXT: &[u8] = b"TLS 1.3, server CertificateVerify";

/// Context string of a client CertificateVerify.
pub const CLIENT_CERTIFICATE_VERIFY_CONTEXT: &[u8] = b"TLS 1.3, client CertificateVerify";

/// The content covered by a CertificateVerify signature.
///
/// 64 bytes of 0x20, the context string, a zero byte, then the transcript hash.
pub fn certificate_verify_content(context: &[u8], transcript_hash: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + context.len() + 1 + transcript_hash.len());
    out.extend_from_slice(&[0x20; 64]);
    out.extend_from_slice(context);
    out.push(0);
    out.extend_from_slice(transcript_hash);
    out
}

struct TrafficKeys {
    cipher: Box<dyn AeadCipher>,
    iv: Zeroizing<Vec<u8>>,
    secret: Secret,
}

pub struct Tls13Suite {
    suite: &'static dyn SupportedTls13CipherSuite,
    provider: CryptoProvider,
    write: Option<TrafficKeys>,
    read: Option<TrafficKeys>,
}

impl fmt::Debug for Tls13Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tls13Suite")
            .field("suite", &self.suite.suite())
            .field("write", &self.write.is_some())
            .field("read", &self.read.is_some())
            .finish()
    }
}

impl Tls13Suite {
    pub fn new(suite: &'static dyn SupportedTls13CipherSuite, provider: CryptoProvider) -> Self {
        Tls13Suite {
            suite,
            provider,
            write: None,
            read: None,
        }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite.suite()
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.suite.hash_algorithm()
    }

    pub fn hash_len(&self) -> usize {
        self.suite.hash_algorithm().output_len()
    }

    pub fn transcript_hash(&self, transcript: &[u8]) -> Result<Vec<u8>, String> {
        let mut ctx = self
            .provider
            .hash_provider
            .create_hash(self.suite.hash_algorithm())?;
        ctx.update(transcript);
        Ok(ctx.clone_and_finalize())
    }

    /// A fresh key schedule for this suite's hash.
    pub fn key_schedule(&self) -> Result<KeySchedule, String> {
        KeySchedule::new(&self.provider, self.suite.hash_algorithm())
    }

    fn traffic_keys(&self, secret: Secret) -> Result<TrafficKeys, String> {
        let hkdf = self.provider.hkdf_provider;
        let hash = self.suite.hash_algorithm();
        let key = hkdf.hkdf_expand_label(hash, &secret, b"key", &[], self.suite.key_len())?;
        let iv = hkdf.hkdf_expand_label(hash, &secret, b"iv", &[], self.suite.iv_len())?;
        Ok(TrafficKeys {
            cipher: self.suite.create_cipher(&key)?,
            iv,
            secret,
        })
    }

    /// Switch outbound protection to `secret`.
    pub fn install_write_secret(&mut self, secret: Secret) -> Result<(), String> {
        self.write = Some(self.traffic_keys(secret)?);
        Ok(())
    }

    /// Switch inbound protection to `secret`.
    pub fn install_read_secret(&mut self, secret: Secret) -> Result<(), String> {
        self.read = Some(self.traffic_keys(secret)?);
        Ok(())
    }

    fn next_secret(&self, current: &[u8]) -> Result<Secret, String> {
        // application_traffic_secret_N+1 =
        //     HKDF-Expand-Label(application_traffic_secret_N, "traffic upd", "", Hash.length)
        self.provider.hkdf_provider.hkdf_expand_label(
            self.suite.hash_algorithm(),
            current,
            b"traffic upd",
            &[],
            self.hash_len(),
        )
    }

    /// Advance the outbound secret (KeyUpdate).
    pub fn update_write_secret(&mut self) -> Result<(), String> {
        let current = self.write.as_ref().ok_or("no write keys installed")?;
        let next = self.next_secret(&current.secret)?;
        self.install_write_secret(next)
    }

    /// Advance the inbound secret (KeyUpdate).
    pub fn update_read_secret(&mut self) -> Result<(), String> {
        let current = self.read.as_ref().ok_or("no read keys installed")?;
        let next = self.next_secret(&current.secret)?;
        self.install_read_secret(next)
    }

    fn finished(&self, base_secret: &[u8], transcript_hash: &[u8]) -> Result<Vec<u8>, String> {
        let hash = self.suite.hash_algorithm();
        let finished_key = self.provider.hkdf_provider.hkdf_expand_label(
            hash,
            base_secret,
            b"finished",
            &[],
            self.hash_len(),
        )?;
        self.provider
            .hmac_provider
            .hmac(hash, &finished_key, transcript_hash)
    }

    /// verify_data of our own Finished, keyed by the current write secret.
    pub fn write_verify_data(&self, transcript_hash: &[u8]) -> Result<Vec<u8>, String> {
        let keys = self.write.as_ref().ok_or("no write keys installed")?;
        self.finished(&keys.secret, transcript_hash)
    }

    /// Expected verify_data of the peer's Finished, keyed by the current
    /// read secret.
    pub fn read_verify_data(&self, transcript_hash: &[u8]) -> Result<Vec<u8>, String> {
        let keys = self.read.as_ref().ok_or("no read keys installed")?;
        self.finished(&keys.secret, transcript_hash)
    }

    fn nonce(iv: &[u8], seq: u64) -> Vec<u8> {
        let mut nonce = iv.to_vec();
        let offset = nonce.len().saturating_sub(8);
        for (n, s) in nonce[offset..].iter_mut().zip(seq.to_be_bytes()) {
            *n ^= s;
        }
        nonce
    }

    fn aad(len: usize) -> [u8; 5] {
        let len = (len as u16).to_be_bytes();
        [
            ContentType::ApplicationData.as_u8(),
            0x03,
            0x03,
            len[0],
            len[1],
        ]
    }

    /// Protect `content` as a TLSCiphertext body with `inner_type`.
    pub fn encrypt(
        &self,
        seq: u64,
        inner_type: ContentType,
        content: &[u8],
    ) -> Result<Vec<u8>, String> {
        let keys = self.write.as_ref().ok_or("no write keys installed")?;

        let mut data = Vec::with_capacity(content.len() + 1 + self.suite.tag_len());
        data.extend_from_slice(content);
        data.push(inner_type.as_u8());

        let aad = Self::aad(data.len() + self.suite.tag_len());
        let nonce = Self::nonce(&keys.iv, seq);
        keys.cipher.seal(&nonce, &aad, &mut data)?;
        Ok(data)
    }

    /// Open a TLSCiphertext body. Returns the inner content type and content.
    pub fn decrypt(&self, seq: u64, body: &[u8]) -> Result<(ContentType, Vec<u8>), String> {
        let keys = self.read.as_ref().ok_or("no read keys installed")?;
        if body.len() < self.suite.tag_len() + 1 {
            return Err("ciphertext too short".to_string());
        }

        let aad = Self::aad(body.len());
        let nonce = Self::nonce(&keys.iv, seq);
        let mut data = body.to_vec();
        keys.cipher.open(&nonce, &aad, &mut data)?;

        // TLSInnerPlaintext: content || type || zeros
        let end = data
            .iter()
            .rposition(|b| *b != 0)
            .ok_or("no inner content type")?;
        let inner_type = ContentType::from_u8(data[end]);
        data.truncate(end);
        Ok((inner_type, data))
    }

    pub fn sign(
        &self,
        key: &dyn PrivateKey,
        data: &[u8],
        scheme: SignatureScheme,
    ) -> Result<Vec<u8>, String> {
        key.sign(data, scheme)
    }

    pub fn verify(
        &self,
        cert_der: &[u8],
        data: &[u8],
        signature: &[u8],
        scheme: SignatureScheme,
    ) -> Result<(), String> {
        self.provider
            .signature_verification
            .verify_signature(cert_der, data, signature, scheme)
    }
}
