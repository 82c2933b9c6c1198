//! TLS 1.2 cipher suite capability.
//!
//! Wraps a [`SupportedTls12CipherSuite`] from the provider with the state one
//! connection needs: master secret, MAC keys and the two CBC ciphers. Record
//! protection is MAC-then-encrypt (RFC 5246 Section 6.2.3.2).

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::provider::{
    BlockCipher, CryptoProvider, PrivateKey, SupportedTls12CipherSuite,
};
use crate::types::{CipherSuite, ContentType, KeyExchangeAlgorithm, SignatureScheme};

/// Which end of the connection a suite instance protects records for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// Master secret length (RFC 5246 Section 8.1).
const MASTER_SECRET_LEN: usize = 48;

/// verify_data length for every suite the engine speaks.
const VERIFY_DATA_LEN: usize = 12;

struct KeyBlock {
    client_mac_key: Zeroizing<Vec<u8>>,
    server_mac_key: Zeroizing<Vec<u8>>,
    client_cipher: Box<dyn BlockCipher>,
    server_cipher: Box<dyn BlockCipher>,
}

pub struct Tls12Suite {
    suite: &'static dyn SupportedTls12CipherSuite,
    provider: CryptoProvider,
    role: Role,
    master_secret: Option<Zeroizing<Vec<u8>>>,
    keys: Option<KeyBlock>,
}

impl fmt::Debug for Tls12Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tls12Suite")
            .field("suite", &self.suite.suite())
            .field("role", &self.role)
            .field("keyed", &self.keys.is_some())
            .finish()
    }
}

impl Tls12Suite {
    pub fn new(
        suite: &'static dyn SupportedTls12CipherSuite,
        provider: CryptoProvider,
        role: Role,
    ) -> Self {
        Tls12Suite {
            suite,
            provider,
            role,
            master_secret: None,
            keys: None,
        }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite.suite()
    }

    pub fn is_rsa_key_exchange(&self) -> bool {
        self.suite.key_exchange() == KeyExchangeAlgorithm::Rsa
    }

    pub fn mac_length(&self) -> usize {
        self.suite.mac_algorithm().output_len()
    }

    pub fn verify_data_length(&self) -> usize {
        VERIFY_DATA_LEN
    }

    /// Derive the master secret and key block from the pre-master secret.
    ///
    /// ```text
    /// master_secret = PRF(pre_master_secret, "master secret",
    ///                     client_random + server_random)[0..47]
    /// key_block     = PRF(master_secret, "key expansion",
    ///                     server_random + client_random)
    /// ```
    ///
    /// CBC suites use an explicit per-record IV, so the key block holds no
    /// IV material.
    pub fn key_exchange(
        &mut self,
        pre_master_secret: &[u8],
        client_random: &[u8; 32],
        server_random: &[u8; 32],
    ) -> Result<(), String> {
        let hash = self.suite.hash_algorithm();
        let prf = self.provider.prf_provider;

        let mut seed = [0u8; 64];
        seed[..32].copy_from_slice(client_random);
        seed[32..].copy_from_slice(server_random);
        let master = prf.prf_tls12(
            pre_master_secret,
            "master secret",
            &seed,
            MASTER_SECRET_LEN,
            hash,
        )?;

        seed[..32].copy_from_slice(server_random);
        seed[32..].copy_from_slice(client_random);
        let (mac_len, key_len) = self.suite.key_lengths();
        let block = prf.prf_tls12(&master, "key expansion", &seed, 2 * (mac_len + key_len), hash)?;

        let (client_mac, rest) = block.split_at(mac_len);
        let (server_mac, rest) = rest.split_at(mac_len);
        let (client_key, server_key) = rest.split_at(key_len);

        self.keys = Some(KeyBlock {
            client_mac_key: Zeroizing::new(client_mac.to_vec()),
            server_mac_key: Zeroizing::new(server_mac.to_vec()),
            client_cipher: self.suite.create_cipher(client_key)?,
            server_cipher: self.suite.create_cipher(server_key)?,
        });
        self.master_secret = Some(master);
        Ok(())
    }

    fn keys(&self) -> Result<&KeyBlock, String> {
        self.keys
            .as_ref()
            .ok_or_else(|| "key exchange has not completed".to_string())
    }

    fn mac(
        &self,
        key: &[u8],
        seq: u64,
        content_type: ContentType,
        data: &[u8],
    ) -> Result<Vec<u8>, String> {
        // seq_num || type || version || length || fragment
        let mut input = Vec::with_capacity(13 + data.len());
        input.extend_from_slice(&seq.to_be_bytes());
        input.push(content_type.as_u8());
        input.extend_from_slice(&[0x03, 0x03]);
        input.extend_from_slice(&(data.len() as u16).to_be_bytes());
        input.extend_from_slice(data);
        self.provider
            .hmac_provider
            .hmac(self.suite.mac_algorithm(), key, &input)
    }

    /// MAC of a record sent by the client.
    pub fn client_mac(
        &self,
        seq: u64,
        content_type: ContentType,
        data: &[u8],
    ) -> Result<Vec<u8>, String> {
        let keys = self.keys()?;
        self.mac(&keys.client_mac_key, seq, content_type, data)
    }

    /// MAC of a record sent by the server.
    pub fn server_mac(
        &self,
        seq: u64,
        content_type: ContentType,
        data: &[u8],
    ) -> Result<Vec<u8>, String> {
        let keys = self.keys()?;
        self.mac(&keys.server_mac_key, seq, content_type, data)
    }

    fn write_mac(&self, seq: u64, content_type: ContentType, data: &[u8]) -> Result<Vec<u8>, String> {
        match self.role {
            Role::Server => self.server_mac(seq, content_type, data),
            Role::Client => self.client_mac(seq, content_type, data),
        }
    }

    fn read_mac(&self, seq: u64, content_type: ContentType, data: &[u8]) -> Result<Vec<u8>, String> {
        match self.role {
            Role::Server => self.client_mac(seq, content_type, data),
            Role::Client => self.server_mac(seq, content_type, data),
        }
    }

    fn write_cipher(&self) -> Result<&dyn BlockCipher, String> {
        let keys = self.keys()?;
        Ok(match self.role {
            Role::Server => keys.server_cipher.as_ref(),
            Role::Client => keys.client_cipher.as_ref(),
        })
    }

    fn read_cipher(&self) -> Result<&dyn BlockCipher, String> {
        let keys = self.keys()?;
        Ok(match self.role {
            Role::Server => keys.client_cipher.as_ref(),
            Role::Client => keys.server_cipher.as_ref(),
        })
    }

    /// Pad and encrypt `plaintext` (already carrying its MAC) under a fresh
    /// random IV. Returns `IV || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, String> {
        let cipher = self.write_cipher()?;
        let block = cipher.block_len();

        // padding_length + 1 bytes, each holding padding_length
        let pad = block - (plaintext.len() + 1) % block;
        let pad = if pad == block { 0 } else { pad };

        let mut out = vec![0u8; block];
        self.provider.secure_random.fill(&mut out)?;
        out.extend_from_slice(plaintext);
        out.resize(out.len() + pad + 1, pad as u8);

        let (iv, data) = out.split_at_mut(block);
        cipher.encrypt(iv, data)?;
        Ok(out)
    }

    /// Decrypt an `IV || ciphertext` record body and strip the padding.
    /// The result still carries the MAC.
    pub fn decrypt(&self, record: &[u8]) -> Result<Vec<u8>, String> {
        let cipher = self.read_cipher()?;
        let block = cipher.block_len();

        if record.len() < 2 * block || record.len() % block != 0 {
            return Err(format!("bad ciphertext length {}", record.len()));
        }

        let (iv, ciphertext) = record.split_at(block);
        let mut data = ciphertext.to_vec();
        cipher.decrypt(iv, &mut data)?;

        let pad = *data.last().unwrap_or(&0) as usize;
        if pad + 1 > data.len() {
            return Err("bad padding length".to_string());
        }
        let padding_start = data.len() - pad - 1;
        let bad = data[padding_start..]
            .iter()
            .fold(0u8, |acc, b| acc | (b ^ pad as u8));
        if bad != 0 {
            return Err("bad padding".to_string());
        }
        data.truncate(padding_start);
        Ok(data)
    }

    /// Split decrypted `payload || mac`.
    pub fn split_mac<'a>(&self, data: &'a [u8]) -> Result<(&'a [u8], &'a [u8]), String> {
        let mac_len = self.mac_length();
        if data.len() < mac_len {
            return Err("record shorter than its MAC".to_string());
        }
        Ok(data.split_at(data.len() - mac_len))
    }

    /// Check the peer's MAC over `payload` in constant time.
    pub fn verify_mac(
        &self,
        seq: u64,
        content_type: ContentType,
        payload: &[u8],
        mac: &[u8],
    ) -> Result<(), String> {
        let expected = self.read_mac(seq, content_type, payload)?;
        if bool::from(expected.ct_eq(mac)) {
            Ok(())
        } else {
            Err("bad record MAC".to_string())
        }
    }

    /// MAC-then-encrypt one outbound record body.
    pub fn protect(
        &self,
        seq: u64,
        content_type: ContentType,
        payload: &[u8],
    ) -> Result<Vec<u8>, String> {
        let mac = self.write_mac(seq, content_type, payload)?;
        let mut data = Vec::with_capacity(payload.len() + mac.len());
        data.extend_from_slice(payload);
        data.extend_from_slice(&mac);
        self.encrypt(&data)
    }

    /// Decrypt and verify one inbound record body.
    pub fn unprotect(
        &self,
        seq: u64,
        content_type: ContentType,
        record: &[u8],
    ) -> Result<Vec<u8>, String> {
        let data = self.decrypt(record)?;
        let (payload, mac) = self.split_mac(&data)?;
        self.verify_mac(seq, content_type, payload, mac)?;
        Ok(payload.to_vec())
    }

    pub fn sign(
        &self,
        key: &dyn PrivateKey,
        data: &[u8],
        scheme: SignatureScheme,
    ) -> Result<Vec<u8>, String> {
        key.sign(data, scheme)
    }

    /// Verify a peer signature with the key of `cert_der`.
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

    /// `PRF(master_secret, label, Hash(transcript))[0..11]`
    pub fn verify_data(&self, label: &str, transcript: &[u8]) -> Result<Vec<u8>, String> {
        let master = self
            .master_secret
            .as_ref()
            .ok_or_else(|| "master secret not derived".to_string())?;
        let hash = self.suite.hash_algorithm();
        let mut ctx = self.provider.hash_provider.create_hash(hash)?;
        ctx.update(transcript);
        let digest = ctx.clone_and_finalize();
        let out = self
            .provider
            .prf_provider
            .prf_tls12(master, label, &digest, VERIFY_DATA_LEN, hash)?;
        Ok(out.to_vec())
    }
}
