//! Cipher suite implementations using RustCrypto.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::ChaCha20Poly1305;
use zeroize::Zeroizing;

use crate::crypto::provider::{
    AeadCipher, BlockCipher, SupportedTls12CipherSuite, SupportedTls13CipherSuite,
};
use crate::types::{CipherSuite, HashAlgorithm, KeyExchangeAlgorithm};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

// ============================================================================
// AES-128-CBC (TLS 1.2)
// ============================================================================

/// AES-128 in CBC mode. A fresh CBC state is created per record since every
/// record carries its own IV.
struct Aes128Cbc {
    key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for Aes128Cbc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes128Cbc").finish_non_exhaustive()
    }
}

impl Aes128Cbc {
    fn new(key: &[u8]) -> Result<Self, String> {
        if key.len() != 16 {
            return Err(format!("Invalid key size for AES-128-CBC: {}", key.len()));
        }
        Ok(Aes128Cbc {
            key: Zeroizing::new(key.to_vec()),
        })
    }
}

impl BlockCipher for Aes128Cbc {
    fn block_len(&self) -> usize {
        16
    }

    fn encrypt(&self, iv: &[u8], data: &mut [u8]) -> Result<(), String> {
        if data.len() % 16 != 0 {
            return Err(format!("CBC input not block aligned: {}", data.len()));
        }
        let len = data.len();
        Aes128CbcEnc::new_from_slices(&self.key, iv)
            .map_err(|_| "Invalid AES-128-CBC key or IV".to_string())?
            .encrypt_padded_mut::<NoPadding>(data, len)
            .map_err(|_| "AES-128-CBC encryption failed".to_string())?;
        Ok(())
    }

    fn decrypt(&self, iv: &[u8], data: &mut [u8]) -> Result<(), String> {
        if data.is_empty() || data.len() % 16 != 0 {
            return Err(format!("CBC input not block aligned: {}", data.len()));
        }
        Aes128CbcDec::new_from_slices(&self.key, iv)
            .map_err(|_| "Invalid AES-128-CBC key or IV".to_string())?
            .decrypt_padded_mut::<NoPadding>(data)
            .map_err(|_| "AES-128-CBC decryption failed".to_string())?;
        Ok(())
    }
}

// ============================================================================
// AEAD (TLS 1.3)
// ============================================================================

/// AEAD cipher implementation using RustCrypto.
enum Aead {
    Aes128Gcm(Box<Aes128Gcm>),
    Aes256Gcm(Box<Aes256Gcm>),
    ChaCha20Poly1305(Box<ChaCha20Poly1305>),
}

impl std::fmt::Debug for Aead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aead::Aes128Gcm(_) => f.debug_tuple("Aead::Aes128Gcm").finish(),
            Aead::Aes256Gcm(_) => f.debug_tuple("Aead::Aes256Gcm").finish(),
            Aead::ChaCha20Poly1305(_) => f.debug_tuple("Aead::ChaCha20Poly1305").finish(),
        }
    }
}

impl Aead {
    fn aes_gcm(key: &[u8]) -> Result<Self, String> {
        match key.len() {
            16 => Ok(Aead::Aes128Gcm(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(|_| "Invalid AES-GCM key")?,
            ))),
            32 => Ok(Aead::Aes256Gcm(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(|_| "Invalid AES-GCM key")?,
            ))),
            _ => Err(format!("Invalid key size for AES-GCM: {}", key.len())),
        }
    }

    fn chacha20_poly1305(key: &[u8]) -> Result<Self, String> {
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| format!("Invalid key size for ChaCha20-Poly1305: {}", key.len()))?;
        Ok(Aead::ChaCha20Poly1305(Box::new(cipher)))
    }
}

fn check_nonce(nonce: &[u8]) -> Result<(), String> {
    // All three AEADs use a 96 bit nonce
    if nonce.len() != 12 {
        return Err(format!(
            "Invalid nonce length: expected 12, got {}",
            nonce.len()
        ));
    }
    Ok(())
}

impl AeadCipher for Aead {
    fn seal(&self, nonce: &[u8], aad: &[u8], data: &mut Vec<u8>) -> Result<(), String> {
        check_nonce(nonce)?;
        let result = match self {
            Aead::Aes128Gcm(c) => c.encrypt_in_place(aes_gcm::Nonce::from_slice(nonce), aad, data),
            Aead::Aes256Gcm(c) => c.encrypt_in_place(aes_gcm::Nonce::from_slice(nonce), aad, data),
            Aead::ChaCha20Poly1305(c) => {
                c.encrypt_in_place(chacha20poly1305::Nonce::from_slice(nonce), aad, data)
            }
        };
        result.map_err(|_| "AEAD encryption failed".to_string())
    }

    fn open(&self, nonce: &[u8], aad: &[u8], data: &mut Vec<u8>) -> Result<(), String> {
        check_nonce(nonce)?;
        if data.len() < 16 {
            return Err(format!("Ciphertext too short: {}", data.len()));
        }
        let result = match self {
            Aead::Aes128Gcm(c) => c.decrypt_in_place(aes_gcm::Nonce::from_slice(nonce), aad, data),
            Aead::Aes256Gcm(c) => c.decrypt_in_place(aes_gcm::Nonce::from_slice(nonce), aad, data),
            Aead::ChaCha20Poly1305(c) => {
                c.decrypt_in_place(chacha20poly1305::Nonce::from_slice(nonce), aad, data)
            }
        };
        result.map_err(|_| "AEAD decryption failed".to_string())
    }
}

// ============================================================================
// TLS 1.2 Cipher Suites
// ============================================================================

/// A TLS 1.2 AES-128-CBC suite. They differ only in key exchange and MAC.
#[derive(Debug)]
struct Tls12Aes128Cbc {
    suite: CipherSuite,
    key_exchange: KeyExchangeAlgorithm,
    mac: HashAlgorithm,
}

impl SupportedTls12CipherSuite for Tls12Aes128Cbc {
    fn suite(&self) -> CipherSuite {
        self.suite
    }

    fn key_exchange(&self) -> KeyExchangeAlgorithm {
        self.key_exchange
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        // RFC 5246 Section 5: every suite here uses the SHA-256 PRF
        HashAlgorithm::SHA256
    }

    fn mac_algorithm(&self) -> HashAlgorithm {
        self.mac
    }

    fn key_lengths(&self) -> (usize, usize) {
        (self.mac.output_len(), 16) // (mac_key_len, enc_key_len)
    }

    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn BlockCipher>, String> {
        Ok(Box::new(Aes128Cbc::new(key)?))
    }
}

static RSA_AES128_CBC_SHA: Tls12Aes128Cbc = Tls12Aes128Cbc {
    suite: CipherSuite::RSA_AES128_CBC_SHA,
    key_exchange: KeyExchangeAlgorithm::Rsa,
    mac: HashAlgorithm::SHA1,
};

static RSA_AES128_CBC_SHA256: Tls12Aes128Cbc = Tls12Aes128Cbc {
    suite: CipherSuite::RSA_AES128_CBC_SHA256,
    key_exchange: KeyExchangeAlgorithm::Rsa,
    mac: HashAlgorithm::SHA256,
};

static ECDHE_RSA_AES128_CBC_SHA: Tls12Aes128Cbc = Tls12Aes128Cbc {
    suite: CipherSuite::ECDHE_RSA_AES128_CBC_SHA,
    key_exchange: KeyExchangeAlgorithm::Ecdhe,
    mac: HashAlgorithm::SHA1,
};

static ECDHE_RSA_AES128_CBC_SHA256: Tls12Aes128Cbc = Tls12Aes128Cbc {
    suite: CipherSuite::ECDHE_RSA_AES128_CBC_SHA256,
    key_exchange: KeyExchangeAlgorithm::Ecdhe,
    mac: HashAlgorithm::SHA256,
};

/// All supported TLS 1.2 cipher suites.
pub(super) static ALL_TLS12_CIPHER_SUITES: &[&dyn SupportedTls12CipherSuite] = &[
    &ECDHE_RSA_AES128_CBC_SHA256,
    &ECDHE_RSA_AES128_CBC_SHA,
    &RSA_AES128_CBC_SHA256,
    &RSA_AES128_CBC_SHA,
];

// ============================================================================
// TLS 1.3 Cipher Suites
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum AeadKind {
    AesGcm,
    ChaCha20Poly1305,
}

#[derive(Debug)]
struct Tls13Suite {
    suite: CipherSuite,
    hash: HashAlgorithm,
    key_len: usize,
    kind: AeadKind,
}

impl SupportedTls13CipherSuite for Tls13Suite {
    fn suite(&self) -> CipherSuite {
        self.suite
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    fn key_len(&self) -> usize {
        self.key_len
    }

    fn iv_len(&self) -> usize {
        12
    }

    fn tag_len(&self) -> usize {
        16
    }

    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn AeadCipher>, String> {
        if key.len() != self.key_len {
            return Err(format!(
                "Invalid key size for {:?}: {}",
                self.suite,
                key.len()
            ));
        }
        let aead = match self.kind {
            AeadKind::AesGcm => Aead::aes_gcm(key)?,
            AeadKind::ChaCha20Poly1305 => Aead::chacha20_poly1305(key)?,
        };
        Ok(Box::new(aead))
    }
}

static TLS13_AES_128_GCM_SHA256: Tls13Suite = Tls13Suite {
    suite: CipherSuite::TLS13_AES_128_GCM_SHA256,
    hash: HashAlgorithm::SHA256,
    key_len: 16,
    kind: AeadKind::AesGcm,
};

static TLS13_AES_256_GCM_SHA384: Tls13Suite = Tls13Suite {
    suite: CipherSuite::TLS13_AES_256_GCM_SHA384,
    hash: HashAlgorithm::SHA384,
    key_len: 32,
    kind: AeadKind::AesGcm,
};

static TLS13_CHACHA20_POLY1305_SHA256: Tls13Suite = Tls13Suite {
    suite: CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
    hash: HashAlgorithm::SHA256,
    key_len: 32,
    kind: AeadKind::ChaCha20Poly1305,
};

/// All supported TLS 1.3 cipher suites.
pub(super) static ALL_TLS13_CIPHER_SUITES: &[&dyn SupportedTls13CipherSuite] = &[
    &TLS13_AES_256_GCM_SHA384,
    &TLS13_CHACHA20_POLY1305_SHA256,
    &TLS13_AES_128_GCM_SHA256,
];
