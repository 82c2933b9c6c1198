//! TLS 1.2 PRF and random number generation using RustCrypto.

use rand::rngs::OsRng;
use rand::RngCore;
use tinyvec::ArrayVec;
use zeroize::Zeroizing;

use crate::crypto::provider::{PrfProvider, SecureRandom};
use crate::types::HashAlgorithm;

use super::hmac;

/// PRF provider implementation for TLS 1.2.
///
/// PRF(secret, label, seed) = P_<hash>(secret, label + seed)
#[derive(Debug)]
pub(super) struct RustCryptoPrfProvider;

impl PrfProvider for RustCryptoPrfProvider {
    fn prf_tls12(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        output_len: usize,
        hash: HashAlgorithm,
    ) -> Result<Zeroizing<Vec<u8>>, String> {
        if !label.is_ascii() {
            return Err("PRF label must be ASCII".to_string());
        }

        let mut full_seed: ArrayVec<[u8; 128]> = ArrayVec::default();
        if label.len() + seed.len() > full_seed.capacity() {
            return Err(format!(
                "PRF seed too long: {}",
                label.len() + seed.len()
            ));
        }
        full_seed.extend_from_slice(label.as_bytes());
        full_seed.extend_from_slice(seed);

        hmac::p_hash(hash, secret, &full_seed, output_len)
    }
}

/// Secure random number generator implementation.
#[derive(Debug)]
pub(super) struct RustCryptoSecureRandom;

impl SecureRandom for RustCryptoSecureRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), String> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| format!("OS random source failed: {e}"))
    }
}

/// Static instance of the PRF provider.
pub(super) static PRF_PROVIDER: RustCryptoPrfProvider = RustCryptoPrfProvider;

/// Static instance of the secure random generator.
pub(super) static SECURE_RANDOM: RustCryptoSecureRandom = RustCryptoSecureRandom;
