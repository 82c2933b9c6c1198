//! HMAC utilities using RustCrypto.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::crypto::provider::HmacProvider;
use crate::types::HashAlgorithm;

fn hmac_with<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, String> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| "Invalid HMAC key".to_string())?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn p_hash_with<M: Mac + KeyInit + Clone>(
    secret: &[u8],
    full_seed: &[u8],
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, String> {
    let mac = <M as Mac>::new_from_slice(secret)
        .map_err(|_| "Invalid HMAC key length".to_string())?;
    let mut out = Zeroizing::new(Vec::with_capacity(output_len));

    // A(1) = HMAC_hash(secret, A(0)) where A(0) = seed
    let mut a = mac.clone().chain_update(full_seed).finalize().into_bytes();

    while out.len() < output_len {
        // HMAC_hash(secret, A(i) + seed)
        let output = mac
            .clone()
            .chain_update(a.as_slice())
            .chain_update(full_seed)
            .finalize()
            .into_bytes();

        let remaining = output_len - out.len();
        let to_copy = std::cmp::min(remaining, output.len());
        out.extend_from_slice(&output[..to_copy]);

        if out.len() < output_len {
            // A(i+1) = HMAC_hash(secret, A(i))
            a = mac.clone().chain_update(a.as_slice()).finalize().into_bytes();
        }
    }

    Ok(out)
}

/// Compute HMAC using TLS 1.2 P_hash algorithm.
pub(super) fn p_hash(
    hash_alg: HashAlgorithm,
    secret: &[u8],
    full_seed: &[u8],
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, String> {
    match hash_alg {
        HashAlgorithm::SHA256 => p_hash_with::<Hmac<Sha256>>(secret, full_seed, output_len),
        HashAlgorithm::SHA384 => p_hash_with::<Hmac<Sha384>>(secret, full_seed, output_len),
        _ => Err(format!("Unsupported PRF hash for TLS1.2: {:?}", hash_alg)),
    }
}

/// HMAC provider implementation.
#[derive(Debug)]
pub(super) struct RustCryptoHmacProvider;

impl HmacProvider for RustCryptoHmacProvider {
    fn hmac(&self, hash: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, String> {
        match hash {
            HashAlgorithm::SHA1 => hmac_with::<Hmac<Sha1>>(key, data),
            HashAlgorithm::SHA256 => hmac_with::<Hmac<Sha256>>(key, data),
            HashAlgorithm::SHA384 => hmac_with::<Hmac<Sha384>>(key, data),
            HashAlgorithm::SHA512 => hmac_with::<Hmac<Sha512>>(key, data),
        }
    }
}

/// Static instance of the HMAC provider.
pub(super) static HMAC_PROVIDER: RustCryptoHmacProvider = RustCryptoHmacProvider;
