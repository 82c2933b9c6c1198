//! Key exchange group implementations using RustCrypto.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::provider::{ActiveKeyExchange, SupportedKxGroup};
use crate::types::NamedGroup;

/// ECDHE key exchange implementation.
enum EcdhKeyExchange {
    X25519 {
        secret: x25519_dalek::EphemeralSecret,
        public_key: Vec<u8>,
    },
    X448 {
        secret: Box<x448::Secret>,
        public_key: Vec<u8>,
    },
    P256 {
        secret: p256::ecdh::EphemeralSecret,
        public_key: Vec<u8>,
    },
    P384 {
        secret: p384::ecdh::EphemeralSecret,
        public_key: Vec<u8>,
    },
    P521 {
        secret: p521::ecdh::EphemeralSecret,
        public_key: Vec<u8>,
    },
}

impl std::fmt::Debug for EcdhKeyExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdhKeyExchange")
            .field("group", &self.group())
            .field("public_key_len", &self.pub_key().len())
            .finish_non_exhaustive()
    }
}

impl EcdhKeyExchange {
    fn new(group: NamedGroup) -> Result<Self, String> {
        match group {
            NamedGroup::X25519 => {
                let secret = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
                let public_key = x25519_dalek::PublicKey::from(&secret).as_bytes().to_vec();
                Ok(EcdhKeyExchange::X25519 { secret, public_key })
            }
            NamedGroup::X448 => {
                let mut bytes = Zeroizing::new([0u8; 56]);
                OsRng.fill_bytes(&mut bytes[..]);
                let secret = x448::Secret::from_bytes(&bytes[..])
                    .ok_or_else(|| "Invalid X448 secret".to_string())?;
                let public_key = x448::PublicKey::from(&secret).as_bytes().to_vec();
                Ok(EcdhKeyExchange::X448 {
                    secret: Box::new(secret),
                    public_key,
                })
            }
            NamedGroup::Secp256r1 => {
                let secret = p256::ecdh::EphemeralSecret::random(&mut OsRng);
                let public_key = p256::PublicKey::from(&secret).to_sec1_bytes().to_vec();
                Ok(EcdhKeyExchange::P256 { secret, public_key })
            }
            NamedGroup::Secp384r1 => {
                let secret = p384::ecdh::EphemeralSecret::random(&mut OsRng);
                let public_key = p384::PublicKey::from(&secret).to_sec1_bytes().to_vec();
                Ok(EcdhKeyExchange::P384 { secret, public_key })
            }
            NamedGroup::Secp521r1 => {
                let secret = p521::ecdh::EphemeralSecret::random(&mut OsRng);
                let public_key = p521::PublicKey::from(&secret).to_sec1_bytes().to_vec();
                Ok(EcdhKeyExchange::P521 { secret, public_key })
            }
            _ => Err(format!("Unsupported group: {:?}", group)),
        }
    }
}

impl ActiveKeyExchange for EcdhKeyExchange {
    fn pub_key(&self) -> &[u8] {
        match self {
            EcdhKeyExchange::X25519 { public_key, .. }
            | EcdhKeyExchange::X448 { public_key, .. }
            | EcdhKeyExchange::P256 { public_key, .. }
            | EcdhKeyExchange::P384 { public_key, .. }
            | EcdhKeyExchange::P521 { public_key, .. } => public_key,
        }
    }

    fn complete(self: Box<Self>, peer_pub: &[u8]) -> Result<Zeroizing<Vec<u8>>, String> {
        let shared = match *self {
            EcdhKeyExchange::X25519 { secret, .. } => {
                let peer: [u8; 32] = peer_pub
                    .try_into()
                    .map_err(|_| "Invalid X25519 public key".to_string())?;
                let shared = secret.diffie_hellman(&x25519_dalek::PublicKey::from(peer));
                if !shared.was_contributory() {
                    return Err("X25519 shared secret is all zero".to_string());
                }
                shared.as_bytes().to_vec()
            }
            EcdhKeyExchange::X448 { secret, .. } => {
                let peer = x448::PublicKey::from_bytes(peer_pub)
                    .ok_or_else(|| "Invalid X448 public key".to_string())?;
                let shared = secret
                    .as_diffie_hellman(&peer)
                    .ok_or_else(|| "X448 shared secret is low order".to_string())?;
                shared.as_bytes().to_vec()
            }
            EcdhKeyExchange::P256 { secret, .. } => {
                let peer = p256::PublicKey::from_sec1_bytes(peer_pub)
                    .map_err(|_| "Invalid P-256 public key".to_string())?;
                secret.diffie_hellman(&peer).raw_secret_bytes().to_vec()
            }
            EcdhKeyExchange::P384 { secret, .. } => {
                let peer = p384::PublicKey::from_sec1_bytes(peer_pub)
                    .map_err(|_| "Invalid P-384 public key".to_string())?;
                secret.diffie_hellman(&peer).raw_secret_bytes().to_vec()
            }
            EcdhKeyExchange::P521 { secret, .. } => {
                let peer = p521::PublicKey::from_sec1_bytes(peer_pub)
                    .map_err(|_| "Invalid P-521 public key".to_string())?;
                secret.diffie_hellman(&peer).raw_secret_bytes().to_vec()
            }
        };
        Ok(Zeroizing::new(shared))
    }

    fn group(&self) -> NamedGroup {
        match self {
            EcdhKeyExchange::X25519 { .. } => NamedGroup::X25519,
            EcdhKeyExchange::X448 { .. } => NamedGroup::X448,
            EcdhKeyExchange::P256 { .. } => NamedGroup::Secp256r1,
            EcdhKeyExchange::P384 { .. } => NamedGroup::Secp384r1,
            EcdhKeyExchange::P521 { .. } => NamedGroup::Secp521r1,
        }
    }
}

/// A key exchange group backed by [`EcdhKeyExchange`].
#[derive(Debug)]
struct KxGroup(NamedGroup);

impl SupportedKxGroup for KxGroup {
    fn name(&self) -> NamedGroup {
        self.0
    }

    fn start_exchange(&self) -> Result<Box<dyn ActiveKeyExchange>, String> {
        Ok(Box::new(EcdhKeyExchange::new(self.0)?))
    }
}

static KX_GROUP_X25519: KxGroup = KxGroup(NamedGroup::X25519);
static KX_GROUP_X448: KxGroup = KxGroup(NamedGroup::X448);
static KX_GROUP_P256: KxGroup = KxGroup(NamedGroup::Secp256r1);
static KX_GROUP_P384: KxGroup = KxGroup(NamedGroup::Secp384r1);
static KX_GROUP_P521: KxGroup = KxGroup(NamedGroup::Secp521r1);

/// All supported key exchange groups, in server preference order.
pub(super) static ALL_KX_GROUPS: &[&dyn SupportedKxGroup] = &[
    &KX_GROUP_X25519,
    &KX_GROUP_X448,
    &KX_GROUP_P521,
    &KX_GROUP_P384,
    &KX_GROUP_P256,
];
