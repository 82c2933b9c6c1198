//! Server identity loading, client certificate validation and certificate
//! generation helpers.
//!
//! A [`ServerIdentity`] is loaded once and shared between connections. Only
//! RSA identities can complete a handshake.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use der::{Decode, Encode};
use pkcs8::EncodePrivateKey;
use rand::rngs::OsRng;
use rcgen::{
    Certificate as RcgenCertificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    PKCS_ECDSA_P256_SHA256,
};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use spki::{ObjectIdentifier, SubjectPublicKeyInfoOwned};
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;
use x509_cert::Certificate as X509Certificate;

use crate::crypto::{CryptoProvider, PrivateKey};
use crate::types::KeyAlgorithm;
use crate::Error;

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Decides whether a client certificate chain is acceptable.
///
/// The chain is DER encoded, leaf first. Implemented for any
/// `Fn(&[Vec<u8>]) -> bool`.
pub trait ClientCertVerifier: Send + Sync {
    fn verify(&self, chain: &[Vec<u8>]) -> bool;
}

impl<F> ClientCertVerifier for F
where
    F: Fn(&[Vec<u8>]) -> bool + Send + Sync,
{
    fn verify(&self, chain: &[Vec<u8>]) -> bool {
        self(chain)
    }
}

/// Server certificate chain and private key.
pub struct ServerIdentity {
    chain: Vec<Vec<u8>>,
    private_key: Box<dyn PrivateKey>,
    key_algorithm: KeyAlgorithm,
    subject_cn: Option<String>,
}

impl ServerIdentity {
    /// Load an identity from a DER chain (leaf first) and a DER or PEM key.
    ///
    /// Returns `Error::ConfigError` for non-RSA certificates.
    pub fn new(
        chain: Vec<Vec<u8>>,
        private_key: &[u8],
        provider: &CryptoProvider,
    ) -> Result<Self, Error> {
        let leaf = chain
            .first()
            .ok_or_else(|| Error::CertificateError("empty certificate chain".to_string()))?;
        let cert = X509Certificate::from_der(leaf)
            .map_err(|e| Error::CertificateError(format!("invalid certificate: {e}")))?;

        let key_algorithm = key_algorithm_of(&cert);
        if key_algorithm != KeyAlgorithm::Rsa {
            return Err(Error::ConfigError(format!(
                "{} server certificates are not supported",
                key_algorithm
            )));
        }

        let private_key = provider
            .key_provider
            .load_private_key(private_key)
            .map_err(Error::CertificateError)?;
        if private_key.algorithm() != key_algorithm {
            return Err(Error::CertificateError(format!(
                "private key is {} but certificate is {}",
                private_key.algorithm(),
                key_algorithm
            )));
        }

        let subject_cn = common_name(&cert.tbs_certificate.subject);
        debug!("Loaded {} identity, subject CN {:?}", key_algorithm, subject_cn);

        Ok(ServerIdentity {
            chain,
            private_key,
            key_algorithm,
            subject_cn,
        })
    }

    /// Load an identity from PEM text. `cert_pem` may hold a whole chain.
    pub fn from_pem(
        cert_pem: &str,
        key_pem: &str,
        provider: &CryptoProvider,
    ) -> Result<Self, Error> {
        let certs = X509Certificate::load_pem_chain(cert_pem.as_bytes())
            .map_err(|e| Error::CertificateError(format!("invalid certificate PEM: {e}")))?;
        let chain = certs
            .iter()
            .map(|c| c.to_der())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::CertificateError(format!("certificate encoding: {e}")))?;
        Self::new(chain, key_pem.as_bytes(), provider)
    }

    /// Load an identity from PEM files.
    pub fn from_pem_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        provider: &CryptoProvider,
    ) -> Result<Self, Error> {
        let cert_pem = std::fs::read_to_string(cert_path)?;
        let key_pem = std::fs::read_to_string(key_path)?;
        Self::from_pem(&cert_pem, &key_pem, provider)
    }

    /// DER certificates, leaf first.
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    pub fn subject_cn(&self) -> Option<&str> {
        self.subject_cn.as_deref()
    }

    pub fn private_key(&self) -> &dyn PrivateKey {
        self.private_key.as_ref()
    }

    /// Case-insensitive comparison of `name` with the subject CN.
    pub fn matches_server_name(&self, name: &str) -> bool {
        self.subject_cn
            .as_deref()
            .map(|cn| cn.eq_ignore_ascii_case(name))
            .unwrap_or(false)
    }
}

impl fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerIdentity")
            .field("chain", &self.chain.len())
            .field("key_algorithm", &self.key_algorithm)
            .field("subject_cn", &self.subject_cn)
            .finish()
    }
}

fn key_algorithm_of(cert: &X509Certificate) -> KeyAlgorithm {
    let oid = cert.tbs_certificate.subject_public_key_info.algorithm.oid;
    if oid == OID_RSA_ENCRYPTION {
        KeyAlgorithm::Rsa
    } else if oid == OID_EC_PUBLIC_KEY {
        KeyAlgorithm::Ecdsa
    } else {
        KeyAlgorithm::Other
    }
}

fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == OID_COMMON_NAME)
        .and_then(|atv| std::str::from_utf8(atv.value.value()).ok())
        .map(str::to_string)
}

/// Certificate and private key pair
#[derive(Clone)]
pub struct CertifiedKey {
    /// Certificate in DER format
    pub certificate: Vec<u8>,
    /// Private key in PKCS#8 DER format
    pub private_key: Vec<u8>,
}

impl fmt::Debug for CertifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertifiedKey")
            .field("certificate", &self.certificate.len())
            .field("private_key", &self.private_key.len())
            .finish()
    }
}

/// Generate a self-signed RSA-2048 certificate usable as a server identity.
pub fn generate_self_signed_rsa(common_name: &str) -> Result<CertifiedKey, Error> {
    let gen_err = |e: &dyn fmt::Display| Error::CertificateError(format!("generation failed: {e}"));

    let key = RsaPrivateKey::new(&mut OsRng, 2048).map_err(|e| gen_err(&e))?;
    let spki = SubjectPublicKeyInfoOwned::from_key(key.to_public_key()).map_err(|e| gen_err(&e))?;
    let subject = Name::from_str(&format!("CN={common_name}")).map_err(|e| gen_err(&e))?;
    let validity = Validity::from_now(Duration::from_secs(365 * 24 * 3600)).map_err(|e| gen_err(&e))?;

    let signer = rsa::pkcs1v15::SigningKey::<Sha256>::new(key.clone());
    let builder = CertificateBuilder::new(
        Profile::Root,
        SerialNumber::from(1u32),
        validity,
        subject,
        spki,
        &signer,
    )
    .map_err(|e| gen_err(&e))?;
    let cert = builder
        .build::<rsa::pkcs1v15::Signature>()
        .map_err(|e| gen_err(&e))?;

    Ok(CertifiedKey {
        certificate: cert.to_der().map_err(|e| gen_err(&e))?,
        private_key: key.to_pkcs8_der().map_err(|e| gen_err(&e))?.as_bytes().to_vec(),
    })
}

/// Generate a self-signed ECDSA P-256 certificate, e.g. for a test client.
pub fn generate_self_signed_ecdsa(common_name: &str) -> Result<CertifiedKey, Error> {
    let gen_err = |e: rcgen::RcgenError| Error::CertificateError(format!("generation failed: {e}"));

    let key_pair = KeyPair::generate(&PKCS_ECDSA_P256_SHA256).map_err(gen_err)?;

    let mut params = CertificateParams::new(vec![common_name.to_string()]);
    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, common_name.to_string());
    params.distinguished_name = distinguished_name;
    params.is_ca = IsCa::NoCa;
    params.key_pair = Some(key_pair);

    let not_before = time::OffsetDateTime::now_utc();
    params.not_before = not_before;
    params.not_after = not_before + time::Duration::days(365);

    let cert = RcgenCertificate::from_params(params).map_err(gen_err)?;

    Ok(CertifiedKey {
        certificate: cert.serialize_der().map_err(gen_err)?,
        private_key: cert.serialize_private_key_der(),
    })
}
