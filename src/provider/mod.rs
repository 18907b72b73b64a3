// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
mod dsa;
mod ecc;
#[cfg(feature = "crypto-ring-rust")]
mod ring;
mod rsa;
mod rust;

use std::borrow::Cow;

use crate::key_material::KeyMaterial;
use crate::param::{Algorithm, Digest, Padding};

pub use self::dsa::DsaProvider;
pub use self::ecc::EccProvider;
pub use self::rsa::RsaProvider;

pub trait SimpleDigest {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

/// Hash back-end selected at compile time.
pub trait DigestProvider {
    type Digest: SimpleDigest;

    fn digest(&self, algorithm: Digest) -> Result<Self::Digest, CryptoError>;
}

/// One implementation per algorithm family. Keys cross this boundary as
/// decoded [`KeyMaterial`]; back-end key objects never outlive a call.
pub trait CryptoProvider: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Key sizes in bits the adapter can generate and load.
    fn key_sizes(&self) -> &'static [u32];

    fn generate(&self, key_size: u32) -> Result<KeyMaterial, CryptoError>;

    fn sign(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        padding: Padding,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// `Ok(false)` when the signature is well formed but does not match.
    fn verify(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        padding: Padding,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError>;

    fn encrypt(
        &self,
        _key: &KeyMaterial,
        _digest: Digest,
        _padding: Padding,
        _data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::UnsupportedAlgorithm)
    }

    fn decrypt(
        &self,
        _key: &KeyMaterial,
        _digest: Digest,
        _padding: Padding,
        _data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::UnsupportedAlgorithm)
    }

    /// SubjectPublicKeyInfo DER of the public part of `key`.
    fn to_external_public(&self, key: &KeyMaterial) -> Result<Vec<u8>, CryptoError>;

    /// Public-only material from SubjectPublicKeyInfo DER.
    fn from_external_public(&self, der: &[u8]) -> Result<KeyMaterial, CryptoError>;
}

static DSA_PROVIDER: DsaProvider = DsaProvider;
static RSA_PROVIDER: RsaProvider = RsaProvider;
static ECC_PROVIDER: EccProvider = EccProvider;

pub fn for_algorithm(algorithm: Algorithm) -> Option<&'static dyn CryptoProvider> {
    match algorithm {
        Algorithm::Dsa => Some(&DSA_PROVIDER),
        Algorithm::Rsa => Some(&RSA_PROVIDER),
        Algorithm::Ecc => Some(&ECC_PROVIDER),
        Algorithm::Aes | Algorithm::Hmac => None,
    }
}

#[derive(Debug)]
pub enum CryptoError {
    InvalidKey(Option<Cow<'static, str>>),
    InvalidData,
    InvalidSignature,
    InvalidLength,
    KeyGenerationFailed,
    SigningFailed(Option<Cow<'static, str>>),
    VerificationFailed,
    EncryptionFailed,
    DecryptionFailed,
    OperationFailed(Option<Cow<'static, str>>),
    UnsupportedAlgorithm,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::InvalidKey(None) => write!(f, "Invalid key"),
            CryptoError::InvalidKey(Some(msg)) => write!(f, "Invalid key: {}", msg),
            CryptoError::InvalidData => write!(f, "Invalid data"),
            CryptoError::InvalidSignature => write!(f, "Invalid signature"),
            CryptoError::InvalidLength => write!(f, "Invalid length"),
            CryptoError::KeyGenerationFailed => write!(f, "Key generation failed"),
            CryptoError::SigningFailed(None) => write!(f, "Signing failed"),
            CryptoError::SigningFailed(Some(msg)) => write!(f, "Signing failed: {}", msg),
            CryptoError::VerificationFailed => write!(f, "Verification failed"),
            CryptoError::EncryptionFailed => write!(f, "Encryption failed"),
            CryptoError::DecryptionFailed => write!(f, "Decryption failed"),
            CryptoError::OperationFailed(None) => write!(f, "Operation failed"),
            CryptoError::OperationFailed(Some(msg)) => write!(f, "Operation failed: {}", msg),
            CryptoError::UnsupportedAlgorithm => write!(f, "Unsupported algorithm"),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<spki::Error> for CryptoError {
    fn from(err: spki::Error) -> Self {
        CryptoError::InvalidKey(Some(err.to_string().into()))
    }
}

#[cfg(feature = "crypto-rust")]
pub type DefaultDigestProvider = rust::RustDigestProvider;

#[cfg(feature = "crypto-ring-rust")]
pub type DefaultDigestProvider = ring::RingRustDigestProvider;

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> impl DigestProvider {
        #[cfg(feature = "crypto-rust")]
        return rust::RustDigestProvider;
        #[cfg(feature = "crypto-ring-rust")]
        return ring::RingRustDigestProvider;
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn hash(algorithm: Digest, data: &[u8]) -> String {
        let mut digest = provider().digest(algorithm).unwrap();
        digest.update(data);
        to_hex(&digest.finalize())
    }

    #[test]
    fn test_sha256_digest() {
        assert_eq!(
            hash(Digest::Sha256, b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha224_digest() {
        assert_eq!(
            hash(Digest::Sha224, b"abc"),
            "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7"
        );
    }

    #[test]
    fn test_sha1_digest() {
        assert_eq!(
            hash(Digest::Sha1, b"hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn test_md5_digest() {
        assert_eq!(
            hash(Digest::Md5, b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_incremental_digest() {
        let mut digest = provider().digest(Digest::Sha512).unwrap();
        digest.update(b"hello ");
        digest.update(b"world");
        assert_eq!(to_hex(&digest.finalize()), hash(Digest::Sha512, b"hello world"));
    }

    #[test]
    fn test_none_is_not_a_hash() {
        assert!(matches!(
            provider().digest(Digest::None),
            Err(CryptoError::UnsupportedAlgorithm)
        ));
    }

    #[test]
    fn test_symmetric_algorithms_have_no_adapter() {
        assert!(for_algorithm(Algorithm::Aes).is_none());
        assert_eq!(
            for_algorithm(Algorithm::Dsa).unwrap().algorithm(),
            Algorithm::Dsa
        );
    }
}
