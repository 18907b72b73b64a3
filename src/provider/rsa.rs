// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use rsa::pss::Pss;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use spki::{DecodePublicKey, EncodePublicKey};
use tracing::debug;

use crate::hash::prehash;
use crate::key_material::KeyMaterial;
use crate::param::{Algorithm, Digest, Padding};
use crate::provider::{CryptoError, CryptoProvider};

// component order: n e d
const N: usize = 0;
const E: usize = 1;

pub const KEY_SIZES: [u32; 6] = [512, 768, 1024, 2048, 3072, 4096];

pub struct RsaProvider;

/// Runs `$body` with `$d` bound to the hash type selected by `$digest`.
macro_rules! with_digest {
    ($digest:expr, $d:ident => $body:expr) => {
        match $digest {
            Digest::Md5 => {
                type $d = md5::Md5;
                Ok($body)
            },
            Digest::Sha1 => {
                type $d = sha1::Sha1;
                Ok($body)
            },
            Digest::Sha224 => {
                type $d = sha2::Sha224;
                Ok($body)
            },
            Digest::Sha256 => {
                type $d = sha2::Sha256;
                Ok($body)
            },
            Digest::Sha384 => {
                type $d = sha2::Sha384;
                Ok($body)
            },
            Digest::Sha512 => {
                type $d = sha2::Sha512;
                Ok($body)
            },
            Digest::None => Err(CryptoError::UnsupportedAlgorithm),
        }
    };
}

fn check_size(bits: u32) -> Result<(), CryptoError> {
    if KEY_SIZES.contains(&bits) {
        Ok(())
    } else {
        Err(CryptoError::InvalidLength)
    }
}

fn pkcs1v15_sign_scheme(digest: Digest) -> Result<Pkcs1v15Sign, CryptoError> {
    if digest == Digest::None {
        return Ok(Pkcs1v15Sign::new_unprefixed());
    }
    with_digest!(digest, D => Pkcs1v15Sign::new::<D>())
}

fn pss_scheme(digest: Digest) -> Result<Pss, CryptoError> {
    with_digest!(digest, D => Pss::new::<D>())
}

fn oaep_scheme(digest: Digest) -> Result<Oaep, CryptoError> {
    with_digest!(digest, D => Oaep::new::<D>())
}

fn public_key(key: &KeyMaterial) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::new(
        BigUint::from_bytes_be(key.component(N)),
        BigUint::from_bytes_be(key.component(E)),
    )
    .map_err(|e| CryptoError::InvalidKey(Some(e.to_string().into())))
}

fn private_key(key: &KeyMaterial) -> Result<RsaPrivateKey, CryptoError> {
    let d = key
        .private_component()
        .ok_or(CryptoError::InvalidKey(Some("missing private exponent".into())))?;
    RsaPrivateKey::from_components(
        BigUint::from_bytes_be(key.component(N)),
        BigUint::from_bytes_be(key.component(E)),
        BigUint::from_bytes_be(d),
        vec![],
    )
    .map_err(|e| CryptoError::InvalidKey(Some(e.to_string().into())))
}

fn material(
    bits: u32,
    public_key: &RsaPublicKey,
    d: Option<&BigUint>,
) -> Result<KeyMaterial, CryptoError> {
    KeyMaterial::new(
        Algorithm::Rsa,
        bits,
        vec![
            public_key.n().to_bytes_be(),
            public_key.e().to_bytes_be(),
            d.map(|d| d.to_bytes_be()).unwrap_or_default(),
        ],
    )
    .map_err(|_| CryptoError::InvalidKey(None))
}

impl CryptoProvider for RsaProvider {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Rsa
    }

    fn key_sizes(&self) -> &'static [u32] {
        &KEY_SIZES
    }

    fn generate(&self, bits: u32) -> Result<KeyMaterial, CryptoError> {
        check_size(bits)?;
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits as usize)
            .map_err(|_| CryptoError::KeyGenerationFailed)?;
        debug!(bits, "generated RSA key");
        material(bits, &private_key.to_public_key(), Some(private_key.d()))
    }

    fn sign(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        padding: Padding,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let private_key = private_key(key)?;
        let hashed = prehash(digest, data)?;
        let mut rng = rand::thread_rng();
        let signature = match padding {
            Padding::Pkcs1V15 => {
                private_key.sign_with_rng(&mut rng, pkcs1v15_sign_scheme(digest)?, &hashed)
            },
            Padding::Pss => private_key.sign_with_rng(&mut rng, pss_scheme(digest)?, &hashed),
            _ => return Err(CryptoError::UnsupportedAlgorithm),
        };
        signature.map_err(|e| CryptoError::SigningFailed(Some(e.to_string().into())))
    }

    fn verify(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        padding: Padding,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let public_key = public_key(key)?;
        if signature.len() != public_key.size() {
            return Err(CryptoError::InvalidSignature);
        }
        let hashed = prehash(digest, data)?;
        let result = match padding {
            Padding::Pkcs1V15 => {
                public_key.verify(pkcs1v15_sign_scheme(digest)?, &hashed, signature)
            },
            Padding::Pss => public_key.verify(pss_scheme(digest)?, &hashed, signature),
            _ => return Err(CryptoError::UnsupportedAlgorithm),
        };
        Ok(result.is_ok())
    }

    fn encrypt(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        padding: Padding,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let public_key = public_key(key)?;
        let mut rng = rand::thread_rng();
        let ciphertext = match padding {
            Padding::Oaep => public_key.encrypt(&mut rng, oaep_scheme(digest)?, data),
            Padding::Pkcs1V15 => public_key.encrypt(&mut rng, Pkcs1v15Encrypt, data),
            _ => return Err(CryptoError::UnsupportedAlgorithm),
        };
        ciphertext.map_err(|_| CryptoError::EncryptionFailed)
    }

    fn decrypt(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        padding: Padding,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let private_key = private_key(key)?;
        let plaintext = match padding {
            Padding::Oaep => private_key.decrypt(oaep_scheme(digest)?, data),
            Padding::Pkcs1V15 => private_key.decrypt(Pkcs1v15Encrypt, data),
            _ => return Err(CryptoError::UnsupportedAlgorithm),
        };
        plaintext.map_err(|_| CryptoError::DecryptionFailed)
    }

    fn to_external_public(&self, key: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
        let der = public_key(key)?.to_public_key_der()?;
        Ok(der.as_bytes().to_vec())
    }

    fn from_external_public(&self, der: &[u8]) -> Result<KeyMaterial, CryptoError> {
        let public_key = RsaPublicKey::from_public_key_der(der)?;
        let bits = public_key.n().bits() as u32;
        check_size(bits)?;
        material(bits, &public_key, None)
    }
}
