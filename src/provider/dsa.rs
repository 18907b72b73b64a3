// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use dsa::{BigUint, Components, KeySize, Signature, SigningKey, VerifyingKey};
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use signature::SignatureEncoding;
use spki::{DecodePublicKey, EncodePublicKey};
use tracing::debug;

use crate::hash::prehash;
use crate::key_material::KeyMaterial;
use crate::param::{Algorithm, Digest, Padding};
use crate::provider::{CryptoError, CryptoProvider};

// component order: x y p q g
const Y: usize = 1;
const P: usize = 2;
const Q: usize = 3;
const G: usize = 4;

pub const KEY_SIZES: [u32; 3] = [1024, 2048, 3072];

pub struct DsaProvider;

#[allow(deprecated)]
fn key_size(bits: u32) -> Result<KeySize, CryptoError> {
    match bits {
        1024 => Ok(KeySize::DSA_1024_160),
        2048 => Ok(KeySize::DSA_2048_256),
        3072 => Ok(KeySize::DSA_3072_256),
        _ => Err(CryptoError::InvalidLength),
    }
}

fn invalid_key(_: signature::Error) -> CryptoError {
    CryptoError::InvalidKey(Some("inconsistent DSA components".into()))
}

fn verifying_key(key: &KeyMaterial) -> Result<VerifyingKey, CryptoError> {
    let components = Components::from_components(
        BigUint::from_bytes_be(key.component(P)),
        BigUint::from_bytes_be(key.component(Q)),
        BigUint::from_bytes_be(key.component(G)),
    )
    .map_err(invalid_key)?;
    VerifyingKey::from_components(components, BigUint::from_bytes_be(key.component(Y)))
        .map_err(invalid_key)
}

fn signing_key(key: &KeyMaterial) -> Result<SigningKey, CryptoError> {
    let x = key
        .private_component()
        .ok_or(CryptoError::InvalidKey(Some("missing private value".into())))?;
    SigningKey::from_components(verifying_key(key)?, BigUint::from_bytes_be(x)).map_err(invalid_key)
}

fn material(
    key_size: u32,
    verifying_key: &VerifyingKey,
    x: Option<Vec<u8>>,
) -> Result<KeyMaterial, CryptoError> {
    let components = verifying_key.components();
    KeyMaterial::new(
        Algorithm::Dsa,
        key_size,
        vec![
            x.unwrap_or_default(),
            verifying_key.y().to_bytes_be(),
            components.p().to_bytes_be(),
            components.q().to_bytes_be(),
            components.g().to_bytes_be(),
        ],
    )
    .map_err(|_| CryptoError::InvalidKey(None))
}

impl CryptoProvider for DsaProvider {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dsa
    }

    fn key_sizes(&self) -> &'static [u32] {
        &KEY_SIZES
    }

    fn generate(&self, bits: u32) -> Result<KeyMaterial, CryptoError> {
        let size = key_size(bits)?;
        let mut rng = rand::thread_rng();
        let components = Components::generate(&mut rng, size);
        let signing_key = SigningKey::generate(&mut rng, components);
        debug!(bits, "generated DSA key");
        material(
            bits,
            signing_key.verifying_key(),
            Some(signing_key.x().to_bytes_be()),
        )
    }

    fn sign(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        _padding: Padding,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let signing_key = signing_key(key)?;
        let hashed = prehash(digest, data)?;
        let signature: Signature = signing_key
            .sign_prehash(&hashed)
            .map_err(|e| CryptoError::SigningFailed(Some(e.to_string().into())))?;
        Ok(signature.to_vec())
    }

    fn verify(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        _padding: Padding,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let verifying_key = verifying_key(key)?;
        let signature =
            Signature::try_from(signature).map_err(|_| CryptoError::InvalidSignature)?;
        let hashed = prehash(digest, data)?;
        Ok(verifying_key.verify_prehash(&hashed, &signature).is_ok())
    }

    fn to_external_public(&self, key: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
        let der = verifying_key(key)?.to_public_key_der()?;
        Ok(der.as_bytes().to_vec())
    }

    fn from_external_public(&self, der: &[u8]) -> Result<KeyMaterial, CryptoError> {
        let verifying_key = VerifyingKey::from_public_key_der(der)?;
        let bits = verifying_key.components().p().bits() as u32;
        key_size(bits)?;
        material(bits, &verifying_key, None)
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::*;
    use crate::key_material::KeyPart;

    static KEY: Lazy<KeyMaterial> = Lazy::new(|| DsaProvider.generate(1024).unwrap());

    #[test]
    fn generated_key_has_all_components() {
        assert!(KEY.has_private());
        assert_eq!(KEY.key_size(), 1024);
        assert_eq!(KEY.component(Q).len(), 20);
        let decoded =
            KeyMaterial::decode(&KEY.to_vec(KeyPart::Private).unwrap(), true).unwrap();
        assert_eq!(&decoded, &*KEY);
    }

    #[test]
    fn sign_then_verify() {
        let data = b"00112233445566778899aabbccddeeff\0";
        let sig = DsaProvider
            .sign(&KEY, Digest::Sha256, Padding::None, data)
            .unwrap();
        assert!(DsaProvider
            .verify(&KEY.public_only(), Digest::Sha256, Padding::None, data, &sig)
            .unwrap());
        assert!(!DsaProvider
            .verify(&KEY, Digest::Sha256, Padding::None, b"other", &sig)
            .unwrap());
        assert!(!DsaProvider
            .verify(&KEY, Digest::Sha1, Padding::None, data, &sig)
            .unwrap());
    }

    #[test]
    fn garbage_signature_is_an_error() {
        let err = DsaProvider
            .verify(&KEY, Digest::Sha256, Padding::None, b"data", &[0x30, 0x01])
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignature));
    }

    #[test]
    fn public_key_crosses_spki() {
        let der = DsaProvider.to_external_public(&KEY).unwrap();
        let imported = DsaProvider.from_external_public(&der).unwrap();
        assert_eq!(imported, KEY.public_only());
        assert!(matches!(
            DsaProvider.sign(&imported, Digest::Sha256, Padding::None, b"x"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn unsupported_size() {
        assert!(matches!(
            DsaProvider.generate(1536),
            Err(CryptoError::InvalidLength)
        ));
    }
}
