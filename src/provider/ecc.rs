// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use tracing::debug;

use crate::hash::prehash;
use crate::key_material::KeyMaterial;
use crate::param::{Algorithm, Digest, Padding};
use crate::provider::{CryptoError, CryptoProvider};

pub const KEY_SIZES: [u32; 2] = [256, 384];

pub struct EccProvider;

/// Right-aligns a big-endian integer in a `len` byte field.
fn left_pad(bytes: &[u8], len: usize) -> Result<Vec<u8>, CryptoError> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let bytes = &bytes[start..];
    if bytes.len() > len {
        return Err(CryptoError::InvalidLength);
    }
    let mut padded = vec![0u8; len - bytes.len()];
    padded.extend_from_slice(bytes);
    Ok(padded)
}

fn invalid_key<E: std::fmt::Display>(err: E) -> CryptoError {
    CryptoError::InvalidKey(Some(err.to_string().into()))
}

macro_rules! ecdsa_curve {
    ($module:ident, $curve:ident, $bits:expr) => {
        mod $module {
            use ::$curve::ecdsa::{Signature, SigningKey, VerifyingKey};
            use ::$curve::elliptic_curve::sec1::ToEncodedPoint;
            use ::$curve::{EncodedPoint, PublicKey};
            use rand::rngs::OsRng;
            use signature::hazmat::{PrehashSigner, PrehashVerifier};
            use spki::{DecodePublicKey, EncodePublicKey};

            use super::{invalid_key, left_pad};
            use crate::key_material::KeyMaterial;
            use crate::param::Algorithm;
            use crate::provider::CryptoError;

            pub const BITS: u32 = $bits;
            const FIELD_LEN: usize = ($bits + 7) / 8;

            fn material(point: &EncodedPoint, z: Vec<u8>) -> Result<KeyMaterial, CryptoError> {
                let x = point.x().ok_or(CryptoError::InvalidKey(None))?;
                let y = point.y().ok_or(CryptoError::InvalidKey(None))?;
                KeyMaterial::new(Algorithm::Ecc, BITS, vec![x.to_vec(), y.to_vec(), z])
                    .map_err(|_| CryptoError::InvalidKey(None))
            }

            fn verifying_key(key: &KeyMaterial) -> Result<VerifyingKey, CryptoError> {
                // SEC1 uncompressed: 0x04 || x || y
                let mut sec1 = Vec::with_capacity(1 + 2 * FIELD_LEN);
                sec1.push(0x04);
                sec1.extend(left_pad(key.component(0), FIELD_LEN)?);
                sec1.extend(left_pad(key.component(1), FIELD_LEN)?);
                let point = EncodedPoint::from_bytes(&sec1).map_err(invalid_key)?;
                VerifyingKey::from_encoded_point(&point).map_err(invalid_key)
            }

            fn signing_key(key: &KeyMaterial) -> Result<SigningKey, CryptoError> {
                let z = key
                    .private_component()
                    .ok_or(CryptoError::InvalidKey(Some("missing private scalar".into())))?;
                SigningKey::from_slice(&left_pad(z, FIELD_LEN)?).map_err(invalid_key)
            }

            // short hashes are zero-extended on the left to the field size
            fn field_hash(hash: &[u8]) -> Result<Vec<u8>, CryptoError> {
                if hash.len() < FIELD_LEN {
                    let mut padded = vec![0u8; FIELD_LEN - hash.len()];
                    padded.extend_from_slice(hash);
                    Ok(padded)
                } else {
                    Ok(hash.to_vec())
                }
            }

            pub fn generate() -> Result<KeyMaterial, CryptoError> {
                let signing_key = SigningKey::random(&mut OsRng);
                let point = signing_key.verifying_key().to_encoded_point(false);
                material(&point, signing_key.to_bytes().to_vec())
            }

            pub fn sign(key: &KeyMaterial, hash: &[u8]) -> Result<Vec<u8>, CryptoError> {
                let signature: Signature = signing_key(key)?
                    .sign_prehash(&field_hash(hash)?)
                    .map_err(|e| CryptoError::SigningFailed(Some(e.to_string().into())))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }

            pub fn verify(
                key: &KeyMaterial,
                hash: &[u8],
                signature: &[u8],
            ) -> Result<bool, CryptoError> {
                let verifying_key = verifying_key(key)?;
                let signature =
                    Signature::from_der(signature).map_err(|_| CryptoError::InvalidSignature)?;
                Ok(verifying_key
                    .verify_prehash(&field_hash(hash)?, &signature)
                    .is_ok())
            }

            pub fn to_spki(key: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
                let point = verifying_key(key)?.to_encoded_point(false);
                let public_key =
                    PublicKey::from_sec1_bytes(point.as_bytes()).map_err(invalid_key)?;
                Ok(public_key.to_public_key_der()?.as_bytes().to_vec())
            }

            pub fn from_spki(der: &[u8]) -> Result<KeyMaterial, CryptoError> {
                let public_key = PublicKey::from_public_key_der(der)?;
                material(&public_key.to_encoded_point(false), Vec::new())
            }
        }
    };
}

ecdsa_curve!(nist_p256, p256, 256);
ecdsa_curve!(nist_p384, p384, 384);

impl CryptoProvider for EccProvider {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ecc
    }

    fn key_sizes(&self) -> &'static [u32] {
        &KEY_SIZES
    }

    fn generate(&self, bits: u32) -> Result<KeyMaterial, CryptoError> {
        let key = match bits {
            nist_p256::BITS => nist_p256::generate(),
            nist_p384::BITS => nist_p384::generate(),
            _ => Err(CryptoError::InvalidLength),
        }?;
        debug!(bits, "generated ECC key");
        Ok(key)
    }

    fn sign(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        _padding: Padding,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let hash = prehash(digest, data)?;
        match key.key_size() {
            nist_p256::BITS => nist_p256::sign(key, &hash),
            nist_p384::BITS => nist_p384::sign(key, &hash),
            _ => Err(CryptoError::InvalidLength),
        }
    }

    fn verify(
        &self,
        key: &KeyMaterial,
        digest: Digest,
        _padding: Padding,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let hash = prehash(digest, data)?;
        match key.key_size() {
            nist_p256::BITS => nist_p256::verify(key, &hash, signature),
            nist_p384::BITS => nist_p384::verify(key, &hash, signature),
            _ => Err(CryptoError::InvalidLength),
        }
    }

    fn to_external_public(&self, key: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
        match key.key_size() {
            nist_p256::BITS => nist_p256::to_spki(key),
            nist_p384::BITS => nist_p384::to_spki(key),
            _ => Err(CryptoError::InvalidLength),
        }
    }

    fn from_external_public(&self, der: &[u8]) -> Result<KeyMaterial, CryptoError> {
        nist_p256::from_spki(der).or_else(|_| nist_p384::from_spki(der))
    }
}
