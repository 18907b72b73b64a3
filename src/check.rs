// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Policy tables for key creation and key use.
use tracing::warn;

use crate::config::StoreConfig;
use crate::error::{HuksError, Result};
use crate::param::{
    purpose, Algorithm, BoolTag, Digest, Padding, ParamSet, StorageFlag, Tag, UintTag,
};
use crate::provider;

const DSA_DIGESTS: [Digest; 5] = [
    Digest::Sha1,
    Digest::Sha224,
    Digest::Sha256,
    Digest::Sha384,
    Digest::Sha512,
];

const RSA_DIGESTS: [Digest; 7] = [
    Digest::Md5,
    Digest::None,
    Digest::Sha1,
    Digest::Sha224,
    Digest::Sha256,
    Digest::Sha384,
    Digest::Sha512,
];

const ECC_DIGESTS: [Digest; 6] = [
    Digest::None,
    Digest::Sha1,
    Digest::Sha224,
    Digest::Sha256,
    Digest::Sha384,
    Digest::Sha512,
];

const RSA_SIGN_PADDINGS: [Padding; 2] = [Padding::Pss, Padding::Pkcs1V15];
const RSA_CIPHER_PADDINGS: [Padding; 2] = [Padding::Oaep, Padding::Pkcs1V15];

const DSA_INVALID_PURPOSE: u32 = purpose::DERIVE
    | purpose::MAC
    | purpose::WRAP
    | purpose::UNWRAP
    | purpose::ENCRYPT
    | purpose::DECRYPT
    | purpose::AGREE;
const ECC_INVALID_PURPOSE: u32 = purpose::DERIVE
    | purpose::MAC
    | purpose::WRAP
    | purpose::UNWRAP
    | purpose::ENCRYPT
    | purpose::DECRYPT;
const RSA_INVALID_PURPOSE: u32 =
    purpose::DERIVE | purpose::MAC | purpose::WRAP | purpose::UNWRAP | purpose::AGREE;

const SIGN_GROUP: u32 = purpose::SIGN | purpose::VERIFY;
const CIPHER_GROUP: u32 = purpose::ENCRYPT | purpose::DECRYPT;

/// Operations a key can be used for after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Sign,
    Verify,
    Encrypt,
    Decrypt,
}

impl Operation {
    pub fn purpose(self) -> u32 {
        match self {
            Operation::Sign => purpose::SIGN,
            Operation::Verify => purpose::VERIFY,
            Operation::Encrypt => purpose::ENCRYPT,
            Operation::Decrypt => purpose::DECRYPT,
        }
    }

    fn is_sign(self) -> bool {
        matches!(self, Operation::Sign | Operation::Verify)
    }
}

/// Validated creation parameters of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub alg: Algorithm,
    pub key_size: u32,
    pub purpose: u32,
    pub digest: Option<Digest>,
    pub padding: Option<Padding>,
}

/// Digest and padding resolved for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec {
    pub digest: Digest,
    pub padding: Padding,
}

fn key_sizes(alg: Algorithm) -> &'static [u32] {
    provider::for_algorithm(alg)
        .map(|provider| provider.key_sizes())
        .unwrap_or_default()
}

fn digests(alg: Algorithm) -> &'static [Digest] {
    match alg {
        Algorithm::Dsa => &DSA_DIGESTS,
        Algorithm::Rsa => &RSA_DIGESTS,
        Algorithm::Ecc => &ECC_DIGESTS,
        _ => &[],
    }
}

fn invalid_purpose(alg: Algorithm) -> u32 {
    match alg {
        Algorithm::Dsa => DSA_INVALID_PURPOSE,
        Algorithm::Rsa => RSA_INVALID_PURPOSE,
        Algorithm::Ecc => ECC_INVALID_PURPOSE,
        _ => purpose::ALL,
    }
}

fn paddings(alg: Algorithm, signing: bool) -> &'static [Padding] {
    match (alg, signing) {
        (Algorithm::Rsa, true) => &RSA_SIGN_PADDINGS,
        (Algorithm::Rsa, false) => &RSA_CIPHER_PADDINGS,
        _ => &[Padding::None],
    }
}

/// Exactly one of cipher, sign, derive, wrap, mac, agree.
fn check_purpose_unique(value: u32) -> Result<()> {
    let groups = [
        CIPHER_GROUP,
        SIGN_GROUP,
        purpose::DERIVE,
        purpose::WRAP | purpose::UNWRAP,
        purpose::MAC,
        purpose::AGREE,
    ];
    let count = groups.iter().filter(|group| value & **group != 0).count();
    if count == 1 && value & !purpose::ALL == 0 {
        Ok(())
    } else {
        Err(HuksError::InvalidPurpose(value))
    }
}

pub fn algorithm(params: &ParamSet) -> Result<Algorithm> {
    let raw = params.get_u32(UintTag::Algorithm)?;
    let alg = Algorithm::try_from(raw).map_err(HuksError::UnsupportedAlgorithm)?;
    if provider::for_algorithm(alg).is_none() {
        return Err(HuksError::UnsupportedAlgorithm(raw));
    }
    Ok(alg)
}

fn digest_value(raw: u32, alg: Algorithm) -> Result<Digest> {
    Digest::try_from(raw)
        .ok()
        .filter(|digest| digests(alg).contains(digest))
        .ok_or(HuksError::InvalidDigest(raw))
}

fn padding_value(raw: u32, alg: Algorithm, signing: bool) -> Result<Padding> {
    Padding::try_from(raw)
        .ok()
        .filter(|padding| paddings(alg, signing).contains(padding))
        .ok_or(HuksError::InvalidPadding(raw))
}

/// PSS and OAEP hash the message inside the padding and need a real digest.
fn check_padding_digest(padding: Padding, digest: Digest) -> Result<()> {
    match (padding, digest) {
        (Padding::Pss | Padding::Oaep, Digest::None) => {
            warn!(?padding, "padding needs a digest");
            Err(HuksError::InvalidDigest(digest.value()))
        },
        _ => Ok(()),
    }
}

/// Validates the parameters a key is generated or imported with.
pub fn check_key_params(params: &ParamSet) -> Result<KeySpec> {
    params.ensure_built()?;
    let alg = algorithm(params)?;

    let key_size = params.get_u32(UintTag::KeySize)?;
    if !key_sizes(alg).contains(&key_size) {
        return Err(HuksError::InvalidKeySize(key_size));
    }

    let purpose = params.get_u32(UintTag::Purpose)?;
    check_purpose_unique(purpose)?;
    if purpose & invalid_purpose(alg) != 0 {
        return Err(HuksError::InvalidPurpose(purpose));
    }
    let signing = purpose & SIGN_GROUP != 0;

    let digest = digest_value(params.get_u32(UintTag::Digest)?, alg)?;

    let padding = match params.find_u32(UintTag::Padding) {
        Some(raw) => Some(padding_value(raw, alg, signing)?),
        None if alg == Algorithm::Rsa => {
            return Err(HuksError::TagNotFound(Tag::Uint(UintTag::Padding)))
        },
        None => None,
    };
    if let Some(padding) = padding {
        check_padding_digest(padding, digest)?;
    }

    Ok(KeySpec {
        alg,
        key_size,
        purpose,
        digest: Some(digest),
        padding,
    })
}

/// Validates the auth id against the storage related tags and returns the
/// storage class the key ends up in.
pub fn check_storage(
    params: &ParamSet,
    auth_id: Option<&[u8]>,
    config: &StoreConfig,
) -> Result<StorageFlag> {
    if let Some(auth_id) = auth_id {
        if auth_id.is_empty() || auth_id.len() > config.max_auth_id_len {
            warn!(len = auth_id.len(), "rejected auth id");
            return Err(HuksError::InvalidAuthId);
        }
    }
    if params.find_bool(BoolTag::IsKeyAlias) == Some(true) && auth_id.is_none() {
        return Err(HuksError::InvalidAuthId);
    }
    let storage = match params.find_u32(UintTag::KeyStorageFlag) {
        Some(raw) => StorageFlag::try_from(raw).map_err(|_| HuksError::InconsistentStorage)?,
        None if auth_id.is_some() => StorageFlag::Persistent,
        None => StorageFlag::Temp,
    };
    match (storage, auth_id) {
        (StorageFlag::Persistent, Some(_)) | (StorageFlag::Temp, None) => Ok(storage),
        _ => Err(HuksError::InconsistentStorage),
    }
}

/// Checks an operation's parameters against the key and resolves the
/// digest and padding to use. `key` is `None` for raw material, in which
/// case only the operation's own parameters are checked.
pub fn check_operation(
    op: Operation,
    alg: Algorithm,
    key: Option<&KeySpec>,
    params: &ParamSet,
) -> Result<OpSpec> {
    params.ensure_built()?;

    if let Some(raw) = params.find_u32(UintTag::Algorithm) {
        if raw != alg.value() {
            return Err(HuksError::ParamMismatch(Tag::Uint(UintTag::Algorithm)));
        }
    }

    let granted = match key {
        Some(key) => Some(key.purpose),
        None => params.find_u32(UintTag::Purpose),
    };
    if let Some(granted) = granted {
        if granted & op.purpose() == 0 {
            warn!(?op, purpose = granted, "operation not covered by key purpose");
            return Err(HuksError::InvalidPurpose(granted));
        }
    }
    if invalid_purpose(alg) & op.purpose() != 0 {
        return Err(HuksError::InvalidPurpose(op.purpose()));
    }

    let requested_digest = params.find_u32(UintTag::Digest);
    let stored_digest = key.and_then(|key| key.digest).map(Digest::value);
    let digest = resolve(UintTag::Digest, requested_digest, stored_digest)?
        .ok_or(HuksError::TagNotFound(Tag::Uint(UintTag::Digest)))?;
    let digest = digest_value(digest, alg)?;

    let requested_padding = params.find_u32(UintTag::Padding);
    let stored_padding = key.and_then(|key| key.padding).map(Padding::value);
    let padding = match resolve(UintTag::Padding, requested_padding, stored_padding)? {
        Some(raw) => padding_value(raw, alg, op.is_sign())?,
        None if alg == Algorithm::Rsa => {
            return Err(HuksError::TagNotFound(Tag::Uint(UintTag::Padding)))
        },
        None => Padding::None,
    };
    check_padding_digest(padding, digest)?;

    Ok(OpSpec { digest, padding })
}

/// An operation value must equal the key's value when both are present.
fn resolve(tag: UintTag, requested: Option<u32>, stored: Option<u32>) -> Result<Option<u32>> {
    match (requested, stored) {
        (Some(requested), Some(stored)) if requested != stored => {
            warn!(tag = tag.as_str(), requested, stored, "operation parameter mismatch");
            Err(HuksError::ParamMismatch(Tag::Uint(tag)))
        },
        (requested, stored) => Ok(requested.or(stored)),
    }
}
