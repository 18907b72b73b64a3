// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, trace};

use crate::blob::Blob;
use crate::check::{self, KeySpec, OpSpec, Operation};
use crate::error::{HuksError, Result};
use crate::hash::{digest_len, prehash};
use crate::key_material::KeyMaterial;
use crate::param::{Digest, ParamSet, UintTag};
use crate::provider::{self, CryptoError, CryptoProvider};
use crate::store::{KeyStore, StoredKey};

/// How an operation names its key.
#[derive(Debug, Clone, Copy)]
pub enum KeyHandle<'a> {
    /// A key material record held by the caller.
    Material(&'a [u8]),
    /// The auth id of a key kept in the store.
    Alias(&'a [u8]),
}

enum ResolvedKey {
    Stored(Arc<StoredKey>),
    Local(KeyMaterial),
}

impl ResolvedKey {
    fn material(&self) -> &KeyMaterial {
        match self {
            ResolvedKey::Stored(key) => &key.material,
            ResolvedKey::Local(material) => material,
        }
    }

    fn spec(&self) -> Option<&KeySpec> {
        match self {
            ResolvedKey::Stored(key) => Some(&key.spec),
            ResolvedKey::Local(_) => None,
        }
    }
}

struct Prepared {
    key: ResolvedKey,
    provider: &'static dyn CryptoProvider,
    op: OpSpec,
}

fn prepare(
    store: &KeyStore,
    key: KeyHandle<'_>,
    op: Operation,
    params: &ParamSet,
) -> Result<Prepared> {
    params.ensure_built()?;
    let need_private = matches!(op, Operation::Sign | Operation::Decrypt);
    let key = match key {
        KeyHandle::Alias(alias) => ResolvedKey::Stored(store.lookup(alias)?),
        KeyHandle::Material(data) => {
            ResolvedKey::Local(KeyMaterial::decode(data, need_private)?)
        },
    };
    let material = key.material();
    if need_private && !material.has_private() {
        return Err(HuksError::MissingComponent(material.private_name()));
    }
    let alg = material.algorithm();
    let provider =
        provider::for_algorithm(alg).ok_or(HuksError::UnsupportedAlgorithm(alg.value()))?;
    let op = check::check_operation(op, alg, key.spec(), params)?;
    Ok(Prepared { key, provider, op })
}

/// Signs `data` and writes the signature into `out`.
pub fn sign(
    store: &KeyStore,
    key: KeyHandle<'_>,
    params: &ParamSet,
    data: &[u8],
    out: &mut Blob,
) -> Result<()> {
    let Prepared { key, provider, op } = prepare(store, key, Operation::Sign, params)?;
    let signature = provider.sign(key.material(), op.digest, op.padding, data)?;
    debug!(
        alg = key.material().algorithm().as_str(),
        len = signature.len(),
        "signed"
    );
    out.fill(&signature)
}

/// `Ok(false)` when the signature is well formed but does not match `data`.
pub fn verify(
    store: &KeyStore,
    key: KeyHandle<'_>,
    params: &ParamSet,
    data: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let Prepared { key, provider, op } = prepare(store, key, Operation::Verify, params)?;
    let valid = provider.verify(key.material(), op.digest, op.padding, data, signature)?;
    debug!(alg = key.material().algorithm().as_str(), valid, "verified");
    Ok(valid)
}

pub fn encrypt(
    store: &KeyStore,
    key: KeyHandle<'_>,
    params: &ParamSet,
    data: &[u8],
    out: &mut Blob,
) -> Result<()> {
    let Prepared { key, provider, op } = prepare(store, key, Operation::Encrypt, params)?;
    let ciphertext = provider.encrypt(key.material(), op.digest, op.padding, data)?;
    out.fill(&ciphertext)
}

pub fn decrypt(
    store: &KeyStore,
    key: KeyHandle<'_>,
    params: &ParamSet,
    data: &[u8],
    out: &mut Blob,
) -> Result<()> {
    let Prepared { key, provider, op } = prepare(store, key, Operation::Decrypt, params)?;
    let plaintext = provider.decrypt(key.material(), op.digest, op.padding, data)?;
    out.fill(&plaintext)
}

/// Digest of `data` using the `DIGEST` parameter.
pub fn hash(params: &ParamSet, data: &[u8], out: &mut Blob) -> Result<()> {
    params.ensure_built()?;
    let raw = params.get_u32(UintTag::Digest)?;
    let (digest, len) = Digest::try_from(raw)
        .ok()
        .and_then(|digest| Some((digest, digest_len(digest)?)))
        .ok_or(HuksError::InvalidDigest(raw))?;
    out.ensure_capacity(len)?;
    let hashed = prehash(digest, data)?;
    trace!(digest = digest.as_str(), len = hashed.len(), "hashed");
    out.fill(&hashed)
}

/// Fills the whole capacity of `out` with random bytes.
pub fn generate_random(out: &mut Blob) -> Result<()> {
    let capacity = out.capacity();
    let rng = SystemRandom::new();
    if rng.fill(out.spare_mut()).is_err() {
        out.clear();
        return Err(CryptoError::OperationFailed(Some("random source failed".into())).into());
    }
    out.set_len(capacity);
    Ok(())
}
