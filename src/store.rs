// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::collections::{hash_map::Entry, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::blob::Blob;
use crate::check::{self, KeySpec};
use crate::config::{StoreConfig, ENV_CONFIG};
use crate::error::{HuksError, Result};
use crate::key_material::{KeyMaterial, KeyPart};
use crate::param::{purpose, BytesTag, KeyFlag, Param, ParamSet, StorageFlag, Tag, UintTag};
use crate::provider;

/// Where an alias is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Absent,
    Generating,
    Ready,
}

/// A persistent key as held by the store. Entries are shared out by `Arc`, so
/// operations running on a key are not affected by a concurrent delete.
#[derive(Debug)]
pub(crate) struct StoredKey {
    pub(crate) material: KeyMaterial,
    pub(crate) spec: KeySpec,
    pub(crate) params: ParamSet,
    pub(crate) flag: KeyFlag,
}

#[derive(Debug)]
enum Slot {
    Generating,
    Ready(Arc<StoredKey>),
}

#[derive(Debug, Default)]
struct Inner {
    keys: HashMap<Vec<u8>, Slot>,
    closed: bool,
}

impl Inner {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(HuksError::StoreClosed)
        } else {
            Ok(())
        }
    }
}

/// Alias table for persistent keys.
///
/// Cloning yields another handle to the same table. The lock is only held
/// while the table is read or mutated, never while a key is generated or
/// used.
#[derive(Debug, Clone)]
pub struct KeyStore {
    inner: Arc<RwLock<Inner>>,
    config: Arc<StoreConfig>,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a `Generating` slot again unless the generation completed.
struct Reservation<'a> {
    store: &'a KeyStore,
    alias: &'a [u8],
    armed: bool,
}

impl Reservation<'_> {
    fn complete(mut self, key: StoredKey) -> Result<()> {
        let mut inner = self.store.inner.write();
        inner.ensure_open()?;
        inner
            .keys
            .insert(self.alias.to_vec(), Slot::Ready(Arc::new(key)));
        self.armed = false;
        Ok(())
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.store.inner.write();
        if let Some(Slot::Generating) = inner.keys.get(self.alias) {
            inner.keys.remove(self.alias);
            debug!(alias_len = self.alias.len(), "key generation abandoned");
        }
    }
}

impl KeyStore {
    /// A store using the limits from the environment.
    pub fn new() -> Self {
        Self::with_config(ENV_CONFIG.clone())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn reserve<'a>(&'a self, alias: &'a [u8]) -> Result<Reservation<'a>> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        let count = inner.keys.len();
        match inner.keys.entry(alias.to_vec()) {
            Entry::Occupied(mut entry) => match entry.get() {
                Slot::Generating => return Err(HuksError::KeyBusy),
                Slot::Ready(_) => {
                    debug!(alias_len = alias.len(), "overwriting key");
                    entry.insert(Slot::Generating);
                },
            },
            Entry::Vacant(entry) => {
                if count >= self.config.max_key_count {
                    warn!(count, "key store is full");
                    return Err(HuksError::StoreFull);
                }
                entry.insert(Slot::Generating);
            },
        }
        Ok(Reservation {
            store: self,
            alias,
            armed: true,
        })
    }

    pub(crate) fn lookup(&self, alias: &[u8]) -> Result<Arc<StoredKey>> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        match inner.keys.get(alias) {
            Some(Slot::Ready(key)) => Ok(Arc::clone(key)),
            Some(Slot::Generating) => Err(HuksError::KeyBusy),
            None => Err(HuksError::KeyNotFound),
        }
    }

    /// Generates a key pair.
    ///
    /// With an auth id the key is kept under that alias and only its public
    /// record is written to `out_params`. Without one the key is temporary
    /// and both records are handed back to the caller. `out_params` must be
    /// unbuilt and is built on success; it is left untouched on failure.
    pub fn generate_key(
        &self,
        auth_id: Option<&[u8]>,
        in_params: &ParamSet,
        out_params: &mut ParamSet,
    ) -> Result<()> {
        self.inner.read().ensure_open()?;
        in_params.ensure_built()?;
        if out_params.is_built() {
            return Err(HuksError::ParamSetBuilt);
        }
        let spec = check::check_key_params(in_params)?;
        let storage = check::check_storage(in_params, auth_id, &self.config)?;
        let provider = provider::for_algorithm(spec.alg)
            .ok_or(HuksError::UnsupportedAlgorithm(spec.alg.value()))?;

        let reservation = match (storage, auth_id) {
            (StorageFlag::Persistent, Some(alias)) => Some(self.reserve(alias)?),
            _ => None,
        };

        let material = provider.generate(spec.key_size)?;

        let mut out = out_params.clone();
        out.add(&[
            Param::Uint(UintTag::Algorithm, spec.alg.value()),
            Param::Uint(UintTag::KeySize, spec.key_size),
            Param::Bytes(
                BytesTag::AsymmetricPublicKeyData,
                material.to_vec(KeyPart::Public)?,
            ),
        ])?;
        if reservation.is_none() {
            out.add(&[Param::Bytes(
                BytesTag::AsymmetricPrivateKeyData,
                material.to_vec(KeyPart::Private)?,
            )])?;
        }
        out.build()?;

        if let Some(reservation) = reservation {
            reservation.complete(StoredKey {
                material,
                spec,
                params: in_params.clone(),
                flag: KeyFlag::Generated,
            })?;
        }
        *out_params = out;
        debug!(
            alg = spec.alg.as_str(),
            bits = spec.key_size,
            persistent = storage == StorageFlag::Persistent,
            "generated key"
        );
        Ok(())
    }

    /// Writes the SubjectPublicKeyInfo DER of a stored key into `out`.
    pub fn export_public_key(
        &self,
        auth_id: &[u8],
        in_params: Option<&ParamSet>,
        out: &mut Blob,
    ) -> Result<()> {
        let key = self.lookup(auth_id)?;
        if let Some(params) = in_params {
            params.ensure_built()?;
            if let Some(alg) = params.find_u32(UintTag::Algorithm) {
                if alg != key.spec.alg.value() {
                    return Err(HuksError::ParamMismatch(UintTag::Algorithm.into()));
                }
            }
        }
        let provider = provider::for_algorithm(key.spec.alg)
            .ok_or(HuksError::UnsupportedAlgorithm(key.spec.alg.value()))?;
        let der = provider.to_external_public(&key.material)?;
        out.fill(&der)
    }

    /// Stores a public key given as SubjectPublicKeyInfo DER under `auth_id`.
    pub fn import_key(&self, auth_id: &[u8], in_params: &ParamSet, key: &[u8]) -> Result<()> {
        self.inner.read().ensure_open()?;
        in_params.ensure_built()?;
        let spec = check::check_key_params(in_params)?;
        check::check_storage(in_params, Some(auth_id), &self.config)?;
        if spec.purpose & (purpose::SIGN | purpose::DECRYPT) != 0 {
            warn!(purpose = spec.purpose, "public key imported with a private purpose");
            return Err(HuksError::InvalidPurpose(spec.purpose));
        }
        let provider = provider::for_algorithm(spec.alg)
            .ok_or(HuksError::UnsupportedAlgorithm(spec.alg.value()))?;
        let material = provider.from_external_public(key)?;
        if material.key_size() != spec.key_size {
            return Err(HuksError::InvalidKeySize(material.key_size()));
        }

        let reservation = self.reserve(auth_id)?;
        reservation.complete(StoredKey {
            material,
            spec,
            params: in_params.clone(),
            flag: KeyFlag::Imported,
        })?;
        debug!(alias_len = auth_id.len(), alg = spec.alg.as_str(), "imported key");
        Ok(())
    }

    pub fn delete_key(&self, auth_id: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;
        match inner.keys.get(auth_id) {
            Some(Slot::Ready(_)) => {
                inner.keys.remove(auth_id);
                debug!(alias_len = auth_id.len(), "deleted key");
                Ok(())
            },
            Some(Slot::Generating) => Err(HuksError::KeyBusy),
            None => Err(HuksError::KeyNotFound),
        }
    }

    pub fn key_exist(&self, auth_id: &[u8]) -> Result<bool> {
        Ok(self.key_state(auth_id)? == KeyState::Ready)
    }

    pub fn key_state(&self, auth_id: &[u8]) -> Result<KeyState> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(match inner.keys.get(auth_id) {
            Some(Slot::Ready(_)) => KeyState::Ready,
            Some(Slot::Generating) => KeyState::Generating,
            None => KeyState::Absent,
        })
    }

    /// The parameters a stored key was created with, plus `KEY_FLAG`.
    pub fn get_key_param_set(&self, auth_id: &[u8]) -> Result<ParamSet> {
        let key = self.lookup(auth_id)?;
        let mut params: Vec<Param> = key
            .params
            .iter()
            .filter(|param| param.tag() != Tag::from(UintTag::KeyFlag))
            .cloned()
            .collect();
        params.push(Param::Uint(UintTag::KeyFlag, key.flag.value()));
        let mut set = ParamSet::new();
        set.add(&params)?;
        set.build()?;
        Ok(set)
    }

    /// Aliases of all ready keys in ascending byte order.
    pub fn list_aliases(&self) -> Result<Vec<Vec<u8>>> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let mut aliases: Vec<Vec<u8>> = inner
            .keys
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        Ok(aliases)
    }

    /// Drops every key. Later calls on any handle fail with `StoreClosed`.
    pub fn close(&self) {
        let mut inner = self.inner.write();
        let count = inner.keys.len();
        inner.keys.clear();
        inner.closed = true;
        debug!(count, "key store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::param::{Algorithm, BoolTag, Digest, Padding};

    fn ecc_params(purpose: u32) -> ParamSet {
        ParamSet::builder()
            .uint(UintTag::Algorithm, Algorithm::Ecc)
            .uint(UintTag::KeySize, 256u32)
            .uint(UintTag::Purpose, purpose)
            .uint(UintTag::Digest, Digest::Sha256)
            .build()
            .unwrap()
    }

    fn persistent(purpose: u32) -> ParamSet {
        ParamSet::builder()
            .uint(UintTag::Algorithm, Algorithm::Ecc)
            .uint(UintTag::KeySize, 256u32)
            .uint(UintTag::Purpose, purpose)
            .uint(UintTag::Digest, Digest::Sha256)
            .uint(UintTag::KeyStorageFlag, StorageFlag::Persistent)
            .boolean(BoolTag::IsKeyAlias, true)
            .build()
            .unwrap()
    }

    #[test]
    fn temporary_key_returns_both_records() {
        let store = KeyStore::with_config(StoreConfig::default());
        let mut out = ParamSet::new();
        store
            .generate_key(None, &ecc_params(purpose::SIGN | purpose::VERIFY), &mut out)
            .unwrap();
        assert!(out.is_built());
        let private = out.get_bytes(BytesTag::AsymmetricPrivateKeyData).unwrap();
        let public = out.get_bytes(BytesTag::AsymmetricPublicKeyData).unwrap();
        assert!(KeyMaterial::decode(private, true).unwrap().has_private());
        assert!(!KeyMaterial::decode(public, false).unwrap().has_private());
        assert!(store.list_aliases().unwrap().is_empty());
    }

    #[test]
    fn persistent_key_lifecycle() {
        let store = KeyStore::with_config(StoreConfig::default());
        let mut out = ParamSet::new();
        store
            .generate_key(Some(b"alias".as_slice()), &persistent(purpose::SIGN), &mut out)
            .unwrap();
        assert!(!out.contains(BytesTag::AsymmetricPrivateKeyData));
        assert_eq!(store.key_state(b"alias").unwrap(), KeyState::Ready);
        assert!(store.key_exist(b"alias").unwrap());

        let params = store.get_key_param_set(b"alias").unwrap();
        assert_eq!(
            params.get_u32(UintTag::KeyFlag).unwrap(),
            KeyFlag::Generated.value()
        );

        store.delete_key(b"alias").unwrap();
        assert!(!store.key_exist(b"alias").unwrap());
        let err = store.delete_key(b"alias").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn output_set_must_be_unbuilt() {
        let store = KeyStore::with_config(StoreConfig::default());
        let mut out = ParamSet::builder()
            .boolean(BoolTag::IsAllowedWrap, false)
            .build()
            .unwrap();
        let before = out.clone();
        let err = store
            .generate_key(None, &ecc_params(purpose::SIGN), &mut out)
            .unwrap_err();
        assert!(matches!(err, HuksError::ParamSetBuilt));
        assert_eq!(out, before);
    }

    #[test]
    fn failed_generation_leaves_no_entry() {
        let store = KeyStore::with_config(StoreConfig::default());
        let mut out = ParamSet::new();
        out.add(&[Param::Uint(UintTag::KeySize, 1)]).unwrap();
        let err = store
            .generate_key(Some(b"alias".as_slice()), &persistent(purpose::SIGN), &mut out)
            .unwrap_err();
        assert!(matches!(err, HuksError::DuplicateTag(_)));
        assert_eq!(store.key_state(b"alias").unwrap(), KeyState::Absent);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn pss_without_digest_is_refused_before_generation() {
        let store = KeyStore::with_config(StoreConfig::default());
        let params = ParamSet::builder()
            .uint(UintTag::Algorithm, Algorithm::Rsa)
            .uint(UintTag::KeySize, 2048u32)
            .uint(UintTag::Purpose, purpose::SIGN | purpose::VERIFY)
            .uint(UintTag::Digest, Digest::None)
            .uint(UintTag::Padding, Padding::Pss)
            .uint(UintTag::KeyStorageFlag, StorageFlag::Persistent)
            .boolean(BoolTag::IsKeyAlias, true)
            .build()
            .unwrap();
        let mut out = ParamSet::new();
        let err = store
            .generate_key(Some(b"rsa".as_slice()), &params, &mut out)
            .unwrap_err();
        assert!(matches!(err, HuksError::InvalidDigest(0)));
        assert_eq!(err.kind(), ErrorKind::Policy);
        assert_eq!(store.key_state(b"rsa").unwrap(), KeyState::Absent);
    }

    #[test]
    fn busy_alias_is_rejected() {
        let store = KeyStore::with_config(StoreConfig::default());
        let reservation = store.reserve(b"alias").unwrap();
        assert_eq!(store.key_state(b"alias").unwrap(), KeyState::Generating);
        assert!(matches!(store.reserve(b"alias"), Err(HuksError::KeyBusy)));
        assert!(matches!(store.delete_key(b"alias"), Err(HuksError::KeyBusy)));
        drop(reservation);
        assert_eq!(store.key_state(b"alias").unwrap(), KeyState::Absent);
    }

    #[test]
    fn store_full() {
        let store = KeyStore::with_config(StoreConfig {
            max_key_count: 1,
            ..StoreConfig::default()
        });
        let mut out = ParamSet::new();
        store
            .generate_key(Some(b"a".as_slice()), &persistent(purpose::SIGN), &mut out)
            .unwrap();
        let mut out = ParamSet::new();
        let err = store
            .generate_key(Some(b"b".as_slice()), &persistent(purpose::SIGN), &mut out)
            .unwrap_err();
        assert!(matches!(err, HuksError::StoreFull));
        let mut out = ParamSet::new();
        store
            .generate_key(Some(b"a".as_slice()), &persistent(purpose::VERIFY), &mut out)
            .unwrap();
    }

    #[test]
    fn import_exported_public_key() {
        let store = KeyStore::with_config(StoreConfig::default());
        let mut out = ParamSet::new();
        let params = persistent(purpose::SIGN | purpose::VERIFY);
        store
            .generate_key(Some(b"src".as_slice()), &params, &mut out)
            .unwrap();
        let mut der = Blob::with_capacity(256).unwrap();
        store.export_public_key(b"src", None, &mut der).unwrap();

        store
            .import_key(b"dst", &persistent(purpose::VERIFY), der.as_bytes())
            .unwrap();
        let params = store.get_key_param_set(b"dst").unwrap();
        assert_eq!(
            params.get_u32(UintTag::KeyFlag).unwrap(),
            KeyFlag::Imported.value()
        );
        assert!(matches!(
            store.import_key(b"dst", &persistent(purpose::SIGN), der.as_bytes()),
            Err(HuksError::InvalidPurpose(_))
        ));
        assert_eq!(
            store.list_aliases().unwrap(),
            vec![b"dst".to_vec(), b"src".to_vec()]
        );
    }

    #[test]
    fn export_into_small_blob() {
        let store = KeyStore::with_config(StoreConfig::default());
        let mut out = ParamSet::new();
        store
            .generate_key(Some(b"k".as_slice()), &persistent(purpose::SIGN), &mut out)
            .unwrap();
        let mut der = Blob::with_capacity(8).unwrap();
        let err = store.export_public_key(b"k", None, &mut der).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert!(der.is_empty());
    }

    #[test]
    fn closed_store_rejects_everything() {
        let store = KeyStore::with_config(StoreConfig::default());
        let handle = store.clone();
        store.close();
        assert!(matches!(handle.list_aliases(), Err(HuksError::StoreClosed)));
        let mut out = ParamSet::new();
        assert!(matches!(
            handle.generate_key(None, &ecc_params(purpose::SIGN), &mut out),
            Err(HuksError::StoreClosed)
        ));
    }
}
