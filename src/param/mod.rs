// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
mod tag;
mod wire;

pub use tag::*;
pub use wire::{ENTRY_SIZE, HEADER_SIZE};

use tracing::trace;

use crate::error::{HuksError, Result};

/// One tagged value. The variant fixes the value kind for the tag family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Uint(UintTag, u32),
    Bool(BoolTag, bool),
    Bytes(BytesTag, Vec<u8>),
}

impl Param {
    pub fn tag(&self) -> Tag {
        match self {
            Param::Uint(tag, _) => Tag::Uint(*tag),
            Param::Bool(tag, _) => Tag::Bool(*tag),
            Param::Bytes(tag, _) => Tag::Bytes(*tag),
        }
    }

    fn data_len(&self) -> usize {
        match self {
            Param::Bytes(_, bytes) => bytes.len(),
            _ => 0,
        }
    }
}

/// Ordered collection of tagged parameters.
///
/// A set is filled with [`ParamSet::add`] and frozen with [`ParamSet::build`].
/// Tags are unique within a set: adding a tag that is already present is
/// rejected and leaves the set untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    params: Vec<Param>,
    built: bool,
    total_size: u32,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ParamSetBuilder {
        ParamSetBuilder::default()
    }

    pub fn add(&mut self, params: &[Param]) -> Result<()> {
        if self.built {
            return Err(HuksError::ParamSetBuilt);
        }
        for (i, param) in params.iter().enumerate() {
            let tag = param.tag();
            if self.contains(tag) || params[..i].iter().any(|p| p.tag() == tag) {
                return Err(HuksError::DuplicateTag(tag));
            }
        }
        self.params
            .try_reserve(params.len())
            .map_err(|_| HuksError::AllocationFailure(params.len()))?;
        self.params.extend_from_slice(params);
        Ok(())
    }

    pub fn build(&mut self) -> Result<()> {
        if self.built {
            return Err(HuksError::ParamSetBuilt);
        }
        if self.params.is_empty() {
            return Err(HuksError::ParamSetEmpty);
        }
        let total = self.params.iter().try_fold(
            HEADER_SIZE + ENTRY_SIZE * self.params.len(),
            |acc, param| acc.checked_add(param.data_len()),
        );
        self.total_size = total
            .and_then(|total| u32::try_from(total).ok())
            .ok_or(HuksError::MalformedParamSet("set exceeds the u32 size field"))?;
        self.built = true;
        trace!(
            count = self.params.len(),
            size = self.total_size,
            "param set built"
        );
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn ensure_built(&self) -> Result<()> {
        if self.built {
            Ok(())
        } else {
            Err(HuksError::ParamSetNotBuilt)
        }
    }

    /// Serialized size in bytes. Zero until the set is built.
    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    pub fn contains(&self, tag: impl Into<Tag>) -> bool {
        let tag = tag.into();
        self.params.iter().any(|p| p.tag() == tag)
    }

    pub fn get(&self, tag: impl Into<Tag>) -> Result<&Param> {
        let tag = tag.into();
        self.params
            .iter()
            .find(|p| p.tag() == tag)
            .ok_or(HuksError::TagNotFound(tag))
    }

    pub fn get_u32(&self, tag: UintTag) -> Result<u32> {
        match self.get(tag)? {
            Param::Uint(_, value) => Ok(*value),
            _ => Err(HuksError::TagNotFound(tag.into())),
        }
    }

    pub fn get_bool(&self, tag: BoolTag) -> Result<bool> {
        match self.get(tag)? {
            Param::Bool(_, value) => Ok(*value),
            _ => Err(HuksError::TagNotFound(tag.into())),
        }
    }

    pub fn get_bytes(&self, tag: BytesTag) -> Result<&[u8]> {
        match self.get(tag)? {
            Param::Bytes(_, value) => Ok(value),
            _ => Err(HuksError::TagNotFound(tag.into())),
        }
    }

    pub fn find_u32(&self, tag: UintTag) -> Option<u32> {
        self.get_u32(tag).ok()
    }

    pub fn find_bool(&self, tag: BoolTag) -> Option<bool> {
        self.get_bool(tag).ok()
    }

    pub fn find_bytes(&self, tag: BytesTag) -> Option<&[u8]> {
        self.get_bytes(tag).ok()
    }
}

impl<'a> IntoIterator for &'a ParamSet {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Default)]
pub struct ParamSetBuilder {
    params: Vec<Param>,
}

impl ParamSetBuilder {
    pub fn uint(mut self, tag: UintTag, value: impl Into<u32>) -> Self {
        self.params.push(Param::Uint(tag, value.into()));
        self
    }

    pub fn boolean(mut self, tag: BoolTag, value: bool) -> Self {
        self.params.push(Param::Bool(tag, value));
        self
    }

    pub fn bytes(mut self, tag: BytesTag, value: impl Into<Vec<u8>>) -> Self {
        self.params.push(Param::Bytes(tag, value.into()));
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn build(self) -> Result<ParamSet> {
        let mut set = ParamSet::new();
        set.add(&self.params)?;
        set.build()?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn dsa_params() -> Vec<Param> {
        vec![
            Param::Uint(UintTag::Algorithm, Algorithm::Dsa.value()),
            Param::Uint(UintTag::KeySize, 1024),
            Param::Uint(UintTag::Purpose, purpose::SIGN | purpose::VERIFY),
        ]
    }

    #[test]
    fn build_computes_total_size() {
        let mut set = ParamSet::new();
        set.add(&dsa_params()).unwrap();
        set.add(&[Param::Bytes(BytesTag::KeyAuthId, b"abc".to_vec())])
            .unwrap();
        assert_eq!(set.total_size(), 0);
        set.build().unwrap();
        assert!(set.is_built());
        assert_eq!(set.total_size() as usize, 8 + 12 * 4 + 3);
    }

    #[test]
    fn empty_build_is_structural() {
        let err = ParamSet::new().build().unwrap_err();
        assert!(matches!(err, HuksError::ParamSetEmpty));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn built_set_is_frozen() {
        let mut set = ParamSet::new();
        set.add(&dsa_params()).unwrap();
        set.build().unwrap();
        let err = set
            .add(&[Param::Uint(UintTag::Digest, Digest::Sha256.value())])
            .unwrap_err();
        assert!(matches!(err, HuksError::ParamSetBuilt));
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(matches!(set.build(), Err(HuksError::ParamSetBuilt)));
    }

    #[test]
    fn duplicate_add_is_atomic() {
        let mut set = ParamSet::new();
        set.add(&dsa_params()).unwrap();
        let err = set
            .add(&[
                Param::Uint(UintTag::Digest, Digest::Sha1.value()),
                Param::Uint(UintTag::KeySize, 2048),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            HuksError::DuplicateTag(Tag::Uint(UintTag::KeySize))
        ));
        assert_eq!(set.len(), 3);
        assert!(!set.contains(UintTag::Digest));
        assert_eq!(set.get_u32(UintTag::KeySize).unwrap(), 1024);
    }

    #[test]
    fn duplicate_within_one_call() {
        let mut set = ParamSet::new();
        let err = set
            .add(&[
                Param::Bool(BoolTag::IsKeyAlias, true),
                Param::Bool(BoolTag::IsKeyAlias, false),
            ])
            .unwrap_err();
        assert!(matches!(err, HuksError::DuplicateTag(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn lookup_by_family() {
        let set = ParamSet::builder()
            .uint(UintTag::Algorithm, Algorithm::Rsa)
            .boolean(BoolTag::IsKeyAlias, true)
            .bytes(BytesTag::KeyAuthId, "alias")
            .build()
            .unwrap();
        assert_eq!(set.get_u32(UintTag::Algorithm).unwrap(), 1);
        assert!(set.get_bool(BoolTag::IsKeyAlias).unwrap());
        assert_eq!(set.get_bytes(BytesTag::KeyAuthId).unwrap(), b"alias");
        let err = set.get(UintTag::Padding).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(set.find_u32(UintTag::Padding), None);
    }
}
