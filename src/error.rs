// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use crate::param::Tag;
use crate::provider::CryptoError;

pub type Result<T> = std::result::Result<T, HuksError>;

/// Closed set of failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    Policy,
    Provider,
    Capacity,
    NotFound,
    Allocation,
}

#[derive(Debug)]
pub enum HuksError {
    // structural
    DuplicateTag(Tag),
    ParamSetBuilt,
    ParamSetNotBuilt,
    ParamSetEmpty,
    MalformedParamSet(&'static str),
    MalformedKeyMaterial(&'static str),
    MissingComponent(&'static str),
    MalformedSignature,
    KeyBusy,
    StoreClosed,

    // policy
    UnsupportedAlgorithm(u32),
    InvalidKeySize(u32),
    InvalidPurpose(u32),
    InvalidDigest(u32),
    InvalidPadding(u32),
    InvalidAuthId,
    InconsistentStorage,
    ParamMismatch(Tag),
    StoreFull,

    Provider(CryptoError),

    BufferTooSmall { needed: usize, capacity: usize },

    TagNotFound(Tag),
    KeyNotFound,

    AllocationFailure(usize),
}

impl HuksError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HuksError::DuplicateTag(_)
            | HuksError::ParamSetBuilt
            | HuksError::ParamSetNotBuilt
            | HuksError::ParamSetEmpty
            | HuksError::MalformedParamSet(_)
            | HuksError::MalformedKeyMaterial(_)
            | HuksError::MissingComponent(_)
            | HuksError::MalformedSignature
            | HuksError::KeyBusy
            | HuksError::StoreClosed => ErrorKind::Structural,
            HuksError::UnsupportedAlgorithm(_)
            | HuksError::InvalidKeySize(_)
            | HuksError::InvalidPurpose(_)
            | HuksError::InvalidDigest(_)
            | HuksError::InvalidPadding(_)
            | HuksError::InvalidAuthId
            | HuksError::InconsistentStorage
            | HuksError::ParamMismatch(_)
            | HuksError::StoreFull => ErrorKind::Policy,
            HuksError::Provider(_) => ErrorKind::Provider,
            HuksError::BufferTooSmall { .. } => ErrorKind::Capacity,
            HuksError::TagNotFound(_) | HuksError::KeyNotFound => ErrorKind::NotFound,
            HuksError::AllocationFailure(_) => ErrorKind::Allocation,
        }
    }
}

impl fmt::Display for HuksError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HuksError::DuplicateTag(tag) => write!(f, "Duplicate tag {tag:?}"),
            HuksError::ParamSetBuilt => write!(f, "Param set is already built"),
            HuksError::ParamSetNotBuilt => write!(f, "Param set is not built"),
            HuksError::ParamSetEmpty => write!(f, "Param set is empty"),
            HuksError::MalformedParamSet(msg) => write!(f, "Malformed param set: {msg}"),
            HuksError::MalformedKeyMaterial(msg) => write!(f, "Malformed key material: {msg}"),
            HuksError::MissingComponent(name) => write!(f, "Missing key component '{name}'"),
            HuksError::MalformedSignature => write!(f, "Malformed signature"),
            HuksError::KeyBusy => write!(f, "Key is being generated"),
            HuksError::StoreClosed => write!(f, "Key store is closed"),
            HuksError::UnsupportedAlgorithm(alg) => write!(f, "Unsupported algorithm {alg}"),
            HuksError::InvalidKeySize(size) => write!(f, "Invalid key size {size}"),
            HuksError::InvalidPurpose(purpose) => write!(f, "Invalid purpose {purpose:#x}"),
            HuksError::InvalidDigest(digest) => write!(f, "Invalid digest {digest}"),
            HuksError::InvalidPadding(padding) => write!(f, "Invalid padding {padding}"),
            HuksError::InvalidAuthId => write!(f, "Invalid auth id"),
            HuksError::InconsistentStorage => {
                write!(f, "Storage flag is inconsistent with auth id")
            },
            HuksError::ParamMismatch(tag) => {
                write!(f, "{tag:?} does not match the key parameters")
            },
            HuksError::StoreFull => write!(f, "Key store is full"),
            HuksError::Provider(err) => write!(f, "Provider failure: {err}"),
            HuksError::BufferTooSmall { needed, capacity } => {
                write!(f, "Buffer too small: need {needed} bytes, capacity {capacity}")
            },
            HuksError::TagNotFound(tag) => write!(f, "Tag {tag:?} not found"),
            HuksError::KeyNotFound => write!(f, "Key not found"),
            HuksError::AllocationFailure(size) => write!(f, "Failed to allocate {size} bytes"),
        }
    }
}

impl std::error::Error for HuksError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HuksError::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CryptoError> for HuksError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidSignature => HuksError::MalformedSignature,
            err => HuksError::Provider(err),
        }
    }
}
