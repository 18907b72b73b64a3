// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest as _, Sha224, Sha256, Sha384, Sha512};

use crate::param::Digest;
use crate::provider::{CryptoError, DigestProvider, SimpleDigest};

// Digest implementation using sha1/sha2/md5 crates
pub enum RustDigest {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl RustDigest {
    pub fn new(algorithm: Digest) -> Result<Self, CryptoError> {
        Ok(match algorithm {
            Digest::Md5 => RustDigest::Md5(Md5::new()),
            Digest::Sha1 => RustDigest::Sha1(Sha1::new()),
            Digest::Sha224 => RustDigest::Sha224(Sha224::new()),
            Digest::Sha256 => RustDigest::Sha256(Sha256::new()),
            Digest::Sha384 => RustDigest::Sha384(Sha384::new()),
            Digest::Sha512 => RustDigest::Sha512(Sha512::new()),
            Digest::None => return Err(CryptoError::UnsupportedAlgorithm),
        })
    }
}

impl SimpleDigest for RustDigest {
    fn update(&mut self, data: &[u8]) {
        match self {
            RustDigest::Md5(h) => h.update(data),
            RustDigest::Sha1(h) => h.update(data),
            RustDigest::Sha224(h) => h.update(data),
            RustDigest::Sha256(h) => h.update(data),
            RustDigest::Sha384(h) => h.update(data),
            RustDigest::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            RustDigest::Md5(h) => h.finalize().to_vec(),
            RustDigest::Sha1(h) => h.finalize().to_vec(),
            RustDigest::Sha224(h) => h.finalize().to_vec(),
            RustDigest::Sha256(h) => h.finalize().to_vec(),
            RustDigest::Sha384(h) => h.finalize().to_vec(),
            RustDigest::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

#[cfg_attr(feature = "crypto-ring-rust", allow(dead_code))]
pub struct RustDigestProvider;

impl DigestProvider for RustDigestProvider {
    type Digest = RustDigest;

    fn digest(&self, algorithm: Digest) -> Result<Self::Digest, CryptoError> {
        RustDigest::new(algorithm)
    }
}
