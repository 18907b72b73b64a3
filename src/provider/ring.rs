// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use ring::digest;

use crate::param::Digest;
use crate::provider::rust::RustDigest;
use crate::provider::{CryptoError, DigestProvider, SimpleDigest};

pub struct RingRustDigestProvider;

/// SHA-1 and the SHA-2 sizes ring ships; MD5 and SHA-224 go to RustCrypto.
pub enum RingRustDigest {
    Ring(digest::Context),
    Rust(RustDigest),
}

impl SimpleDigest for RingRustDigest {
    fn update(&mut self, data: &[u8]) {
        match self {
            RingRustDigest::Ring(ctx) => ctx.update(data),
            RingRustDigest::Rust(d) => d.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            RingRustDigest::Ring(ctx) => ctx.finish().as_ref().to_vec(),
            RingRustDigest::Rust(d) => d.finalize(),
        }
    }
}

impl DigestProvider for RingRustDigestProvider {
    type Digest = RingRustDigest;

    fn digest(&self, algorithm: Digest) -> Result<Self::Digest, CryptoError> {
        let ring_alg = match algorithm {
            Digest::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Digest::Sha256 => &digest::SHA256,
            Digest::Sha384 => &digest::SHA384,
            Digest::Sha512 => &digest::SHA512,
            _ => return RustDigest::new(algorithm).map(RingRustDigest::Rust),
        };
        Ok(RingRustDigest::Ring(digest::Context::new(ring_alg)))
    }
}
