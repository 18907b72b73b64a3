// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use once_cell::sync::Lazy;

use crate::param::Digest;
use crate::provider::{CryptoError, DefaultDigestProvider, DigestProvider, SimpleDigest};

static DIGEST_PROVIDER: Lazy<DefaultDigestProvider> = Lazy::new(|| DefaultDigestProvider {});

pub fn digest_len(digest: Digest) -> Option<usize> {
    match digest {
        Digest::None => None,
        Digest::Md5 => Some(16),
        Digest::Sha1 => Some(20),
        Digest::Sha224 => Some(28),
        Digest::Sha256 => Some(32),
        Digest::Sha384 => Some(48),
        Digest::Sha512 => Some(64),
    }
}

/// Hashes `data`. `Digest::None` passes the data through unchanged, which is
/// how callers hand in an already computed hash.
pub fn prehash(digest: Digest, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if digest == Digest::None {
        return Ok(data.to_vec());
    }
    let mut hasher = DIGEST_PROVIDER.digest(digest)?;
    hasher.update(data);
    Ok(hasher.finalize())
}
