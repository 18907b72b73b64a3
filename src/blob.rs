// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::error::{HuksError, Result};

/// Caller-allocated output buffer with a fixed capacity.
///
/// Producers write through [`Blob::fill`] or [`Blob::spare_mut`] and never
/// grow the buffer, so an undersized blob always fails with
/// [`HuksError::BufferTooSmall`] instead of truncating the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
    len: usize,
}

impl Blob {
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| HuksError::AllocationFailure(capacity))?;
        data.resize(capacity, 0);
        Ok(Self { data, len: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Bounds-checked copy of `src` into the blob. On failure the blob is
    /// left empty.
    pub fn fill(&mut self, src: &[u8]) -> Result<()> {
        self.ensure_capacity(src.len())?;
        self.data[..src.len()].copy_from_slice(src);
        self.len = src.len();
        Ok(())
    }

    pub fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        if needed > self.capacity() {
            self.clear();
            return Err(HuksError::BufferTooSmall {
                needed,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// The whole backing buffer, for producers that write in place. The
    /// caller must follow up with [`Blob::set_len`] or [`Blob::clear`].
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len.min(self.capacity());
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.len = 0;
    }
}
