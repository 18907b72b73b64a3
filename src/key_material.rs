// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Flat record holding the numeric components of an asymmetric key:
//!
//! ```text
//! u32 key_alg, u32 key_size_bits, u32 size[n]     (little-endian)
//! component[0] .. component[n-1]                  (big-endian, left-zero-padded)
//! ```
//!
//! Component order per algorithm:
//! DSA `x y p q g`, RSA `n e d`, ECC `x y z`. The private component is
//! written with size zero in public-only records.
use tracing::trace;

use crate::blob::Blob;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{HuksError, Result};
use crate::param::Algorithm;

const DSA_MIN_COMPONENT_LEN: usize = 64;
const DSA_BLOCK_LEN: usize = 8;

struct Layout {
    names: &'static [&'static str],
    private: usize,
}

const DSA_LAYOUT: Layout = Layout {
    names: &["x", "y", "p", "q", "g"],
    private: 0,
};

const RSA_LAYOUT: Layout = Layout {
    names: &["n", "e", "d"],
    private: 2,
};

const ECC_LAYOUT: Layout = Layout {
    names: &["x", "y", "z"],
    private: 2,
};

fn layout(alg: Algorithm) -> Result<&'static Layout> {
    match alg {
        Algorithm::Dsa => Ok(&DSA_LAYOUT),
        Algorithm::Rsa => Ok(&RSA_LAYOUT),
        Algorithm::Ecc => Ok(&ECC_LAYOUT),
        _ => Err(HuksError::UnsupportedAlgorithm(alg.value())),
    }
}

/// Byte width every component of a key of `key_size` bits is padded to.
pub fn component_width(alg: Algorithm, key_size: u32) -> usize {
    let bits = key_size as usize;
    match alg {
        Algorithm::Dsa => {
            let len = bits.div_ceil(8).max(DSA_MIN_COMPONENT_LEN);
            len.div_ceil(DSA_BLOCK_LEN) * DSA_BLOCK_LEN
        },
        Algorithm::Rsa => bits / 8,
        _ => bits.div_ceil(8),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    Public,
    Private,
}

/// Decoded key components, each a big-endian integer without leading zeros.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    alg: Algorithm,
    key_size: u32,
    components: Vec<Vec<u8>>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("alg", &self.alg)
            .field("key_size", &self.key_size)
            .field("has_private", &self.has_private())
            .finish()
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

impl KeyMaterial {
    /// `components` follow the algorithm's fixed order. An empty private
    /// component makes the material public-only.
    pub fn new(alg: Algorithm, key_size: u32, components: Vec<Vec<u8>>) -> Result<Self> {
        let layout = layout(alg)?;
        if components.len() != layout.names.len() {
            return Err(HuksError::MalformedKeyMaterial("wrong component count"));
        }
        let components: Vec<Vec<u8>> = components.iter().map(|c| strip_leading_zeros(c)).collect();
        for (i, component) in components.iter().enumerate() {
            if i != layout.private && component.is_empty() {
                return Err(HuksError::MissingComponent(layout.names[i]));
            }
        }
        Ok(Self {
            alg,
            key_size,
            components,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.alg
    }

    pub fn key_size(&self) -> u32 {
        self.key_size
    }

    pub fn component(&self, index: usize) -> &[u8] {
        &self.components[index]
    }

    pub fn private_component(&self) -> Option<&[u8]> {
        let private = &self.components[self.private_index()];
        (!private.is_empty()).then_some(private.as_slice())
    }

    pub fn has_private(&self) -> bool {
        self.private_component().is_some()
    }

    pub fn public_only(&self) -> Self {
        let mut public = self.clone();
        let index = self.private_index();
        public.components[index].clear();
        public
    }

    fn private_index(&self) -> usize {
        match self.alg {
            Algorithm::Dsa => DSA_LAYOUT.private,
            Algorithm::Rsa => RSA_LAYOUT.private,
            _ => ECC_LAYOUT.private,
        }
    }

    pub(crate) fn private_name(&self) -> &'static str {
        match self.alg {
            Algorithm::Dsa => DSA_LAYOUT.names[DSA_LAYOUT.private],
            Algorithm::Rsa => RSA_LAYOUT.names[RSA_LAYOUT.private],
            _ => ECC_LAYOUT.names[ECC_LAYOUT.private],
        }
    }

    fn header_len(&self) -> usize {
        8 + 4 * self.components.len()
    }

    /// Size of the record [`KeyMaterial::encode`] produces for `part`.
    pub fn encoded_len(&self, part: KeyPart) -> usize {
        let width = component_width(self.alg, self.key_size);
        let mut count = self.components.len();
        if part == KeyPart::Public {
            count -= 1;
        }
        self.header_len() + width * count
    }

    /// Parses a record. With `need_private` unset the private component is
    /// skipped even when present.
    pub fn decode(data: &[u8], need_private: bool) -> Result<Self> {
        let truncated = |_| HuksError::MalformedKeyMaterial("truncated");
        let mut reader = ByteReader::new(data);
        let raw_alg = reader.read_u32_le().map_err(truncated)?;
        let alg = Algorithm::try_from(raw_alg)
            .map_err(|_| HuksError::MalformedKeyMaterial("unknown algorithm"))?;
        let layout = layout(alg)?;
        let key_size = reader.read_u32_le().map_err(truncated)?;
        if key_size == 0 {
            return Err(HuksError::MalformedKeyMaterial("zero key size"));
        }

        let mut sizes = [0usize; 5];
        let sizes = &mut sizes[..layout.names.len()];
        for size in sizes.iter_mut() {
            *size = reader.read_u32_le().map_err(truncated)? as usize;
        }
        let body: usize = sizes
            .iter()
            .try_fold(0usize, |acc, size| acc.checked_add(*size))
            .ok_or(HuksError::MalformedKeyMaterial("size overflow"))?;
        if reader.position().checked_add(body) != Some(data.len()) {
            return Err(HuksError::MalformedKeyMaterial(
                "component sizes do not match record length",
            ));
        }
        if need_private && sizes[layout.private] == 0 {
            return Err(HuksError::MissingComponent(layout.names[layout.private]));
        }

        let mut components = Vec::with_capacity(sizes.len());
        for (i, size) in sizes.iter().enumerate() {
            let bytes = reader.read_bytes(*size).map_err(truncated)?;
            if i == layout.private && !need_private {
                components.push(Vec::new());
            } else {
                components.push(strip_leading_zeros(bytes));
            }
        }
        trace!(alg = %alg, key_size, need_private, "key material decoded");
        Self::new(alg, key_size, components)
    }

    /// Writes the record into `out`. On failure `out` is emptied and must
    /// not be used.
    pub fn encode(&self, part: KeyPart, out: &mut Blob) -> Result<()> {
        if part == KeyPart::Private && !self.has_private() {
            out.clear();
            return Err(HuksError::MissingComponent(self.private_name()));
        }
        let total = self.encoded_len(part);
        out.ensure_capacity(total)?;
        match self.write_into(part, out.spare_mut()) {
            Ok(written) => {
                out.set_len(written);
                Ok(())
            },
            Err(err) => {
                out.clear();
                Err(err)
            },
        }
    }

    pub fn to_vec(&self, part: KeyPart) -> Result<Vec<u8>> {
        let mut out = Blob::with_capacity(self.encoded_len(part))?;
        self.encode(part, &mut out)?;
        Ok(out.to_vec())
    }

    fn write_into(&self, part: KeyPart, buf: &mut [u8]) -> Result<usize> {
        let width = component_width(self.alg, self.key_size);
        let private = self.private_index();
        let slot = |i: usize| {
            if i == private && part == KeyPart::Public {
                0
            } else {
                width
            }
        };
        let overflow = |_| HuksError::MalformedKeyMaterial("component wider than its slot");

        let mut writer = ByteWriter::new(buf);
        writer.write_u32_le(self.alg.value()).map_err(overflow)?;
        writer.write_u32_le(self.key_size).map_err(overflow)?;
        for i in 0..self.components.len() {
            writer.write_u32_le(slot(i) as u32).map_err(overflow)?;
        }
        for (i, component) in self.components.iter().enumerate() {
            let width = slot(i);
            if width > 0 {
                writer.write_be_padded(component, width).map_err(overflow)?;
            }
        }
        Ok(writer.into_written())
    }
}
