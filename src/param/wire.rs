// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Flat little-endian layout of a built [`ParamSet`]:
//!
//! ```text
//! header   u32 total_size, u32 param_count
//! entry    u32 tag, u32 a, u32 b      (a = value | 0/1 | length, b = data offset for bytes)
//! data     blob bytes, in entry order
//! ```
use tracing::trace;

use super::{BoolTag, Param, ParamSet, Tag};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{HuksError, Result};

pub const HEADER_SIZE: usize = 8;
pub const ENTRY_SIZE: usize = 12;

impl ParamSet {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.ensure_built()?;
        let total = self.total_size() as usize;
        let mut buf = Vec::new();
        buf.try_reserve_exact(total)
            .map_err(|_| HuksError::AllocationFailure(total))?;
        buf.resize(total, 0);

        let truncated = |_| HuksError::MalformedParamSet("size bookkeeping mismatch");
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u32_le(self.total_size()).map_err(truncated)?;
        writer.write_u32_le(self.len() as u32).map_err(truncated)?;

        let mut offset = HEADER_SIZE + ENTRY_SIZE * self.len();
        for param in self.iter() {
            writer.write_u32_le(param.tag().value()).map_err(truncated)?;
            let (a, b) = match param {
                Param::Uint(_, value) => (*value, 0),
                Param::Bool(_, value) => (u32::from(*value), 0),
                Param::Bytes(_, bytes) => {
                    let entry = (bytes.len() as u32, offset as u32);
                    offset += bytes.len();
                    entry
                },
            };
            writer.write_u32_le(a).map_err(truncated)?;
            writer.write_u32_le(b).map_err(truncated)?;
        }
        for param in self.iter() {
            if let Param::Bytes(_, bytes) = param {
                writer.write_bytes(bytes).map_err(truncated)?;
            }
        }
        Ok(buf)
    }

    /// Parses and fully validates a serialized set. The result is built.
    pub fn from_bytes(data: &[u8]) -> Result<ParamSet> {
        let truncated = |_| HuksError::MalformedParamSet("truncated");
        let mut reader = ByteReader::new(data);
        let total_size = reader.read_u32_le().map_err(truncated)? as usize;
        let count = reader.read_u32_le().map_err(truncated)? as usize;

        if total_size != data.len() {
            return Err(HuksError::MalformedParamSet("size field mismatch"));
        }
        if count == 0 {
            return Err(HuksError::ParamSetEmpty);
        }
        let data_start = count
            .checked_mul(ENTRY_SIZE)
            .and_then(|entries| entries.checked_add(HEADER_SIZE))
            .filter(|start| *start <= data.len())
            .ok_or(HuksError::MalformedParamSet("param count out of range"))?;

        let mut params = Vec::new();
        params
            .try_reserve_exact(count)
            .map_err(|_| HuksError::AllocationFailure(count))?;
        let mut expected_offset = data_start;
        for _ in 0..count {
            let raw_tag = reader.read_u32_le().map_err(truncated)?;
            let a = reader.read_u32_le().map_err(truncated)?;
            let b = reader.read_u32_le().map_err(truncated)?;
            let tag = Tag::try_from(raw_tag)
                .map_err(|_| HuksError::MalformedParamSet("unknown tag"))?;
            let param = match tag {
                Tag::Uint(tag) => Param::Uint(tag, a),
                Tag::Bool(tag) => bool_param(tag, a)?,
                Tag::Bytes(tag) => {
                    let (len, offset) = (a as usize, b as usize);
                    // blobs are laid out back to back in entry order
                    if offset != expected_offset {
                        return Err(HuksError::MalformedParamSet("blob offset out of order"));
                    }
                    let end = offset
                        .checked_add(len)
                        .filter(|end| *end <= data.len())
                        .ok_or(HuksError::MalformedParamSet("blob out of bounds"))?;
                    expected_offset = end;
                    Param::Bytes(tag, data[offset..end].to_vec())
                },
            };
            params.push(param);
        }
        if expected_offset != data.len() {
            return Err(HuksError::MalformedParamSet("trailing bytes"));
        }

        let mut set = ParamSet::new();
        set.add(&params)?;
        set.build()?;
        trace!(count, size = total_size, "param set parsed");
        Ok(set)
    }
}

fn bool_param(tag: BoolTag, value: u32) -> Result<Param> {
    match value {
        0 => Ok(Param::Bool(tag, false)),
        1 => Ok(Param::Bool(tag, true)),
        _ => Err(HuksError::MalformedParamSet("bool value is not 0 or 1")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{purpose, Algorithm, BytesTag, Digest, UintTag};

    fn sample() -> ParamSet {
        ParamSet::builder()
            .uint(UintTag::Algorithm, Algorithm::Dsa)
            .uint(UintTag::Purpose, purpose::SIGN)
            .bytes(BytesTag::KeyAuthId, "alias")
            .boolean(BoolTag::IsKeyAlias, true)
            .bytes(BytesTag::Nonce, vec![1, 2, 3])
            .build()
            .unwrap()
    }

    #[test]
    fn layout_is_bit_exact() {
        let set = ParamSet::builder()
            .uint(UintTag::Digest, Digest::Sha256)
            .bytes(BytesTag::KeyAuthId, vec![0xAB, 0xCD])
            .build()
            .unwrap();
        let bytes = set.to_bytes().unwrap();
        let expected: Vec<u8> = [
            34u32.to_le_bytes(),
            2u32.to_le_bytes(),
            UintTag::Digest.value().to_le_bytes(),
            12u32.to_le_bytes(),
            0u32.to_le_bytes(),
            BytesTag::KeyAuthId.value().to_le_bytes(),
            2u32.to_le_bytes(),
            32u32.to_le_bytes(),
        ]
        .concat()
        .into_iter()
        .chain([0xAB, 0xCD])
        .collect();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn parse_restores_order_and_values() {
        let set = sample();
        let parsed = ParamSet::from_bytes(&set.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn unbuilt_set_does_not_serialize() {
        let mut set = ParamSet::new();
        set.add(&[Param::Uint(UintTag::KeySize, 1024)]).unwrap();
        assert!(matches!(set.to_bytes(), Err(HuksError::ParamSetNotBuilt)));
    }

    #[test]
    fn rejects_bad_size_and_bounds() {
        let bytes = sample().to_bytes().unwrap();

        let mut short = bytes.clone();
        short.pop();
        assert!(matches!(
            ParamSet::from_bytes(&short),
            Err(HuksError::MalformedParamSet(_))
        ));

        // inflate the first blob length past the end of the buffer
        let mut oob = bytes.clone();
        let entry = HEADER_SIZE + ENTRY_SIZE * 2;
        oob[entry + 4..entry + 8].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            ParamSet::from_bytes(&oob),
            Err(HuksError::MalformedParamSet(_))
        ));

        let mut huge_count = bytes;
        huge_count[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            ParamSet::from_bytes(&huge_count),
            Err(HuksError::MalformedParamSet(_))
        ));
    }

    #[test]
    fn rejects_duplicates_and_bad_bools() {
        let set = ParamSet::builder()
            .uint(UintTag::KeySize, 1024u32)
            .uint(UintTag::Digest, Digest::Sha1)
            .build()
            .unwrap();
        let mut bytes = set.to_bytes().unwrap();
        let second = HEADER_SIZE + ENTRY_SIZE;
        bytes[second..second + 4].copy_from_slice(&UintTag::KeySize.value().to_le_bytes());
        assert!(matches!(
            ParamSet::from_bytes(&bytes),
            Err(HuksError::DuplicateTag(_))
        ));

        bytes[second..second + 4].copy_from_slice(&BoolTag::IsKeyAlias.value().to_le_bytes());
        bytes[second + 4..second + 8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            ParamSet::from_bytes(&bytes),
            Err(HuksError::MalformedParamSet(_))
        ));
    }
}
