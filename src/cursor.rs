// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Bounds-checked readers and writers over byte buffers. Every access that
//! would step past the end of the buffer fails instead of panicking, so the
//! codecs built on top never trust a size field further than the data allows.

/// Error returned when an access would run past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub needed: usize,
    pub remaining: usize,
}

pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], OutOfBounds> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(OutOfBounds {
                needed: len,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, OutOfBounds> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Writes into a fixed-capacity slice. The slice is never grown.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), OutOfBounds> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(OutOfBounds {
                needed: bytes.len(),
                remaining,
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn write_u32_le(&mut self, value: u32) -> Result<(), OutOfBounds> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes `value` as a big-endian integer right-aligned in `width` bytes.
    /// Leading zero bytes of `value` are ignored when checking the width.
    pub fn write_be_padded(&mut self, value: &[u8], width: usize) -> Result<(), OutOfBounds> {
        let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
        let significant = &value[start..];
        if significant.len() > width {
            return Err(OutOfBounds {
                needed: significant.len(),
                remaining: width,
            });
        }
        let remaining = self.remaining();
        if width > remaining {
            return Err(OutOfBounds {
                needed: width,
                remaining,
            });
        }
        let pad = width - significant.len();
        self.buf[self.pos..self.pos + pad].fill(0);
        self.buf[self.pos + pad..self.pos + width].copy_from_slice(significant);
        self.pos += width;
        Ok(())
    }

    pub fn into_written(self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_fails_closed() {
        let data = [1, 0, 0, 0, 0xAA];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32_le().unwrap(), 1);
        assert_eq!(
            reader.read_u32_le(),
            Err(OutOfBounds {
                needed: 4,
                remaining: 1
            })
        );
        // a failed read does not consume anything
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read_bytes(1).unwrap(), &[0xAA]);
        assert!(reader.is_empty());
    }

    #[test]
    fn writer_pads_big_endian() {
        let mut buf = [0xFFu8; 6];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_be_padded(&[0x00, 0x01, 0x02], 4).unwrap();
        assert_eq!(writer.remaining(), 2);
        assert!(writer.write_be_padded(&[1, 2, 3], 2).is_err());
        assert!(writer.write_u32_le(7).is_err());
        assert_eq!(writer.into_written(), 4);
        assert_eq!(&buf[..4], &[0, 0, 1, 2]);
    }
}
