/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use crate::{EncodeError, KeyInt};

/// Size of one compact cell in the buffer prefix.
pub const CELL_BYTES: usize = 8;

/// Largest value, in bytes, stored inline in a cell.  Wider values live in
/// the spill region and the cell holds their offset.
pub const INLINE_CAPACITY: usize = CELL_BYTES;

/// Number of bytes needed for a value of the given bit-width.
pub(crate) fn byte_width(bitwidth: usize) -> usize {
    (bitwidth + 7) / 8
}

/// One contiguous allocation: a prefix array of fixed-size cells followed by
/// a spill region.  A cell holds either an inline value, a `u32` scalar
/// companion, or the offset of a spilled value; which one is decided by the
/// caller's field metadata, never by a stored tag.
///
/// The allocation is sized once and never grows.  The spill cursor only
/// moves forward, and only after a value has been fully written.
pub(crate) struct CellBuffer {
    buf: Box<[u8]>,
    spill_base: usize,
    spill_cursor: usize,
}

impl CellBuffer {
    pub(crate) fn new(num_cells: usize, spill_bytes: usize) -> CellBuffer {
        let spill_base = num_cells * CELL_BYTES;
        CellBuffer {
            buf: vec![0u8; spill_base + spill_bytes].into_boxed_slice(),
            spill_base,
            spill_cursor: spill_base,
        }
    }

    /// Restores the spill cursor and clears the buffer, as if freshly
    /// constructed.
    pub(crate) fn reset(&mut self) {
        self.buf.fill(0);
        self.spill_cursor = self.spill_base;
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Formats an integer value into a cell: network byte order, truncated
    /// to the field's byte width, leading byte masked to its bit-width.
    /// Integer values always fit inline because anything wider than 64 bits
    /// is rejected as `TooWide` first.
    pub(crate) fn set_int<T: KeyInt>(
        &mut self,
        cell: usize,
        id: u32,
        bitwidth: usize,
        byte0_mask: u8,
        v: T,
    ) -> Result<(), EncodeError> {
        if T::SIGNED {
            return Err(EncodeError::SignedUnsupported);
        }
        if bitwidth > T::BITS {
            return Err(EncodeError::TooWide {
                field_id: id,
                field_bits: bitwidth,
                value_bits: T::BITS,
            });
        }
        let bytes = byte_width(bitwidth);
        let be = v.to_u64().to_be_bytes();
        let off = cell * CELL_BYTES;
        let dst = &mut self.buf[off..off + bytes];
        dst.copy_from_slice(&be[be.len() - bytes..]);
        dst[0] &= byte0_mask;
        Ok(())
    }

    /// Formats a byte-string value into a cell, spilling it past the cell
    /// array when it is wider than the inline capacity.
    pub(crate) fn set_bytes(
        &mut self,
        cell: usize,
        id: u32,
        bitwidth: usize,
        byte0_mask: u8,
        value: &[u8],
    ) -> Result<(), EncodeError> {
        let bytes = byte_width(bitwidth);
        if value.len() != bytes {
            return Err(EncodeError::WidthMismatch {
                field_id: id,
                want: bytes,
                got: value.len(),
            });
        }
        let off = cell * CELL_BYTES;
        if bytes <= INLINE_CAPACITY {
            let dst = &mut self.buf[off..off + bytes];
            dst.copy_from_slice(value);
            dst[0] &= byte0_mask;
        } else {
            let spill = self.spill_cursor;
            self.buf[off..off + CELL_BYTES].copy_from_slice(&(spill as u64).to_ne_bytes());
            let dst = &mut self.buf[spill..spill + bytes];
            dst.copy_from_slice(value);
            dst[0] &= byte0_mask;
            self.spill_cursor = spill + bytes;
        }
        Ok(())
    }

    /// Stores a scalar companion (e.g. an LPM prefix length) in a cell.
    pub(crate) fn set_scalar(&mut self, cell: usize, v: u32) {
        let off = cell * CELL_BYTES;
        self.buf[off..off + 4].copy_from_slice(&v.to_ne_bytes());
    }

    pub(crate) fn scalar(&self, cell: usize) -> u32 {
        let off = cell * CELL_BYTES;
        u32::from_ne_bytes(self.buf[off..off + 4].try_into().unwrap())
    }

    /// The formatted value stored for a cell, following the spill offset
    /// when the field is wider than the inline capacity.
    pub(crate) fn value(&self, cell: usize, bitwidth: usize) -> &[u8] {
        let bytes = byte_width(bitwidth);
        let off = cell * CELL_BYTES;
        if bytes <= INLINE_CAPACITY {
            &self.buf[off..off + bytes]
        } else {
            let spill =
                u64::from_ne_bytes(self.buf[off..off + CELL_BYTES].try_into().unwrap()) as usize;
            &self.buf[spill..spill + bytes]
        }
    }
}
