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

use crate::cell::{byte_width, CellBuffer, CELL_BYTES, INLINE_CAPACITY};
use crate::info::{FieldInfo, PipelineInfo, TableInfo};
use crate::{EncodeError, KeyInt};

/// The lookup key for one entry of one table.
///
/// The buffer holds two compact cells per match field, so every match kind
/// fits the same layout: cell `2i` carries the formatted value of field `i`
/// and cell `2i + 1` its companion (the LPM prefix length or the ternary
/// mask; unused for exact matches).  Values wider than
/// [`INLINE_CAPACITY`](crate::INLINE_CAPACITY) bytes live in a spill region
/// behind the cell array and the cell carries their offset.
pub struct MatchKey<'a> {
    table: &'a TableInfo,
    table_id: u32,
    buf: CellBuffer,
    priority: i32,
    nset: usize,
}

impl<'a> MatchKey<'a> {
    /// Sizes a key buffer for the given table.  The allocation is final:
    /// no later `set_*` call reallocates it.
    pub fn new(info: &'a PipelineInfo, table_id: u32) -> Result<MatchKey<'a>, EncodeError> {
        let table = info.table(table_id).ok_or(EncodeError::UnknownTable(table_id))?;
        // Two cells per field accommodate every match kind; wide fields
        // spill twice because a ternary match formats both a key and a mask.
        let spill: usize = table
            .match_fields()
            .iter()
            .filter(|f| byte_width(f.bitwidth) > INLINE_CAPACITY)
            .map(|f| 2 * byte_width(f.bitwidth))
            .sum();
        Ok(MatchKey {
            table,
            table_id,
            buf: CellBuffer::new(2 * table.num_match_fields(), spill),
            priority: 0,
            nset: 0,
        })
    }

    /// The table this key was built for.
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    /// Number of successful `set_*` calls since construction or reset.
    pub fn fields_set(&self) -> usize {
        self.nset
    }

    /// Restores the buffer to its freshly-constructed state.
    pub fn reset(&mut self) {
        self.buf.reset();
        self.priority = 0;
        self.nset = 0;
    }

    /// Entry priority, carried alongside the key for tables with ternary
    /// matches.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// The entry priority last set, zero by default.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    fn field(&self, field_id: u32) -> Result<&FieldInfo, EncodeError> {
        self.table.match_field(field_id).ok_or(EncodeError::UnknownField {
            table_id: self.table_id,
            field_id,
        })
    }

    /// Sets an exact-match field from an unsigned integer.
    pub fn set_exact<T: KeyInt>(&mut self, field_id: u32, key: T) -> Result<(), EncodeError> {
        let f = *self.field(field_id)?;
        self.buf.set_int(2 * f.index, f.id, f.bitwidth, f.byte0_mask, key)?;
        self.nset += 1;
        Ok(())
    }

    /// Sets an exact-match field from a byte string of the field's exact
    /// byte width.
    pub fn set_exact_bytes(&mut self, field_id: u32, key: &[u8]) -> Result<(), EncodeError> {
        let f = *self.field(field_id)?;
        self.buf.set_bytes(2 * f.index, f.id, f.bitwidth, f.byte0_mask, key)?;
        self.nset += 1;
        Ok(())
    }

    /// Sets a longest-prefix-match field: the value in the field's cell,
    /// the prefix length in its companion.
    pub fn set_lpm<T: KeyInt>(
        &mut self,
        field_id: u32,
        key: T,
        prefix_len: i32,
    ) -> Result<(), EncodeError> {
        let f = *self.field(field_id)?;
        self.buf.set_int(2 * f.index, f.id, f.bitwidth, f.byte0_mask, key)?;
        self.buf.set_scalar(2 * f.index + 1, prefix_len as u32);
        self.nset += 1;
        Ok(())
    }

    /// As [`set_lpm`](Self::set_lpm), from a byte string.
    pub fn set_lpm_bytes(
        &mut self,
        field_id: u32,
        key: &[u8],
        prefix_len: i32,
    ) -> Result<(), EncodeError> {
        let f = *self.field(field_id)?;
        self.buf.set_bytes(2 * f.index, f.id, f.bitwidth, f.byte0_mask, key)?;
        self.buf.set_scalar(2 * f.index + 1, prefix_len as u32);
        self.nset += 1;
        Ok(())
    }

    /// Sets a ternary field: two independently formatted values in adjacent
    /// cells.
    pub fn set_ternary<T: KeyInt>(
        &mut self,
        field_id: u32,
        key: T,
        mask: T,
    ) -> Result<(), EncodeError> {
        let f = *self.field(field_id)?;
        self.buf.set_int(2 * f.index, f.id, f.bitwidth, f.byte0_mask, key)?;
        self.buf.set_int(2 * f.index + 1, f.id, f.bitwidth, f.byte0_mask, mask)?;
        self.nset += 1;
        Ok(())
    }

    /// As [`set_ternary`](Self::set_ternary), from byte strings.
    pub fn set_ternary_bytes(
        &mut self,
        field_id: u32,
        key: &[u8],
        mask: &[u8],
    ) -> Result<(), EncodeError> {
        let f = *self.field(field_id)?;
        self.buf.set_bytes(2 * f.index, f.id, f.bitwidth, f.byte0_mask, key)?;
        self.buf.set_bytes(2 * f.index + 1, f.id, f.bitwidth, f.byte0_mask, mask)?;
        self.nset += 1;
        Ok(())
    }

    /// The contiguous key buffer: `2 · F` cells of
    /// [`CELL_BYTES`](crate::CELL_BYTES) followed by the spill region.  The
    /// device consumes this as a read-only view for the duration of a
    /// single operation.
    pub fn bytes(&self) -> &[u8] {
        self.buf.bytes()
    }

    /// The formatted value of a field, resolved through its spill offset
    /// when the field is wider than the inline capacity.
    pub fn value_bytes(&self, field_id: u32) -> Result<&[u8], EncodeError> {
        let f = self.field(field_id)?;
        Ok(self.buf.value(2 * f.index, f.bitwidth))
    }

    /// The formatted companion value of a field (the ternary mask).
    pub fn companion_bytes(&self, field_id: u32) -> Result<&[u8], EncodeError> {
        let f = self.field(field_id)?;
        Ok(self.buf.value(2 * f.index + 1, f.bitwidth))
    }

    /// The scalar companion of a field (the LPM prefix length).
    pub fn companion_scalar(&self, field_id: u32) -> Result<u32, EncodeError> {
        let f = self.field(field_id)?;
        Ok(self.buf.scalar(2 * f.index + 1))
    }

    /// Byte offset of the spill region, which doubles as the size of the
    /// cell array.
    pub fn spill_base(&self) -> usize {
        2 * self.table.num_match_fields() * CELL_BYTES
    }
}
