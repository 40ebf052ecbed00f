/*!
Table-entry encoding for the P4 Runtime API.

Given the compiled metadata of a P4 program (a
[P4Info](https://p4.org/p4-spec/p4runtime/main/P4Runtime-Spec.html#sec-p4info)
message), this crate builds the compact binary match-key and action-data
buffers a device-management back end consumes:

  - [`PipelineInfo`] condenses a `P4Info` into the per-field and
    per-parameter metadata the encoders query: bit-widths, leading-byte
    masks, and ordinal indexes.
  - [`MatchKey`] lays out one table lookup key: two fixed-size cells per
    match field (value plus LPM prefix length or ternary mask), with values
    wider than 64 bits spilled into a trailing region of the same buffer.
  - [`ActionData`] does the same for action arguments, one cell per
    parameter.
  - [`MatchTable`] validates that a match key and action data were built for
    the table and action they are submitted against, then hands the raw
    buffers to a [`TableBackend`].

All multi-byte values are stored in network byte order, left-truncated to
the field's byte width, with the leading byte masked down to the field's
declared bit-width.
*/
#![warn(missing_docs)]
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

use thiserror::Error;

mod action_data;
mod cell;
mod info;
mod match_key;
mod table;

pub use action_data::ActionData;
pub use cell::{CELL_BYTES, INLINE_CAPACITY};
pub use info::{ActionInfo, FieldInfo, ParamInfo, PipelineInfo, TableInfo};
pub use match_key::MatchKey;
pub use table::{DevTarget, EntryHandle, MatchTable, TableBackend};

/// Failure to format a key or argument value.
///
/// Encoders return these before any part of the buffer or its spill cursor
/// has been modified, so a failed `set_*` call leaves the buffer exactly as
/// it was.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum EncodeError {
    /// The supplied integer type is narrower than the field.
    #[error("field {field_id:#x} is {field_bits} bits wide but the supplied value has only {value_bits}")]
    TooWide {
        /// Field or parameter id.
        field_id: u32,
        /// Declared bit-width of the field.
        field_bits: usize,
        /// Bit-width of the supplied value's type.
        value_bits: usize,
    },

    /// A byte-string value's length does not match the field's byte width.
    #[error("field {field_id:#x} takes {want} bytes, got {got}")]
    WidthMismatch {
        /// Field or parameter id.
        field_id: u32,
        /// ⌈bit-width / 8⌉ for the field.
        want: usize,
        /// Length of the supplied byte string.
        got: usize,
    },

    /// Signed values are not supported as keys or arguments.
    #[error("signed values are not supported")]
    SignedUnsupported,

    /// The pipeline has no table with this id.
    #[error("no table {0:#x} in the pipeline")]
    UnknownTable(u32),

    /// The table has no match field with this id.
    #[error("table {table_id:#x} has no match field {field_id:#x}")]
    UnknownField {
        /// Table the key is being built for.
        table_id: u32,
        /// The unknown field id.
        field_id: u32,
    },

    /// The pipeline has no action with this id.
    #[error("no action {0:#x} in the pipeline")]
    UnknownAction(u32),

    /// The action has no parameter with this id.
    #[error("action {action_id:#x} has no parameter {param_id:#x}")]
    UnknownParam {
        /// Action the arguments are being built for.
        action_id: u32,
        /// The unknown parameter id.
        param_id: u32,
    },
}

/// Failure to submit an entry to a table.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The match key was built for a different table.
    #[error("match key was built for table {built_for:#x}, not table {table_id:#x}")]
    TableMismatch {
        /// The table the entry was submitted against.
        table_id: u32,
        /// The table the match key was built for.
        built_for: u32,
    },

    /// The action data was built for a different action.
    #[error("action data was built for action {built_for:#x}, not action {action_id:#x}")]
    ActionMismatch {
        /// The action named in the entry.
        action_id: u32,
        /// The action the data buffer was built for.
        built_for: u32,
    },

    /// The device back end rejected the operation.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width integers accepted as key and argument values.
///
/// Signed implementations exist so that callers get a typed
/// [`EncodeError::SignedUnsupported`] failure instead of a trait bound
/// error, matching the behavior of the other language bindings.
pub trait KeyInt: sealed::Sealed + Copy {
    /// Width of the integer type in bits.
    const BITS: usize;
    /// Whether the type is signed.
    const SIGNED: bool;
    /// The value widened to 64 bits, preserving its unsigned bit pattern.
    fn to_u64(self) -> u64;
}

macro_rules! impl_key_int {
    ($($t:ty => $signed:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl KeyInt for $t {
                const BITS: usize = <$t>::BITS as usize;
                const SIGNED: bool = $signed;
                fn to_u64(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_key_int! {
    u8 => false, u16 => false, u32 => false, u64 => false,
    i8 => true, i16 => true, i32 => true, i64 => true,
}
