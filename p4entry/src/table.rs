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

use crate::{ActionData, EntryError, MatchKey};

/// A device and the subset of its pipes an operation targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DevTarget {
    /// Device id.
    pub device_id: u64,
    /// Bitmap of targeted pipes; [`ALL_PIPES`](DevTarget::ALL_PIPES) for
    /// every pipe.
    pub pipe_mask: u16,
}

impl DevTarget {
    /// Pipe mask addressing every pipe of the device.
    pub const ALL_PIPES: u16 = 0xffff;

    /// Targets every pipe of the given device.
    pub fn new(device_id: u64) -> DevTarget {
        DevTarget { device_id, pipe_mask: Self::ALL_PIPES }
    }
}

/// Opaque handle naming an installed table entry.
pub type EntryHandle = u64;

/// The table-programming slice of the device capability.  The raw key and
/// argument buffers are read-only views the implementation must not retain
/// past the call.
pub trait TableBackend {
    /// Installs an entry and returns its handle.  With `overwrite`, an
    /// existing entry with the same key is replaced; without it, a
    /// duplicate key is an error.
    fn table_entry_add(
        &mut self,
        dev_tgt: DevTarget,
        table_id: u32,
        match_key: &MatchKey,
        action_id: u32,
        action_data: &ActionData,
        overwrite: bool,
    ) -> anyhow::Result<EntryHandle>;

    /// Removes the entry named by `handle`.
    fn table_entry_delete(
        &mut self,
        device_id: u64,
        table_id: u32,
        handle: EntryHandle,
    ) -> anyhow::Result<()>;
}

/// Validating front end for one table: checks that the buffers submitted to
/// it were built for this table and the named action before handing them to
/// the backend.
pub struct MatchTable {
    table_id: u32,
}

impl MatchTable {
    /// A front end for the given table.
    pub fn new(table_id: u32) -> MatchTable {
        MatchTable { table_id }
    }

    /// Installs an entry built from `match_key` and `action_data`.
    pub fn entry_add(
        &self,
        backend: &mut dyn TableBackend,
        dev_tgt: DevTarget,
        match_key: &MatchKey,
        action_id: u32,
        action_data: &ActionData,
        overwrite: bool,
    ) -> Result<EntryHandle, EntryError> {
        if match_key.table_id() != self.table_id {
            return Err(EntryError::TableMismatch {
                table_id: self.table_id,
                built_for: match_key.table_id(),
            });
        }
        if action_data.action_id() != action_id {
            return Err(EntryError::ActionMismatch {
                action_id,
                built_for: action_data.action_id(),
            });
        }
        Ok(backend.table_entry_add(dev_tgt, self.table_id, match_key, action_id, action_data, overwrite)?)
    }

    /// Removes an entry previously returned by
    /// [`entry_add`](Self::entry_add).
    pub fn entry_delete(
        &self,
        backend: &mut dyn TableBackend,
        device_id: u64,
        handle: EntryHandle,
    ) -> Result<(), EntryError> {
        Ok(backend.table_entry_delete(device_id, self.table_id, handle)?)
    }
}
