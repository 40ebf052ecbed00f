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

use crate::Fail;
use p4entry::{ActionData, DevTarget, EntryHandle, MatchKey, TableBackend};
use proto::code::Code;
use std::collections::HashMap;

/// Identity of an installed entry: the table, the canonical encoded key
/// bytes, and the entry priority.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct TableKey {
    table_id: u32,
    key: Vec<u8>,
    priority: i32,
}

struct StoredEntry {
    key: TableKey,
    action_id: u32,
    action_data: Vec<u8>,
}

/// In-memory table state for one device, keyed by the encoder's canonical
/// buffers.
#[derive(Default)]
pub(crate) struct TableStore {
    next_handle: EntryHandle,
    by_key: HashMap<TableKey, EntryHandle>,
    by_handle: HashMap<EntryHandle, StoredEntry>,
}

impl TableStore {
    pub(crate) fn lookup(
        &self,
        table_id: u32,
        key_bytes: &[u8],
        priority: i32,
    ) -> Option<EntryHandle> {
        let key = TableKey { table_id, key: key_bytes.to_vec(), priority };
        self.by_key.get(&key).copied()
    }
}

impl TableBackend for TableStore {
    fn table_entry_add(
        &mut self,
        _dev_tgt: DevTarget,
        table_id: u32,
        match_key: &MatchKey,
        action_id: u32,
        action_data: &ActionData,
        overwrite: bool,
    ) -> anyhow::Result<EntryHandle> {
        let key = TableKey {
            table_id,
            key: match_key.bytes().to_vec(),
            priority: match_key.priority(),
        };
        match (self.by_key.get(&key).copied(), overwrite) {
            (Some(handle), true) => {
                let entry = self.by_handle.get_mut(&handle).unwrap();
                entry.action_id = action_id;
                entry.action_data = action_data.bytes().to_vec();
                Ok(handle)
            }
            (Some(_), false) => {
                Err(Fail::new(Code::ALREADY_EXISTS, "entry already exists").into())
            }
            (None, true) => Err(Fail::new(Code::NOT_FOUND, "no entry to modify").into()),
            (None, false) => {
                self.next_handle += 1;
                let handle = self.next_handle;
                self.by_key.insert(key.clone(), handle);
                self.by_handle.insert(
                    handle,
                    StoredEntry {
                        key,
                        action_id,
                        action_data: action_data.bytes().to_vec(),
                    },
                );
                Ok(handle)
            }
        }
    }

    fn table_entry_delete(
        &mut self,
        _device_id: u64,
        table_id: u32,
        handle: EntryHandle,
    ) -> anyhow::Result<()> {
        match self.by_handle.remove(&handle) {
            Some(entry) => {
                debug_assert_eq!(entry.key.table_id, table_id);
                self.by_key.remove(&entry.key);
                Ok(())
            }
            None => Err(Fail::new(Code::NOT_FOUND, "no such entry handle").into()),
        }
    }
}
