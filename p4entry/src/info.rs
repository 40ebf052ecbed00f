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

use proto::p4info;
use std::collections::HashMap;

/// Encoding metadata for one match field.
#[derive(Clone, Copy, Debug)]
pub struct FieldInfo {
    /// Field id, unique within its table.
    pub id: u32,
    /// Ordinal index of the field within its table's match key.
    pub index: usize,
    /// Declared width in bits.
    pub bitwidth: usize,
    /// Mask clearing the bits above `bitwidth` in the most-significant byte
    /// of the field's big-endian representation.
    pub byte0_mask: u8,
    /// Declared match behavior (exact, LPM, ternary, ...).
    pub match_type: p4info::MatchField_MatchType,
}

/// Encoding metadata for one action parameter.
#[derive(Clone, Copy, Debug)]
pub struct ParamInfo {
    /// Parameter id, unique within its action.
    pub id: u32,
    /// Ordinal index of the parameter within its action.
    pub index: usize,
    /// Declared width in bits.
    pub bitwidth: usize,
    /// Mask for the most-significant byte, as for match fields.
    pub byte0_mask: u8,
}

/// Per-table metadata: the match fields in declaration order.
#[derive(Clone, Debug, Default)]
pub struct TableInfo {
    fields: Vec<FieldInfo>,
    index_by_id: HashMap<u32, usize>,
}

impl TableInfo {
    /// Number of match fields in the table's key.
    pub fn num_match_fields(&self) -> usize {
        self.fields.len()
    }

    /// The fields of the key, in declaration order.
    pub fn match_fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Metadata for the field at the given ordinal index.
    pub fn match_field_info(&self, index: usize) -> Option<&FieldInfo> {
        self.fields.get(index)
    }

    /// Metadata for the field with the given id.
    pub fn match_field(&self, field_id: u32) -> Option<&FieldInfo> {
        self.index_by_id.get(&field_id).map(|&i| &self.fields[i])
    }

    /// Ordinal index of the field with the given id.
    pub fn match_field_index(&self, field_id: u32) -> Option<usize> {
        self.index_by_id.get(&field_id).copied()
    }
}

/// Per-action metadata: the parameters in declaration order.
#[derive(Clone, Debug, Default)]
pub struct ActionInfo {
    params: Vec<ParamInfo>,
    index_by_id: HashMap<u32, usize>,
}

impl ActionInfo {
    /// Number of runtime parameters the action takes.
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// The parameters, in declaration order.
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Metadata for the parameter with the given id.
    pub fn param(&self, param_id: u32) -> Option<&ParamInfo> {
        self.index_by_id.get(&param_id).map(|&i| &self.params[i])
    }

    /// Ordinal index of the parameter with the given id.
    pub fn param_index(&self, param_id: u32) -> Option<usize> {
        self.index_by_id.get(&param_id).copied()
    }
}

/// Read-only encoding metadata for one forwarding pipeline, condensed from
/// its `P4Info` message.
#[derive(Clone, Debug, Default)]
pub struct PipelineInfo {
    tables: HashMap<u32, TableInfo>,
    actions: HashMap<u32, ActionInfo>,
}

impl PipelineInfo {
    /// Metadata for the table with the given id.
    pub fn table(&self, table_id: u32) -> Option<&TableInfo> {
        self.tables.get(&table_id)
    }

    /// Metadata for the action with the given id.
    pub fn action(&self, action_id: u32) -> Option<&ActionInfo> {
        self.actions.get(&action_id)
    }

    /// Ids of all tables in the pipeline.
    pub fn table_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.tables.keys().copied()
    }
}

/// The mask that clears the bits above `bitwidth` in the most-significant
/// byte of a ⌈bitwidth/8⌉-byte big-endian value.
fn byte0_mask(bitwidth: usize) -> u8 {
    match bitwidth % 8 {
        0 => 0xff,
        partial => 0xff >> (8 - partial),
    }
}

impl From<&p4info::P4Info> for PipelineInfo {
    fn from(p4i: &p4info::P4Info) -> Self {
        let tables = p4i
            .get_tables()
            .iter()
            .map(|t| {
                let fields: Vec<FieldInfo> = t
                    .get_match_fields()
                    .iter()
                    .enumerate()
                    .map(|(index, mf)| FieldInfo {
                        id: mf.get_id(),
                        index,
                        bitwidth: mf.get_bitwidth() as usize,
                        byte0_mask: byte0_mask(mf.get_bitwidth() as usize),
                        match_type: mf.get_match_type(),
                    })
                    .collect();
                let index_by_id = fields.iter().map(|f| (f.id, f.index)).collect();
                (t.get_preamble().get_id(), TableInfo { fields, index_by_id })
            })
            .collect();
        let actions = p4i
            .get_actions()
            .iter()
            .map(|a| {
                let params: Vec<ParamInfo> = a
                    .get_params()
                    .iter()
                    .enumerate()
                    .map(|(index, p)| ParamInfo {
                        id: p.get_id(),
                        index,
                        bitwidth: p.get_bitwidth() as usize,
                        byte0_mask: byte0_mask(p.get_bitwidth() as usize),
                    })
                    .collect();
                let index_by_id = params.iter().map(|p| (p.id, p.index)).collect();
                (a.get_preamble().get_id(), ActionInfo { params, index_by_id })
            })
            .collect();
        PipelineInfo { tables, actions }
    }
}

#[cfg(test)]
mod tests {
    use super::byte0_mask;

    #[test]
    fn leading_byte_masks() {
        assert_eq!(byte0_mask(8), 0xff);
        assert_eq!(byte0_mask(16), 0xff);
        assert_eq!(byte0_mask(12), 0x0f);
        assert_eq!(byte0_mask(14), 0x3f);
        assert_eq!(byte0_mask(9), 0x01);
        assert_eq!(byte0_mask(1), 0x01);
    }
}
