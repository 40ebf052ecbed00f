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

use p4entry::{
    ActionData, DevTarget, EncodeError, EntryError, EntryHandle, MatchKey, MatchTable,
    PipelineInfo, TableBackend, CELL_BYTES,
};
use proto::p4info::{
    Action, ActionRef, Action_Param, MatchField, MatchField_MatchType, P4Info, Preamble, Table,
};
use protobuf::RepeatedField;

const ACL_TABLE: u32 = 0x0200_0001;
const FWD_TABLE: u32 = 0x0200_0002;
const FORWARD_ACTION: u32 = 0x0100_0001;
const DROP_ACTION: u32 = 0x0100_0002;
const SET_TUNNEL_ACTION: u32 = 0x0100_0003;

const VLAN_VID: u32 = 1; // exact, 12 bits
const IPV4_DST: u32 = 2; // LPM, 32 bits
const ETH_DST: u32 = 3; // ternary, 48 bits
const TUNNEL_ID: u32 = 4; // exact, 128 bits (spilled)
const ETH_TYPE: u32 = 5; // exact, 16 bits
const COOKIE: u32 = 6; // exact, 64 bits

fn match_field(id: u32, name: &str, bitwidth: i32, mt: MatchField_MatchType) -> MatchField {
    let mut mf = MatchField::new();
    mf.set_id(id);
    mf.set_name(name.to_string());
    mf.set_bitwidth(bitwidth);
    mf.set_match_type(mt);
    mf
}

fn preamble(id: u32, name: &str) -> Preamble {
    let mut p = Preamble::new();
    p.set_id(id);
    p.set_name(name.to_string());
    p
}

fn param(id: u32, name: &str, bitwidth: i32) -> Action_Param {
    let mut p = Action_Param::new();
    p.set_id(id);
    p.set_name(name.to_string());
    p.set_bitwidth(bitwidth);
    p
}

fn action(id: u32, name: &str, params: Vec<Action_Param>) -> Action {
    let mut a = Action::new();
    a.set_preamble(preamble(id, name));
    a.set_params(RepeatedField::from_vec(params));
    a
}

fn action_ref(id: u32) -> ActionRef {
    let mut ar = ActionRef::new();
    ar.set_id(id);
    ar
}

fn test_p4info() -> P4Info {
    use MatchField_MatchType::*;

    let mut acl = Table::new();
    acl.set_preamble(preamble(ACL_TABLE, "MyIngress.acl"));
    acl.set_match_fields(RepeatedField::from_vec(vec![
        match_field(VLAN_VID, "hdr.vlan.vid", 12, EXACT),
        match_field(IPV4_DST, "hdr.ipv4.dst_addr", 32, LPM),
        match_field(ETH_DST, "hdr.ethernet.dst_addr", 48, TERNARY),
        match_field(TUNNEL_ID, "hdr.tunnel.id", 128, EXACT),
        match_field(ETH_TYPE, "hdr.ethernet.ether_type", 16, EXACT),
        match_field(COOKIE, "meta.cookie", 64, EXACT),
    ]));
    acl.set_action_refs(RepeatedField::from_vec(vec![
        action_ref(FORWARD_ACTION),
        action_ref(DROP_ACTION),
        action_ref(SET_TUNNEL_ACTION),
    ]));

    let mut fwd = Table::new();
    fwd.set_preamble(preamble(FWD_TABLE, "MyIngress.fwd"));
    fwd.set_match_fields(RepeatedField::from_vec(vec![match_field(
        1,
        "standard_metadata.ingress_port",
        9,
        EXACT,
    )]));
    fwd.set_action_refs(RepeatedField::from_vec(vec![action_ref(FORWARD_ACTION)]));

    let mut p4info = P4Info::new();
    p4info.set_tables(RepeatedField::from_vec(vec![acl, fwd]));
    p4info.set_actions(RepeatedField::from_vec(vec![
        action(
            FORWARD_ACTION,
            "MyIngress.forward",
            vec![param(1, "port", 9), param(2, "vlan", 12)],
        ),
        action(DROP_ACTION, "MyIngress.drop", vec![]),
        action(SET_TUNNEL_ACTION, "MyIngress.set_tunnel", vec![param(1, "id", 128)]),
    ]));
    p4info
}

fn pipeline() -> PipelineInfo {
    PipelineInfo::from(&test_p4info())
}

#[test]
fn exact_masks_leading_byte() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();

    // 12-bit field: 0x0ABC keeps its low 12 bits.
    mk.set_exact(VLAN_VID, 0x0abcu16).unwrap();
    assert_eq!(mk.value_bytes(VLAN_VID).unwrap(), &[0x0a, 0xbc]);

    // Bits above the field width do not reach the buffer.
    mk.set_exact(VLAN_VID, 0xfabcu16).unwrap();
    assert_eq!(mk.value_bytes(VLAN_VID).unwrap(), &[0x0a, 0xbc]);

    // The maximum representable value is the mask followed by 0xff bytes.
    mk.set_exact(VLAN_VID, 0x0fffu16).unwrap();
    assert_eq!(mk.value_bytes(VLAN_VID).unwrap(), &[0x0f, 0xff]);
}

#[test]
fn exact_64_bit_round_trip() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    let v: u64 = 0x0123_4567_89ab_cdef;
    mk.set_exact(COOKIE, v).unwrap();
    let stored = mk.value_bytes(COOKIE).unwrap();
    assert_eq!(stored, v.to_be_bytes());
    assert_eq!(u64::from_be_bytes(stored.try_into().unwrap()), v);
}

#[test]
fn narrow_integers_are_rejected() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();

    // A 16-bit field cannot be set from a u8...
    assert_eq!(
        mk.set_exact(ETH_TYPE, 0x80u8),
        Err(EncodeError::TooWide { field_id: ETH_TYPE, field_bits: 16, value_bits: 8 })
    );
    // ...but a wider integer than the field is fine.
    mk.set_exact(ETH_TYPE, 0x0800u64).unwrap();
    assert_eq!(mk.value_bytes(ETH_TYPE).unwrap(), &[0x08, 0x00]);
}

#[test]
fn signed_values_are_rejected() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    assert_eq!(mk.set_exact(VLAN_VID, -1i16), Err(EncodeError::SignedUnsupported));
    assert_eq!(mk.set_lpm(IPV4_DST, -1i32, 8), Err(EncodeError::SignedUnsupported));
    assert_eq!(mk.set_ternary(COOKIE, 1i64, 2i64), Err(EncodeError::SignedUnsupported));
}

#[test]
fn byte_strings_must_match_field_width() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    assert_eq!(
        mk.set_exact_bytes(ETH_DST, &[0u8; 5]),
        Err(EncodeError::WidthMismatch { field_id: ETH_DST, want: 6, got: 5 })
    );
}

#[test]
fn lpm_stores_prefix_in_companion_cell() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    // 10.0.0.0/8
    mk.set_lpm(IPV4_DST, 0x0a00_0000u32, 8).unwrap();
    assert_eq!(mk.value_bytes(IPV4_DST).unwrap(), &[0x0a, 0x00, 0x00, 0x00]);
    assert_eq!(mk.companion_scalar(IPV4_DST).unwrap(), 8);
}

#[test]
fn ternary_stores_key_and_mask_in_adjacent_cells() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    let key = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
    let mask = [0xff, 0xff, 0xff, 0x00, 0x00, 0x00];
    mk.set_ternary_bytes(ETH_DST, &key, &mask).unwrap();
    assert_eq!(mk.value_bytes(ETH_DST).unwrap(), &key);
    assert_eq!(mk.companion_bytes(ETH_DST).unwrap(), &mask);
}

#[test]
fn wide_fields_spill_behind_the_cell_array() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();

    // 6 fields, 2 cells each, plus twice the 16-byte wide field.
    assert_eq!(mk.bytes().len(), 12 * CELL_BYTES + 2 * 16);

    let id: Vec<u8> = (0u8..16).collect();
    mk.set_exact_bytes(TUNNEL_ID, &id).unwrap();
    assert_eq!(mk.value_bytes(TUNNEL_ID).unwrap(), id.as_slice());

    // The field's cell holds the offset of the spilled value, which starts
    // right at the end of the cell array.
    let cell = 2 * 3 * CELL_BYTES; // TUNNEL_ID is the fourth field
    let offset =
        u64::from_ne_bytes(mk.bytes()[cell..cell + CELL_BYTES].try_into().unwrap()) as usize;
    assert_eq!(offset, mk.spill_base());
    assert_eq!(&mk.bytes()[offset..offset + 16], id.as_slice());
}

#[test]
fn failed_sets_do_not_move_the_spill_cursor() {
    let info = pipeline();
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    assert!(mk.set_exact_bytes(TUNNEL_ID, &[0u8; 3]).is_err());

    let id = [0x5au8; 16];
    mk.set_exact_bytes(TUNNEL_ID, &id).unwrap();
    let cell = 2 * 3 * CELL_BYTES;
    let offset =
        u64::from_ne_bytes(mk.bytes()[cell..cell + CELL_BYTES].try_into().unwrap()) as usize;
    assert_eq!(offset, mk.spill_base());
}

#[test]
fn reset_behaves_like_a_fresh_buffer() {
    let info = pipeline();

    let mut fresh = MatchKey::new(&info, ACL_TABLE).unwrap();
    fresh.set_exact(VLAN_VID, 0x123u16).unwrap();
    fresh.set_lpm(IPV4_DST, 0x0a00_0000u32, 8).unwrap();
    fresh.set_exact_bytes(TUNNEL_ID, &[7u8; 16]).unwrap();

    let mut reused = MatchKey::new(&info, ACL_TABLE).unwrap();
    reused.set_exact(ETH_TYPE, 0x0800u16).unwrap();
    reused.set_ternary(COOKIE, 1u64, 0xffu64).unwrap();
    reused.set_exact_bytes(TUNNEL_ID, &[9u8; 16]).unwrap();
    reused.reset();
    assert_eq!(reused.fields_set(), 0);
    reused.set_exact(VLAN_VID, 0x123u16).unwrap();
    reused.set_lpm(IPV4_DST, 0x0a00_0000u32, 8).unwrap();
    reused.set_exact_bytes(TUNNEL_ID, &[7u8; 16]).unwrap();

    assert_eq!(fresh.bytes(), reused.bytes());
}

#[test]
fn unknown_ids_are_rejected() {
    let info = pipeline();
    assert_eq!(
        MatchKey::new(&info, 42).err(),
        Some(EncodeError::UnknownTable(42))
    );
    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    assert_eq!(
        mk.set_exact(999, 1u8),
        Err(EncodeError::UnknownField { table_id: ACL_TABLE, field_id: 999 })
    );
    assert_eq!(
        ActionData::new(&info, 42).err(),
        Some(EncodeError::UnknownAction(42))
    );
    let mut ad = ActionData::new(&info, DROP_ACTION).unwrap();
    assert_eq!(
        ad.set_arg(1, 1u8),
        Err(EncodeError::UnknownParam { action_id: DROP_ACTION, param_id: 1 })
    );
}

#[test]
fn action_arguments_format_like_keys() {
    let info = pipeline();
    let mut ad = ActionData::new(&info, FORWARD_ACTION).unwrap();

    // 9-bit parameter: two bytes with the top bit masked.
    ad.set_arg(1, 0x1ffu16).unwrap();
    assert_eq!(ad.arg_bytes(1).unwrap(), &[0x01, 0xff]);
    ad.set_arg(1, 0xffffu16).unwrap();
    assert_eq!(ad.arg_bytes(1).unwrap(), &[0x01, 0xff]);

    // A u8 is narrower than 9 bits.
    assert_eq!(
        ad.set_arg(1, 3u8),
        Err(EncodeError::TooWide { field_id: 1, field_bits: 9, value_bits: 8 })
    );

    ad.set_arg_bytes(2, &[0x0a, 0xbc]).unwrap();
    assert_eq!(ad.arg_bytes(2).unwrap(), &[0x0a, 0xbc]);
    assert_eq!(ad.args_set(), 3);
}

#[test]
fn wide_action_arguments_spill() {
    let info = pipeline();
    let mut ad = ActionData::new(&info, SET_TUNNEL_ACTION).unwrap();
    assert_eq!(ad.bytes().len(), CELL_BYTES + 16);
    let id = [0xa5u8; 16];
    ad.set_arg_bytes(1, &id).unwrap();
    assert_eq!(ad.arg_bytes(1).unwrap(), &id);
}

#[derive(Default)]
struct RecordingBackend {
    added: Vec<(DevTarget, u32, Vec<u8>, u32, Vec<u8>, bool)>,
    deleted: Vec<(u64, u32, EntryHandle)>,
}

impl TableBackend for RecordingBackend {
    fn table_entry_add(
        &mut self,
        dev_tgt: DevTarget,
        table_id: u32,
        match_key: &MatchKey,
        action_id: u32,
        action_data: &ActionData,
        overwrite: bool,
    ) -> anyhow::Result<EntryHandle> {
        self.added.push((
            dev_tgt,
            table_id,
            match_key.bytes().to_vec(),
            action_id,
            action_data.bytes().to_vec(),
            overwrite,
        ));
        Ok(self.added.len() as EntryHandle)
    }

    fn table_entry_delete(
        &mut self,
        device_id: u64,
        table_id: u32,
        handle: EntryHandle,
    ) -> anyhow::Result<()> {
        self.deleted.push((device_id, table_id, handle));
        Ok(())
    }
}

#[test]
fn entry_add_checks_buffer_identity() {
    let info = pipeline();
    let mut backend = RecordingBackend::default();

    let mut mk = MatchKey::new(&info, ACL_TABLE).unwrap();
    mk.set_exact(VLAN_VID, 0x123u16).unwrap();
    let mut ad = ActionData::new(&info, FORWARD_ACTION).unwrap();
    ad.set_arg(1, 7u16).unwrap();

    // A key built for another table is refused before the backend sees it.
    let wrong_table = MatchTable::new(FWD_TABLE);
    match wrong_table.entry_add(
        &mut backend,
        DevTarget::new(0),
        &mk,
        FORWARD_ACTION,
        &ad,
        false,
    ) {
        Err(EntryError::TableMismatch { table_id, built_for }) => {
            assert_eq!((table_id, built_for), (FWD_TABLE, ACL_TABLE));
        }
        other => panic!("expected TableMismatch, got {:?}", other.map(|_| ())),
    }

    // So is action data built for another action.
    let table = MatchTable::new(ACL_TABLE);
    match table.entry_add(&mut backend, DevTarget::new(0), &mk, DROP_ACTION, &ad, false) {
        Err(EntryError::ActionMismatch { action_id, built_for }) => {
            assert_eq!((action_id, built_for), (DROP_ACTION, FORWARD_ACTION));
        }
        other => panic!("expected ActionMismatch, got {:?}", other.map(|_| ())),
    }
    assert!(backend.added.is_empty());

    let handle = table
        .entry_add(&mut backend, DevTarget::new(3), &mk, FORWARD_ACTION, &ad, false)
        .unwrap();
    assert_eq!(backend.added.len(), 1);
    assert_eq!(backend.added[0].0, DevTarget::new(3));
    assert_eq!(backend.added[0].1, ACL_TABLE);

    table.entry_delete(&mut backend, 3, handle).unwrap();
    assert_eq!(backend.deleted, vec![(3, ACL_TABLE, handle)]);
}
