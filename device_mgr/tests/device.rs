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

use device_mgr::DeviceMgr;
use proto::code::Code;
use proto::p4info::{
    Action, ActionRef, Action_Param, MatchField, MatchField_MatchType, P4Info, Preamble, Table,
};
use proto::p4runtime::{
    Entity, FieldMatch, FieldMatch_Exact, FieldMatch_oneof_field_match_type,
    ForwardingPipelineConfig, PacketIn, PacketOut, ReadRequest, ReadResponse,
    SetForwardingPipelineConfigRequest_Action as ConfigAction, TableAction, TableEntry, Update,
    Update_Type, WriteRequest,
};
use protobuf::RepeatedField;
use std::sync::{Arc, Mutex};

const TABLE: u32 = 0x0200_0001;
const ACTION: u32 = 0x0100_0001;
const VLAN_VID: u32 = 1;
const PORT_PARAM: u32 = 1;

fn test_p4info() -> P4Info {
    let mut preamble = Preamble::new();
    preamble.set_id(TABLE);
    preamble.set_name("MyIngress.vlan".to_string());

    let mut mf = MatchField::new();
    mf.set_id(VLAN_VID);
    mf.set_name("hdr.vlan.vid".to_string());
    mf.set_bitwidth(12);
    mf.set_match_type(MatchField_MatchType::EXACT);

    let mut ar = ActionRef::new();
    ar.set_id(ACTION);

    let mut table = Table::new();
    table.set_preamble(preamble);
    table.set_match_fields(RepeatedField::from_vec(vec![mf]));
    table.set_action_refs(RepeatedField::from_vec(vec![ar]));

    let mut action_preamble = Preamble::new();
    action_preamble.set_id(ACTION);
    action_preamble.set_name("MyIngress.forward".to_string());
    let mut param = Action_Param::new();
    param.set_id(PORT_PARAM);
    param.set_name("port".to_string());
    param.set_bitwidth(9);
    let mut action = Action::new();
    action.set_preamble(action_preamble);
    action.set_params(RepeatedField::from_vec(vec![param]));

    let mut p4info = P4Info::new();
    p4info.set_tables(RepeatedField::from_vec(vec![table]));
    p4info.set_actions(RepeatedField::from_vec(vec![action]));
    p4info
}

fn pipeline_config() -> ForwardingPipelineConfig {
    let mut config = ForwardingPipelineConfig::new();
    config.set_p4info(test_p4info());
    config
}

fn table_entry(vid: &[u8], port: &[u8]) -> TableEntry {
    let mut exact = FieldMatch_Exact::new();
    exact.set_value(vid.to_vec());
    let mut fm = FieldMatch::new();
    fm.set_field_id(VLAN_VID);
    fm.field_match_type = Some(FieldMatch_oneof_field_match_type::exact(exact));

    let mut action = proto::p4runtime::Action::new();
    action.set_action_id(ACTION);
    let mut action_param = proto::p4runtime::Action_Param::new();
    action_param.set_param_id(PORT_PARAM);
    action_param.set_value(port.to_vec());
    action.mut_params().push(action_param);
    let mut table_action = TableAction::new();
    table_action.set_action(action);

    let mut te = TableEntry::new();
    te.set_table_id(TABLE);
    te.mut_field_match().push(fm);
    te.set_action(table_action);
    te
}

fn write_request(op: Update_Type, te: TableEntry) -> WriteRequest {
    let mut entity = Entity::new();
    entity.set_table_entry(te);
    let mut update = Update::new();
    update.set_field_type(op);
    update.set_entity(entity);
    let mut request = WriteRequest::new();
    request.set_device_id(7);
    request.mut_updates().push(update);
    request
}

fn detail_codes(status: &device_mgr::Status) -> Vec<i32> {
    status
        .get_details()
        .iter()
        .map(|any| {
            any.unpack::<proto::p4runtime::Error>()
                .unwrap()
                .unwrap()
                .get_canonical_code()
        })
        .collect()
}

#[test]
fn table_ops_require_a_committed_pipeline() {
    let device = DeviceMgr::new(7);
    let request = write_request(Update_Type::INSERT, table_entry(&[0x00, 0x01], &[0x00, 0x0b]));

    let status = device.write(&request);
    assert_eq!(status.get_code(), Code::FAILED_PRECONDITION as i32);

    // VERIFY and VERIFY_AND_SAVE do not arm the device either.
    assert_eq!(device.pipeline_config_set(ConfigAction::VERIFY, &pipeline_config()).get_code(), 0);
    assert_eq!(
        device.pipeline_config_set(ConfigAction::VERIFY_AND_SAVE, &pipeline_config()).get_code(),
        0
    );
    let status = device.write(&request);
    assert_eq!(status.get_code(), Code::FAILED_PRECONDITION as i32);

    assert_eq!(
        device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &pipeline_config()).get_code(),
        0
    );
    assert_eq!(device.write(&request).get_code(), 0);
}

#[test]
fn pipeline_config_round_trips() {
    let device = DeviceMgr::new(7);

    let mut out = ForwardingPipelineConfig::new();
    let status = device.pipeline_config_get(&mut out);
    assert_eq!(status.get_code(), Code::FAILED_PRECONDITION as i32);

    device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &pipeline_config());
    let mut out = ForwardingPipelineConfig::new();
    assert_eq!(device.pipeline_config_get(&mut out).get_code(), 0);
    assert_eq!(out, pipeline_config());
}

#[test]
fn config_without_p4info_is_rejected() {
    let device = DeviceMgr::new(7);
    let status =
        device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &ForwardingPipelineConfig::new());
    assert_eq!(status.get_code(), Code::INVALID_ARGUMENT as i32);
}

#[test]
fn write_then_read_returns_the_entry() {
    let device = DeviceMgr::new(7);
    device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &pipeline_config());

    let te = table_entry(&[0x00, 0x01], &[0x00, 0x0b]);
    assert_eq!(device.write(&write_request(Update_Type::INSERT, te.clone())).get_code(), 0);

    let mut filter = Entity::new();
    filter.set_table_entry(TableEntry::new());
    let mut request = ReadRequest::new();
    request.set_device_id(7);
    request.mut_entities().push(filter);
    let mut response = ReadResponse::new();
    assert_eq!(device.read(&request, &mut response).get_code(), 0);
    assert_eq!(response.get_entities().len(), 1);
    assert_eq!(response.get_entities()[0].get_table_entry(), &te);

    // A filter naming another table matches nothing.
    let mut other = TableEntry::new();
    other.set_table_id(TABLE + 1);
    let mut filter = Entity::new();
    filter.set_table_entry(other);
    let mut request = ReadRequest::new();
    request.mut_entities().push(filter);
    let mut response = ReadResponse::new();
    device.read(&request, &mut response);
    assert_eq!(response.get_entities().len(), 0);
}

#[test]
fn duplicate_insert_reports_already_exists() {
    let device = DeviceMgr::new(7);
    device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &pipeline_config());

    let te = table_entry(&[0x00, 0x01], &[0x00, 0x0b]);
    device.write(&write_request(Update_Type::INSERT, te.clone()));
    let status = device.write(&write_request(Update_Type::INSERT, te));
    assert_eq!(status.get_code(), Code::UNKNOWN as i32);
    assert_eq!(detail_codes(&status), vec![Code::ALREADY_EXISTS as i32]);
}

#[test]
fn modify_and_delete_follow_entry_lifetimes() {
    let device = DeviceMgr::new(7);
    device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &pipeline_config());

    // MODIFY of a missing entry fails.
    let te = table_entry(&[0x00, 0x01], &[0x00, 0x0b]);
    let status = device.write(&write_request(Update_Type::MODIFY, te.clone()));
    assert_eq!(detail_codes(&status), vec![Code::NOT_FOUND as i32]);

    device.write(&write_request(Update_Type::INSERT, te.clone()));

    // MODIFY with a new action argument replaces the entry in place.
    let modified = table_entry(&[0x00, 0x01], &[0x00, 0x0c]);
    assert_eq!(device.write(&write_request(Update_Type::MODIFY, modified.clone())).get_code(), 0);
    let mut request = ReadRequest::new();
    let mut filter = Entity::new();
    filter.set_table_entry(TableEntry::new());
    request.mut_entities().push(filter);
    let mut response = ReadResponse::new();
    device.read(&request, &mut response);
    assert_eq!(response.get_entities()[0].get_table_entry(), &modified);

    assert_eq!(device.write(&write_request(Update_Type::DELETE, te.clone())).get_code(), 0);
    let status = device.write(&write_request(Update_Type::DELETE, te));
    assert_eq!(detail_codes(&status), vec![Code::NOT_FOUND as i32]);
}

#[test]
fn malformed_updates_report_per_update_errors() {
    let device = DeviceMgr::new(7);
    device.pipeline_config_set(ConfigAction::VERIFY_AND_COMMIT, &pipeline_config());

    // Wrong key width for a 12-bit field.
    let status = device.write(&write_request(
        Update_Type::INSERT,
        table_entry(&[0x01], &[0x00, 0x0b]),
    ));
    assert_eq!(detail_codes(&status), vec![Code::INVALID_ARGUMENT as i32]);

    // Unknown table id.
    let mut te = table_entry(&[0x00, 0x01], &[0x00, 0x0b]);
    te.set_table_id(0x42);
    let status = device.write(&write_request(Update_Type::INSERT, te));
    assert_eq!(detail_codes(&status), vec![Code::NOT_FOUND as i32]);

    // A batch reports one detail per update, in order.
    let good = table_entry(&[0x00, 0x02], &[0x00, 0x0b]);
    let bad = table_entry(&[0x01], &[0x00, 0x0b]);
    let mut request = write_request(Update_Type::INSERT, good);
    let mut entity = Entity::new();
    entity.set_table_entry(bad);
    let mut update = Update::new();
    update.set_field_type(Update_Type::INSERT);
    update.set_entity(entity);
    request.mut_updates().push(update);
    let status = device.write(&request);
    assert_eq!(
        detail_codes(&status),
        vec![Code::OK as i32, Code::INVALID_ARGUMENT as i32]
    );
}

#[test]
fn packet_out_frames_are_recorded() {
    let device = DeviceMgr::new(7);
    let mut packet = PacketOut::new();
    packet.set_payload(vec![0xde, 0xad, 0xbe, 0xef]);
    device.packet_out_send(packet.clone());
    device.packet_out_send(packet.clone());

    assert_eq!(device.packet_out_count(), 2);
    assert_eq!(device.take_packet_outs(), vec![packet.clone(), packet]);
    assert!(device.take_packet_outs().is_empty());
}

#[test]
fn packet_in_reaches_the_registered_sink() {
    let device = DeviceMgr::new(7);

    // No sink registered: the packet is dropped.
    let mut packet = PacketIn::new();
    packet.set_payload(vec![1, 2, 3]);
    device.packet_in_inject(packet.clone());

    let received: Arc<Mutex<Vec<(u64, PacketIn)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    device.packet_in_register_cb(Arc::new(move |device_id, packet| {
        sink.lock().unwrap().push((device_id, packet));
    }));
    device.packet_in_inject(packet.clone());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], (7, packet));
}
