/*!
Device-management layer for the P4Runtime server.

A [`DeviceMgr`] owns everything the server knows about one forwarding
device: its pipeline configuration, the table entries programmed into it,
its packet-out sink and its packet-in source.  The gRPC services translate
requests into calls on this type and pass its
[`google.rpc.Status`](proto::status::Status) results back to clients
untouched.

Table writes flow through the [`p4entry`] encoders: every field match and
action argument is formatted into the compact binary buffers, and the
in-memory [table store](p4entry::TableBackend) keys entries by the canonical
encoded bytes.

[`ConfigMgr`] is the process-wide configuration-tree store behind the gNMI
`Get` and `Set` RPCs.
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

use p4entry::{
    ActionData, DevTarget, EntryError, MatchKey, MatchTable, PipelineInfo, TableInfo,
};
use proto::code::Code;
use proto::p4runtime::{
    FieldMatch, FieldMatch_oneof_field_match_type, ForwardingPipelineConfig, PacketIn, PacketOut,
    ReadRequest, ReadResponse, SetForwardingPipelineConfigRequest_Action as ConfigAction,
    TableEntry, Update, Update_Type, WriteRequest,
};
use protobuf::well_known_types::Any;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

mod config;
mod store;

pub use config::ConfigMgr;
use store::TableStore;

/// Status type shared with the wire: `google.rpc.Status`.
pub type Status = proto::status::Status;

/// A success status.
pub fn ok_status() -> Status {
    Status::new()
}

/// A failure status with the given canonical code and message.
pub fn error_status(code: Code, message: impl Into<String>) -> Status {
    let mut status = Status::new();
    status.set_code(code as i32);
    status.set_message(message.into());
    status
}

/// Internal failure carrying the canonical code it maps to on the wire.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct Fail {
    pub(crate) code: Code,
    pub(crate) message: String,
}

impl Fail {
    pub(crate) fn new(code: Code, message: impl Into<String>) -> Fail {
        Fail { code, message: message.into() }
    }
}

fn error_code(err: &anyhow::Error) -> Code {
    if let Some(fail) = err.downcast_ref::<Fail>() {
        fail.code
    } else if err.downcast_ref::<p4entry::EncodeError>().is_some() {
        Code::INVALID_ARGUMENT
    } else if let Some(entry) = err.downcast_ref::<EntryError>() {
        match entry {
            EntryError::TableMismatch { .. } | EntryError::ActionMismatch { .. } => {
                Code::INVALID_ARGUMENT
            }
            EntryError::Backend(inner) => error_code(inner),
        }
    } else {
        Code::UNKNOWN
    }
}

/// Sink for packets the device punts to the control plane.  Invoked from
/// the device's own threads.
pub type PacketInCallback = Arc<dyn Fn(u64, PacketIn) + Send + Sync>;

const PACKET_OUT_LOG_LIMIT: usize = 128;

#[derive(Default)]
struct DeviceState {
    config: Option<ForwardingPipelineConfig>,
    info: Option<Arc<PipelineInfo>>,
    tables: TableStore,
    entries: BTreeMap<p4entry::EntryHandle, TableEntry>,
    packet_outs: VecDeque<PacketOut>,
    packet_out_count: u64,
}

/// Management handle for one forwarding device.
pub struct DeviceMgr {
    device_id: u64,
    state: Mutex<DeviceState>,
    packet_in_cb: Mutex<Option<PacketInCallback>>,
}

impl DeviceMgr {
    /// A manager for the device with the given id, with no pipeline
    /// configured.
    pub fn new(device_id: u64) -> DeviceMgr {
        DeviceMgr {
            device_id,
            state: Mutex::new(DeviceState::default()),
            packet_in_cb: Mutex::new(None),
        }
    }

    /// The id this device was created for.
    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    fn no_pipeline() -> Status {
        error_status(
            Code::FAILED_PRECONDITION,
            "no forwarding pipeline config committed for this device",
        )
    }

    /// Applies a forwarding-pipeline config operation.
    ///
    /// `VERIFY` only validates; `VERIFY_AND_SAVE` stores the config without
    /// arming it; the commit actions store it and build the encoding
    /// metadata that table writes require.  A fresh commit via
    /// `VERIFY_AND_COMMIT` clears programmed forwarding state.
    pub fn pipeline_config_set(
        &self,
        action: ConfigAction,
        config: &ForwardingPipelineConfig,
    ) -> Status {
        if action == ConfigAction::UNSPECIFIED {
            return error_status(Code::INVALID_ARGUMENT, "unspecified pipeline config action");
        }
        if !config.has_p4info() {
            return error_status(Code::INVALID_ARGUMENT, "pipeline config carries no P4Info");
        }
        let info = PipelineInfo::from(config.get_p4info());

        let mut state = self.state.lock().unwrap();
        match action {
            ConfigAction::UNSPECIFIED => unreachable!(),
            ConfigAction::VERIFY => (),
            ConfigAction::VERIFY_AND_SAVE => {
                state.config = Some(config.clone());
            }
            ConfigAction::VERIFY_AND_COMMIT => {
                state.config = Some(config.clone());
                state.info = Some(Arc::new(info));
                state.tables = TableStore::default();
                state.entries.clear();
            }
            ConfigAction::RECONCILE_AND_COMMIT => {
                state.config = Some(config.clone());
                state.info = Some(Arc::new(info));
            }
        }
        debug!(device_id = self.device_id, ?action, "pipeline config set");
        ok_status()
    }

    /// Copies the saved pipeline config into `config`.
    pub fn pipeline_config_get(&self, config: &mut ForwardingPipelineConfig) -> Status {
        let state = self.state.lock().unwrap();
        match &state.config {
            Some(saved) => {
                config.clone_from(saved);
                ok_status()
            }
            None => Self::no_pipeline(),
        }
    }

    /// Applies a write batch.  Every update is attempted; if any fails, the
    /// returned status carries one `p4.v1.Error` detail per update, in
    /// batch order.
    pub fn write(&self, request: &WriteRequest) -> Status {
        let mut state = self.state.lock().unwrap();
        let info = match &state.info {
            Some(info) => info.clone(),
            None => return Self::no_pipeline(),
        };

        let mut results = Vec::with_capacity(request.get_updates().len());
        let mut failed = false;
        for update in request.get_updates() {
            match Self::apply_update(self.device_id, &mut state, &info, update) {
                Ok(()) => results.push((Code::OK, String::new())),
                Err(err) => {
                    debug!(device_id = self.device_id, "write update failed: {:#}", err);
                    failed = true;
                    results.push((error_code(&err), format!("{:#}", err)));
                }
            }
        }
        if !failed {
            return ok_status();
        }

        let mut status = error_status(Code::UNKNOWN, "one or more updates failed");
        for (code, message) in results {
            let mut error = proto::p4runtime::Error::new();
            error.set_canonical_code(code as i32);
            error.set_message(message);
            status.mut_details().push(Any::pack(&error).expect("pack p4.Error"));
        }
        status
    }

    fn apply_update(
        device_id: u64,
        state: &mut DeviceState,
        info: &PipelineInfo,
        update: &Update,
    ) -> anyhow::Result<()> {
        let entity = update.get_entity();
        if !entity.has_table_entry() {
            return Err(Fail::new(Code::UNIMPLEMENTED, "only table entries are supported").into());
        }
        let te = entity.get_table_entry();
        let table_id = te.get_table_id();
        let table = info.table(table_id).ok_or_else(|| {
            Fail::new(Code::NOT_FOUND, format!("unknown table {:#x}", table_id))
        })?;

        let mut mk = MatchKey::new(info, table_id)?;
        mk.set_priority(te.get_priority());
        for fm in in_declaration_order(table, te.get_field_match()) {
            let field_id = fm.get_field_id();
            match &fm.field_match_type {
                Some(FieldMatch_oneof_field_match_type::exact(e)) => {
                    mk.set_exact_bytes(field_id, e.get_value())?
                }
                Some(FieldMatch_oneof_field_match_type::lpm(l)) => {
                    mk.set_lpm_bytes(field_id, l.get_value(), l.get_prefix_len())?
                }
                Some(FieldMatch_oneof_field_match_type::ternary(t)) => {
                    mk.set_ternary_bytes(field_id, t.get_value(), t.get_mask())?
                }
                None => {
                    return Err(Fail::new(
                        Code::INVALID_ARGUMENT,
                        format!("field match {:#x} carries no value", field_id),
                    )
                    .into())
                }
            }
        }

        let table_ops = MatchTable::new(table_id);
        match update.get_field_type() {
            Update_Type::UNSPECIFIED => {
                Err(Fail::new(Code::INVALID_ARGUMENT, "unspecified update type").into())
            }
            op @ (Update_Type::INSERT | Update_Type::MODIFY) => {
                if !te.has_action() {
                    return Err(Fail::new(Code::INVALID_ARGUMENT, "entry names no action").into());
                }
                if !te.get_action().has_action() {
                    return Err(
                        Fail::new(Code::UNIMPLEMENTED, "only direct actions are supported").into()
                    );
                }
                let action = te.get_action().get_action();
                let action_id = action.get_action_id();
                let mut ad = ActionData::new(info, action_id)?;
                for p in action.get_params() {
                    ad.set_arg_bytes(p.get_param_id(), p.get_value())?;
                }
                let handle = table_ops.entry_add(
                    &mut state.tables,
                    DevTarget::new(device_id),
                    &mk,
                    action_id,
                    &ad,
                    op == Update_Type::MODIFY,
                )?;
                state.entries.insert(handle, te.clone());
                Ok(())
            }
            Update_Type::DELETE => {
                let handle = state
                    .tables
                    .lookup(table_id, mk.bytes(), mk.priority())
                    .ok_or_else(|| Fail::new(Code::NOT_FOUND, "no such entry"))?;
                table_ops.entry_delete(&mut state.tables, device_id, handle)?;
                state.entries.remove(&handle);
                Ok(())
            }
        }
    }

    /// Copies the table entries matching the request's filters into
    /// `response`.  A zero table id in a filter acts as a wildcard.
    pub fn read(&self, request: &ReadRequest, response: &mut ReadResponse) -> Status {
        let state = self.state.lock().unwrap();
        if state.info.is_none() {
            return Self::no_pipeline();
        }
        for entity in request.get_entities() {
            if !entity.has_table_entry() {
                return error_status(Code::UNIMPLEMENTED, "only table entries can be read");
            }
            let filter = entity.get_table_entry();
            for te in state.entries.values() {
                if filter.get_table_id() != 0 && filter.get_table_id() != te.get_table_id() {
                    continue;
                }
                let mut entity = proto::p4runtime::Entity::new();
                entity.set_table_entry(te.clone());
                response.mut_entities().push(entity);
            }
        }
        ok_status()
    }

    /// Hands a packet to the device's data plane.
    pub fn packet_out_send(&self, packet: PacketOut) {
        let mut state = self.state.lock().unwrap();
        state.packet_out_count += 1;
        if state.packet_outs.len() == PACKET_OUT_LOG_LIMIT {
            state.packet_outs.pop_front();
        }
        debug!(
            device_id = self.device_id,
            payload_len = packet.get_payload().len(),
            "packet out"
        );
        state.packet_outs.push_back(packet);
    }

    /// Drains the recorded packet-out frames.
    pub fn take_packet_outs(&self) -> Vec<PacketOut> {
        self.state.lock().unwrap().packet_outs.drain(..).collect()
    }

    /// Total number of packet-out frames the device has accepted.
    pub fn packet_out_count(&self) -> u64 {
        self.state.lock().unwrap().packet_out_count
    }

    /// Registers the packet-in sink, replacing any previous one.
    pub fn packet_in_register_cb(&self, cb: PacketInCallback) {
        *self.packet_in_cb.lock().unwrap() = Some(cb);
    }

    /// Delivers a packet punted by the (simulated) data plane to the
    /// registered sink, on the caller's thread.  Dropped when no sink is
    /// registered.
    pub fn packet_in_inject(&self, packet: PacketIn) {
        let cb = self.packet_in_cb.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb(self.device_id, packet);
        }
    }
}

/// Reorders wire field matches into the table's declaration order, so that
/// spill allocation in the match key does not depend on the order a client
/// happened to serialize them in.
fn in_declaration_order<'a>(
    table: &TableInfo,
    field_matches: &'a [FieldMatch],
) -> Vec<&'a FieldMatch> {
    let mut ordered: Vec<&FieldMatch> = field_matches.iter().collect();
    ordered.sort_by_key(|fm| {
        table.match_field_index(fm.get_field_id()).unwrap_or(usize::MAX)
    });
    ordered
}
