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

//! Unary service facades: look the device up, forward, translate the
//! returned status.  The `StreamChannel` RPC hands off to [`crate::stream`].

use crate::stream::{self, ClientRoster};
use crate::Devices;
use device_mgr::{ConfigMgr, Status};
use futures::{FutureExt, SinkExt, TryFutureExt, TryStreamExt};
use grpcio::{
    DuplexSink, RequestStream, RpcContext, RpcStatus, RpcStatusCode, ServerStreamingSink,
    UnarySink,
};
use proto::gnmi::{
    CapabilityRequest, CapabilityResponse, GetRequest, GetResponse, SetRequest, SetResponse,
    SubscribeRequest, SubscribeResponse,
};
use proto::gnmi_grpc::gNMI;
use proto::p4runtime::{
    CapabilitiesRequest, CapabilitiesResponse, ForwardingPipelineConfig,
    GetForwardingPipelineConfigRequest, GetForwardingPipelineConfigResponse, ReadRequest,
    ReadResponse, SetForwardingPipelineConfigRequest, SetForwardingPipelineConfigResponse,
    StreamMessageRequest, StreamMessageResponse, WriteRequest, WriteResponse,
};
use proto::p4runtime_grpc::P4Runtime;
use protobuf::Message;
use std::sync::Arc;
use tracing::{debug, error};

fn unary_fail<T>(ctx: &RpcContext, sink: UnarySink<T>, status: RpcStatus) {
    let f = sink
        .fail(status)
        .map_err(|e| error!("failed to send error: {:?}", e))
        .map(|_| ());
    ctx.spawn(f);
}

fn unary_success<T>(ctx: &RpcContext, sink: UnarySink<T>, reply: T) {
    let f = sink
        .success(reply)
        .map_err(|e: grpcio::Error| error!("reply failed: {:?}", e))
        .map(|_| ());
    ctx.spawn(f);
}

fn server_streaming_fail<T>(ctx: &RpcContext, sink: ServerStreamingSink<T>, status: RpcStatus) {
    let f = sink
        .fail(status)
        .map_err(|e| error!("failed to send error: {:?}", e))
        .map(|_| ());
    ctx.spawn(f);
}

fn server_streaming_success<T: Send + 'static>(
    ctx: &RpcContext,
    mut sink: ServerStreamingSink<T>,
    reply: Vec<T>,
) {
    let f = async move {
        for msg in reply {
            sink.send((msg, Default::default())).await?;
        }
        sink.close().await?;
        Ok(())
    }
    .map_err(|e: grpcio::Error| error!("failed to stream response: {:?}", e))
    .map(|_| ());
    ctx.spawn(f);
}

fn unimplemented() -> RpcStatus {
    RpcStatus::with_message(RpcStatusCode::UNIMPLEMENTED, "not implemented yet".to_string())
}

fn no_pipeline_config_status() -> RpcStatus {
    RpcStatus::with_message(
        RpcStatusCode::FAILED_PRECONDITION,
        "No forwarding pipeline config set for this device".to_string(),
    )
}

/// Converts a device status into the wire status: same canonical code when
/// it is one, and the serialized `google.rpc.Status` as the detail payload.
fn to_rpc_status(status: Status) -> RpcStatus {
    let code = status.get_code();
    let code = if code >= RpcStatusCode::OK.into() && code <= RpcStatusCode::DATA_LOSS.into() {
        RpcStatusCode::from(code)
    } else {
        RpcStatusCode::UNKNOWN
    };
    let details = status.write_to_bytes().unwrap_or_default();
    RpcStatus::with_details(code, status.get_message().to_string(), details)
}

fn is_ok(status: &Status) -> bool {
    status.get_code() == 0
}

/// The P4Runtime service: unary handlers forward to the target device, the
/// stream handler joins the multiplexer.
#[derive(Clone)]
pub struct P4RuntimeService {
    devices: Arc<Devices>,
    roster: Arc<ClientRoster>,
}

impl P4RuntimeService {
    /// A service over the given registry and client roster.
    pub fn new(devices: Arc<Devices>, roster: Arc<ClientRoster>) -> P4RuntimeService {
        P4RuntimeService { devices, roster }
    }
}

impl P4Runtime for P4RuntimeService {
    fn write(&mut self, ctx: RpcContext, req: WriteRequest, sink: UnarySink<WriteResponse>) {
        debug!(device_id = req.get_device_id(), "P4Runtime Write");
        let device = match self.devices.get(req.get_device_id()) {
            Some(device) => device,
            None => return unary_fail(&ctx, sink, no_pipeline_config_status()),
        };
        let status = device.write(&req);
        if is_ok(&status) {
            unary_success(&ctx, sink, WriteResponse::new());
        } else {
            unary_fail(&ctx, sink, to_rpc_status(status));
        }
    }

    fn read(&mut self, ctx: RpcContext, req: ReadRequest, sink: ServerStreamingSink<ReadResponse>) {
        debug!(device_id = req.get_device_id(), "P4Runtime Read");
        let device = match self.devices.get(req.get_device_id()) {
            Some(device) => device,
            None => return server_streaming_fail(&ctx, sink, no_pipeline_config_status()),
        };
        let mut response = ReadResponse::new();
        let status = device.read(&req, &mut response);
        if is_ok(&status) {
            server_streaming_success(&ctx, sink, vec![response]);
        } else {
            server_streaming_fail(&ctx, sink, to_rpc_status(status));
        }
    }

    fn set_forwarding_pipeline_config(
        &mut self,
        ctx: RpcContext,
        req: SetForwardingPipelineConfigRequest,
        sink: UnarySink<SetForwardingPipelineConfigResponse>,
    ) {
        debug!(device_id = req.get_device_id(), "P4Runtime SetForwardingPipelineConfig");
        let device = self.devices.get_or_create(req.get_device_id());
        let status = device.pipeline_config_set(req.get_action(), req.get_config());
        if !is_ok(&status) {
            return unary_fail(&ctx, sink, to_rpc_status(status));
        }
        // With a pipeline in place the device can start punting packets:
        // wire its packet-in events to the stream clients.
        let roster = self.roster.clone();
        device.packet_in_register_cb(Arc::new(move |device_id, packet| {
            roster.notify_clients(device_id, &packet);
        }));
        unary_success(&ctx, sink, SetForwardingPipelineConfigResponse::new());
    }

    fn get_forwarding_pipeline_config(
        &mut self,
        ctx: RpcContext,
        req: GetForwardingPipelineConfigRequest,
        sink: UnarySink<GetForwardingPipelineConfigResponse>,
    ) {
        debug!(device_id = req.get_device_id(), "P4Runtime GetForwardingPipelineConfig");
        let device = match self.devices.get(req.get_device_id()) {
            Some(device) => device,
            None => return unary_fail(&ctx, sink, no_pipeline_config_status()),
        };
        let mut config = ForwardingPipelineConfig::new();
        let status = device.pipeline_config_get(&mut config);
        if is_ok(&status) {
            let mut response = GetForwardingPipelineConfigResponse::new();
            response.set_config(config);
            unary_success(&ctx, sink, response);
        } else {
            unary_fail(&ctx, sink, to_rpc_status(status));
        }
    }

    fn stream_channel(
        &mut self,
        ctx: RpcContext,
        stream: RequestStream<StreamMessageRequest>,
        sink: DuplexSink<StreamMessageResponse>,
    ) {
        stream::handle_stream_channel(&ctx, self.devices.clone(), self.roster.clone(), stream, sink);
    }

    fn capabilities(
        &mut self,
        ctx: RpcContext,
        _req: CapabilitiesRequest,
        sink: UnarySink<CapabilitiesResponse>,
    ) {
        debug!("P4Runtime Capabilities");
        unary_fail(&ctx, sink, unimplemented());
    }
}

/// The gNMI service: `Get` and `Set` forward to the process-wide
/// [`ConfigMgr`]; `Capabilities` and `Subscribe` are not implemented.
#[derive(Clone)]
pub struct GnmiService {
    config: Arc<ConfigMgr>,
}

impl GnmiService {
    /// A service over the given configuration store.
    pub fn new(config: Arc<ConfigMgr>) -> GnmiService {
        GnmiService { config }
    }
}

impl gNMI for GnmiService {
    fn capabilities(
        &mut self,
        ctx: RpcContext,
        _req: CapabilityRequest,
        sink: UnarySink<CapabilityResponse>,
    ) {
        debug!("gNMI Capabilities");
        unary_fail(&ctx, sink, unimplemented());
    }

    fn get(&mut self, ctx: RpcContext, req: GetRequest, sink: UnarySink<GetResponse>) {
        debug!("gNMI Get");
        let mut response = GetResponse::new();
        let status = self.config.get(&req, &mut response);
        if is_ok(&status) {
            unary_success(&ctx, sink, response);
        } else {
            unary_fail(&ctx, sink, to_rpc_status(status));
        }
    }

    fn set(&mut self, ctx: RpcContext, req: SetRequest, sink: UnarySink<SetResponse>) {
        debug!("gNMI Set");
        let mut response = SetResponse::new();
        let status = self.config.set(&req, &mut response);
        if is_ok(&status) {
            unary_success(&ctx, sink, response);
        } else {
            unary_fail(&ctx, sink, to_rpc_status(status));
        }
    }

    fn subscribe(
        &mut self,
        ctx: RpcContext,
        mut stream: RequestStream<SubscribeRequest>,
        mut sink: DuplexSink<SubscribeResponse>,
    ) {
        debug!("gNMI Subscribe");
        // Keep the channel open but reject the first actual request.
        let f = async move {
            if stream.try_next().await?.is_some() {
                sink.fail(unimplemented()).await?;
            } else {
                sink.close().await?;
            }
            Ok(())
        }
        .map_err(|e: grpcio::Error| debug!("gNMI Subscribe stream closed: {:?}", e))
        .map(|_| ());
        ctx.spawn(f);
    }
}
