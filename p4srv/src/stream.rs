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

//! The `StreamChannel` multiplexer: per-connection reader and writer state
//! machines, the roster of connected clients, and the packet-in fan-out.
//!
//! Each connection owns a [`StreamWriter`] with a tri-state write machine.
//! A packet-in is queued only on the `CanWrite` → `MustWait` edge, so at
//! most one response is in flight per client and anything arriving while a
//! write is outstanding is dropped.  That keeps per-client memory bounded
//! no matter how fast the device punts packets.

use crate::Devices;
use futures::channel::mpsc;
use futures::{FutureExt, SinkExt, StreamExt, TryFutureExt, TryStreamExt};
use grpcio::{
    DuplexSink, RequestStream, RpcContext, RpcStatus, RpcStatusCode, WriteFlags,
};
use proto::p4runtime::{
    PacketIn, StreamMessageRequest, StreamMessageRequest_oneof_update, StreamMessageResponse,
};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, trace};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WriterState {
    Created,
    CanWrite,
    MustWait,
}

enum WriterEvent {
    Response(StreamMessageResponse),
    Abort(RpcStatus),
}

/// The write half of one `StreamChannel` connection.
///
/// Fan-out callers hold this through the roster; the paired write loop owns
/// the gRPC sink and drains the event channel on the completion worker.
pub struct StreamWriter {
    inner: Mutex<WriterInner>,
}

struct WriterInner {
    state: WriterState,
    tx: mpsc::UnboundedSender<WriterEvent>,
}

impl StreamWriter {
    fn new() -> (Arc<StreamWriter>, mpsc::UnboundedReceiver<WriterEvent>) {
        let (tx, rx) = mpsc::unbounded();
        let writer = StreamWriter {
            inner: Mutex::new(WriterInner { state: WriterState::Created, tx }),
        };
        (Arc::new(writer), rx)
    }

    /// First drive: the writer becomes writable.  Happens before the writer
    /// is registered anywhere a fan-out could observe it.
    fn drive(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == WriterState::Created {
            inner.state = WriterState::CanWrite;
        }
    }

    /// Queues `packet` for this client unless a write is already in
    /// flight, in which case the packet is dropped.
    pub(crate) fn send(&self, device_id: u64, packet: &PacketIn) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != WriterState::CanWrite {
            return;
        }
        inner.state = WriterState::MustWait;
        trace!(device_id, payload_len = packet.get_payload().len(), "queueing packet-in");
        let mut response = StreamMessageResponse::new();
        response.set_packet(packet.clone());
        let _ = inner.tx.unbounded_send(WriterEvent::Response(response));
    }

    /// The in-flight write finished; the writer may accept another packet.
    fn write_complete(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == WriterState::MustWait {
            inner.state = WriterState::CanWrite;
        }
    }

    /// Lets any queued response drain, then closes the stream.
    fn finish(&self) {
        self.inner.lock().unwrap().tx.close_channel();
    }

    /// Fails the stream with `status` after any queued response.
    fn abort(&self, status: RpcStatus) {
        let inner = self.inner.lock().unwrap();
        let _ = inner.tx.unbounded_send(WriterEvent::Abort(status));
        inner.tx.close_channel();
    }
}

/// The live `StreamChannel` clients.  Writers join on stream open and leave
/// before their stream finishes.
#[derive(Default)]
pub struct ClientRoster {
    clients: Mutex<Vec<Arc<StreamWriter>>>,
}

impl ClientRoster {
    /// An empty roster.
    pub fn new() -> ClientRoster {
        ClientRoster::default()
    }

    fn register(&self, writer: Arc<StreamWriter>) {
        self.clients.lock().unwrap().push(writer);
    }

    fn remove(&self, writer: &Arc<StreamWriter>) {
        self.clients.lock().unwrap().retain(|c| !Arc::ptr_eq(c, writer));
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    /// Whether no client is connected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fans a packet-in out to every connected client.  Called from device
    /// threads: the roster lock is held only to snapshot the writer list,
    /// never across the sends themselves.
    pub fn notify_clients(&self, device_id: u64, packet: &PacketIn) {
        let snapshot: Vec<Arc<StreamWriter>> = self.clients.lock().unwrap().clone();
        for client in snapshot {
            client.send(device_id, packet);
        }
    }
}

/// Drives one `StreamChannel` connection: spawns the write loop and the
/// read loop on the completion worker.
pub(crate) fn handle_stream_channel(
    ctx: &RpcContext,
    devices: Arc<Devices>,
    roster: Arc<ClientRoster>,
    mut stream: RequestStream<StreamMessageRequest>,
    mut sink: DuplexSink<StreamMessageResponse>,
) {
    let (writer, mut rx) = StreamWriter::new();
    writer.drive();
    roster.register(writer.clone());
    debug!(clients = roster.len(), "stream channel opened");

    let write_half = writer.clone();
    let write_loop = async move {
        while let Some(event) = rx.next().await {
            match event {
                WriterEvent::Response(response) => {
                    sink.send((response, WriteFlags::default())).await?;
                    write_half.write_complete();
                }
                WriterEvent::Abort(status) => {
                    sink.fail(status).await?;
                    return Ok(());
                }
            }
        }
        sink.close().await?;
        Ok::<(), grpcio::Error>(())
    }
    .map_err(|e| debug!("stream channel write half closed: {:?}", e))
    .map(|_| ());
    ctx.spawn(write_loop);

    let read_loop = async move {
        let mut device_id: u64 = 0;
        loop {
            match stream.try_next().await {
                Ok(Some(request)) => match request.update {
                    Some(StreamMessageRequest_oneof_update::arbitration(arbitration)) => {
                        device_id = arbitration.get_device_id();
                        debug!(device_id, "stream channel arbitration");
                    }
                    Some(StreamMessageRequest_oneof_update::packet(packet)) => {
                        // Accepted as soon as an arbitration named a device.
                        // Without a pipeline for that device the frame is
                        // dropped, unlike the unary RPCs, which fail: a
                        // stream must survive transient ordering.
                        match devices.get(device_id) {
                            Some(device) => device.packet_out_send(packet),
                            None => {
                                debug!(device_id, "dropping packet-out for unconfigured device")
                            }
                        }
                    }
                    None => {
                        error!("malformed stream message from client");
                        roster.remove(&writer);
                        writer.abort(RpcStatus::with_message(
                            RpcStatusCode::INVALID_ARGUMENT,
                            "malformed stream message".to_string(),
                        ));
                        return;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    debug!("stream channel read half closed: {:?}", e);
                    break;
                }
            }
        }
        // Roster removal strictly precedes the finish step: a fan-out
        // snapshot taken from here on no longer sees this writer.
        roster.remove(&writer);
        writer.finish();
        debug!(clients = roster.len(), "stream channel finished");
    };
    ctx.spawn(read_loop);
}
