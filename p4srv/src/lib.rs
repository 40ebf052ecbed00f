/*!
gRPC server for the P4Runtime and gNMI services.

[`P4Server`] assembles the two services over one gRPC environment and
exposes the process surface: [`run_addr`](P4Server::run_addr) /
[`run`](P4Server::run) to start, [`wait`](P4Server::wait) to block,
[`shutdown`](P4Server::shutdown) and
[`force_shutdown`](P4Server::force_shutdown) to stop.

Unary RPCs resolve the target device through the [`Devices`] registry and
forward to its [`device_mgr::DeviceMgr`].  The bidirectional `StreamChannel`
RPC is driven by the [`stream`] module: each connection gets a reader and a
writer state machine, the writer joins the client roster, and packet-in
events fan out from device callbacks to every connected client.

The environment runs a single completion-queue thread, so all per-stream
state transitions are serialized on one worker.
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

use anyhow::{anyhow, Context, Result};
use device_mgr::{ConfigMgr, DeviceMgr};
use grpcio::{ChannelBuilder, Environment, ServerBuilder};
use proto::gnmi_grpc::create_g_nmi;
use proto::p4runtime_grpc::create_p4_runtime;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::{info, warn};

pub mod generator;
mod service;
mod stream;

pub use generator::PacketInGenerator;
pub use service::{GnmiService, P4RuntimeService};
pub use stream::ClientRoster;

/// Address served when none is given.
pub const DEFAULT_ADDR: &str = "0.0.0.0:50051";

const MAX_RECEIVE_MESSAGE_LEN: i32 = 256 * 1024 * 1024;

/// Registry of managed devices, keyed by device id.
///
/// An entry is created lazily by the first `SetForwardingPipelineConfig`
/// naming its device and lives until process teardown.
#[derive(Default)]
pub struct Devices {
    devices: Mutex<HashMap<u64, Arc<DeviceMgr>>>,
}

impl Devices {
    /// An empty registry.
    pub fn new() -> Devices {
        Devices::default()
    }

    /// The device with the given id, if one has been created.
    pub fn get(&self, device_id: u64) -> Option<Arc<DeviceMgr>> {
        self.devices.lock().unwrap().get(&device_id).cloned()
    }

    /// The device with the given id, creating it on first use.
    pub fn get_or_create(&self, device_id: u64) -> Arc<DeviceMgr> {
        self.devices
            .lock()
            .unwrap()
            .entry(device_id)
            .or_insert_with(|| Arc::new(DeviceMgr::new(device_id)))
            .clone()
    }
}

#[derive(Default)]
struct ShutdownFlag {
    stopped: Mutex<bool>,
    cv: Condvar,
}

/// A running P4Runtime + gNMI server.
pub struct P4Server {
    server: Mutex<Option<grpcio::Server>>,
    _env: Arc<Environment>,
    devices: Arc<Devices>,
    roster: Arc<ClientRoster>,
    bound: Vec<(String, u16)>,
    stop: ShutdownFlag,
}

impl P4Server {
    /// Builds and starts a server listening on `addr` (`host:port`) with
    /// insecure credentials.
    pub fn run_addr(addr: &str) -> Result<P4Server> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("{addr}: expected HOST:PORT"))?;
        let port: u16 = port.parse().with_context(|| format!("{addr}: bad port"))?;

        // A single completion-queue thread serializes every per-stream
        // future on one worker.
        let env = Arc::new(Environment::new(1));
        let devices = Arc::new(Devices::new());
        let roster = Arc::new(ClientRoster::new());
        let config = Arc::new(ConfigMgr::new());

        let p4_service = create_p4_runtime(P4RuntimeService::new(devices.clone(), roster.clone()));
        let gnmi_service = create_g_nmi(GnmiService::new(config));
        let ch_builder =
            ChannelBuilder::new(env.clone()).max_receive_message_len(MAX_RECEIVE_MESSAGE_LEN);
        let mut server = ServerBuilder::new(env.clone())
            .register_service(p4_service)
            .register_service(gnmi_service)
            .bind(host, port)
            .channel_args(ch_builder.build_args())
            .build()
            .context("failed to build gRPC server")?;
        server.start();

        let bound: Vec<(String, u16)> = server
            .bind_addrs()
            .map(|(host, port)| (host.clone(), port))
            .collect();
        for (host, port) in &bound {
            info!("Listening on {}:{}", host, port);
        }

        Ok(P4Server {
            server: Mutex::new(Some(server)),
            _env: env,
            devices,
            roster,
            bound,
            stop: ShutdownFlag::default(),
        })
    }

    /// As [`run_addr`](Self::run_addr), on [`DEFAULT_ADDR`].
    pub fn run() -> Result<P4Server> {
        Self::run_addr(DEFAULT_ADDR)
    }

    /// The addresses the server actually bound, with resolved ports.
    pub fn bind_addrs(&self) -> &[(String, u16)] {
        &self.bound
    }

    /// The device registry this server serves.
    pub fn devices(&self) -> &Arc<Devices> {
        &self.devices
    }

    /// The roster of connected StreamChannel clients.
    pub fn roster(&self) -> &Arc<ClientRoster> {
        &self.roster
    }

    /// Blocks the calling thread until [`shutdown`](Self::shutdown) or
    /// [`force_shutdown`](Self::force_shutdown) completes.
    pub fn wait(&self) {
        let mut stopped = self.stop.stopped.lock().unwrap();
        while !*stopped {
            stopped = self.stop.cv.wait(stopped).unwrap();
        }
    }

    fn notify_stopped(&self) {
        let mut stopped = self.stop.stopped.lock().unwrap();
        *stopped = true;
        self.stop.cv.notify_all();
    }

    /// Gracefully drains in-flight calls and stops the transport.
    pub fn shutdown(&self) {
        if let Some(mut server) = self.server.lock().unwrap().take() {
            if let Err(e) = futures::executor::block_on(server.shutdown()) {
                warn!("gRPC shutdown failed: {:?}", e);
            }
        }
        self.notify_stopped();
    }

    /// As [`shutdown`](Self::shutdown), but gives the drain at most
    /// `deadline` before abandoning it; the transport is then torn down
    /// regardless of remaining calls.
    pub fn force_shutdown(&self, deadline: Duration) {
        if let Some(mut server) = self.server.lock().unwrap().take() {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                if let Err(e) = futures::executor::block_on(server.shutdown()) {
                    warn!("gRPC shutdown failed: {:?}", e);
                }
                drop(server);
                let _ = tx.send(());
            });
            if rx.recv_timeout(deadline).is_err() {
                warn!("shutdown did not drain within {:?}; abandoning", deadline);
            }
        }
        self.notify_stopped();
    }
}
