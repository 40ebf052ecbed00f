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

//! Synthetic packet-in source for load testing the stream path.  The
//! binary starts one on SIGUSR1 and stops it on SIGUSR2.

use crate::stream::ClientRoster;
use proto::p4runtime::PacketIn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A thread fanning 1000-byte packet-in frames out to every connected
/// stream client in a tight loop, until stopped or dropped.
pub struct PacketInGenerator {
    stop: Arc<AtomicBool>,
    sender: Option<JoinHandle<()>>,
}

impl PacketInGenerator {
    /// Starts the generator thread against the given roster.
    pub fn new(roster: Arc<ClientRoster>) -> PacketInGenerator {
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = stop.clone();
        let sender = thread::spawn(move || {
            let mut packet = PacketIn::new();
            packet.set_payload(vec![b'1'; 1000]);
            while !stopped.load(Ordering::Relaxed) {
                roster.notify_clients(0, &packet);
            }
        });
        PacketInGenerator { stop, sender: Some(sender) }
    }

    /// Stops and joins the generator thread.
    pub fn stop(&mut self) {
        if !self.stop.swap(true, Ordering::Relaxed) {
            if let Some(sender) = self.sender.take() {
                let _ = sender.join();
            }
        }
    }
}

impl Drop for PacketInGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}
