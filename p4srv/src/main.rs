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

//! `p4srv` serves the P4Runtime and gNMI APIs for a set of forwarding
//! devices.  SIGUSR1 and SIGUSR2 start and stop a synthetic packet-in
//! generator for stream load testing; SIGINT and SIGTERM shut the server
//! down.

use anyhow::Result;
use clap::{App, Arg};
use p4srv::{P4Server, PacketInGenerator, DEFAULT_ADDR};
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::Signals;
use std::sync::Arc;
use std::thread;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    grpcio::redirect_log();

    const LISTEN_ADDR: &str = "LISTEN_ADDR";
    let matches = App::new("p4srv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("P4Runtime and gNMI server")
        .arg(
            Arg::with_name(LISTEN_ADDR)
                .help("address and port to listen on")
                .default_value(DEFAULT_ADDR)
                .index(1),
        )
        .get_matches();
    let addr = matches.value_of(LISTEN_ADDR).unwrap();

    let server = Arc::new(P4Server::run_addr(addr)?);

    let mut signals = Signals::new([SIGUSR1, SIGUSR2, SIGINT, SIGTERM])?;
    let signal_server = server.clone();
    thread::spawn(move || {
        let mut generator: Option<PacketInGenerator> = None;
        for signal in signals.forever() {
            match signal {
                SIGUSR1 => {
                    if generator.is_none() {
                        info!("starting packet-in generator");
                        generator =
                            Some(PacketInGenerator::new(signal_server.roster().clone()));
                    }
                }
                SIGUSR2 => {
                    if let Some(mut generator) = generator.take() {
                        info!("stopping packet-in generator");
                        generator.stop();
                    }
                }
                _ => {
                    info!("shutting down");
                    signal_server.shutdown();
                    break;
                }
            }
        }
    });

    server.wait();
    Ok(())
}
