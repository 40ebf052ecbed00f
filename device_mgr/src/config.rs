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

use crate::{error_status, ok_status, Status};
use proto::code::Code;
use proto::gnmi::{
    GetRequest, GetResponse, Notification, Path, SetRequest, SetResponse, TypedValue, Update,
    UpdateResult, UpdateResult_Operation,
};
use protobuf::RepeatedField;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// The configuration tree behind the gNMI `Get` and `Set` RPCs: a flat,
/// mutex-guarded map from canonical path to value.  One instance serves the
/// whole process.
#[derive(Default)]
pub struct ConfigMgr {
    nodes: Mutex<BTreeMap<String, TypedValue>>,
}

/// One string for a (prefix, path) pair: the origin, then `/`-separated
/// element names, each followed by its sorted `[key=value]` attributes.
fn canonical_path(prefix: &Path, path: &Path) -> String {
    let origin = if path.get_origin().is_empty() {
        prefix.get_origin()
    } else {
        path.get_origin()
    };
    let mut s = String::new();
    if !origin.is_empty() {
        s.push_str(origin);
        s.push(':');
    }
    for elem in prefix.get_elem().iter().chain(path.get_elem()) {
        s.push('/');
        s.push_str(elem.get_name());
        let mut keys: Vec<(&String, &String)> = elem.get_key().iter().collect();
        keys.sort();
        for (k, v) in keys {
            s.push('[');
            s.push_str(k);
            s.push('=');
            s.push_str(v);
            s.push(']');
        }
    }
    s
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

fn update_result(path: &Path, op: UpdateResult_Operation) -> UpdateResult {
    let mut result = UpdateResult::new();
    result.set_path(path.clone());
    result.set_op(op);
    result
}

impl ConfigMgr {
    /// An empty configuration tree.
    pub fn new() -> ConfigMgr {
        ConfigMgr::default()
    }

    /// Fills `response` with one notification per requested path.  A path
    /// with no configured value fails the whole request with `NOT_FOUND`.
    pub fn get(&self, request: &GetRequest, response: &mut GetResponse) -> Status {
        let nodes = self.nodes.lock().unwrap();
        let prefix = request.get_prefix();
        for path in request.get_path() {
            let canonical = canonical_path(prefix, path);
            match nodes.get(&canonical) {
                Some(val) => {
                    let mut update = Update::new();
                    update.set_path(path.clone());
                    update.set_val(val.clone());
                    let mut notification = Notification::new();
                    notification.set_timestamp(now_ns());
                    notification.set_prefix(prefix.clone());
                    notification.mut_update().push(update);
                    response.mut_notification().push(notification);
                }
                None => {
                    return error_status(
                        Code::NOT_FOUND,
                        format!("no configuration node at {}", canonical),
                    )
                }
            }
        }
        ok_status()
    }

    /// Applies the request's deletes, replaces and updates, in that order,
    /// reporting one result per operation.
    pub fn set(&self, request: &SetRequest, response: &mut SetResponse) -> Status {
        for update in request.get_replace().iter().chain(request.get_update()) {
            if !update.has_val() {
                return error_status(
                    Code::INVALID_ARGUMENT,
                    format!(
                        "no value for {}",
                        canonical_path(request.get_prefix(), update.get_path())
                    ),
                );
            }
        }

        let mut nodes = self.nodes.lock().unwrap();
        let prefix = request.get_prefix();
        let mut results = Vec::new();
        for path in request.get_delete() {
            nodes.remove(&canonical_path(prefix, path));
            results.push(update_result(path, UpdateResult_Operation::DELETE));
        }
        for (updates, op) in [
            (request.get_replace(), UpdateResult_Operation::REPLACE),
            (request.get_update(), UpdateResult_Operation::UPDATE),
        ] {
            for update in updates {
                nodes.insert(
                    canonical_path(prefix, update.get_path()),
                    update.get_val().clone(),
                );
                results.push(update_result(update.get_path(), op));
            }
        }

        response.set_prefix(prefix.clone());
        response.set_response(RepeatedField::from_vec(results));
        response.set_timestamp(now_ns());
        ok_status()
    }
}
