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

use crate::cell::{byte_width, CellBuffer, INLINE_CAPACITY};
use crate::info::{ActionInfo, ParamInfo, PipelineInfo};
use crate::{EncodeError, KeyInt};

/// The runtime arguments for one action, laid out like a [`MatchKey`]
/// buffer with a single cell per parameter.
///
/// [`MatchKey`]: crate::MatchKey
pub struct ActionData<'a> {
    action: &'a ActionInfo,
    action_id: u32,
    buf: CellBuffer,
    nset: usize,
}

impl<'a> ActionData<'a> {
    /// Sizes an argument buffer for the given action.
    pub fn new(info: &'a PipelineInfo, action_id: u32) -> Result<ActionData<'a>, EncodeError> {
        let action = info.action(action_id).ok_or(EncodeError::UnknownAction(action_id))?;
        let spill: usize = action
            .params()
            .iter()
            .filter(|p| byte_width(p.bitwidth) > INLINE_CAPACITY)
            .map(|p| byte_width(p.bitwidth))
            .sum();
        Ok(ActionData {
            action,
            action_id,
            buf: CellBuffer::new(action.num_params(), spill),
            nset: 0,
        })
    }

    /// The action these arguments were built for.
    pub fn action_id(&self) -> u32 {
        self.action_id
    }

    /// Number of successful `set_arg*` calls since construction or reset.
    pub fn args_set(&self) -> usize {
        self.nset
    }

    /// Restores the buffer to its freshly-constructed state.
    pub fn reset(&mut self) {
        self.buf.reset();
        self.nset = 0;
    }

    fn param(&self, param_id: u32) -> Result<&ParamInfo, EncodeError> {
        self.action.param(param_id).ok_or(EncodeError::UnknownParam {
            action_id: self.action_id,
            param_id,
        })
    }

    /// Sets an argument from an unsigned integer.
    pub fn set_arg<T: KeyInt>(&mut self, param_id: u32, arg: T) -> Result<(), EncodeError> {
        let p = *self.param(param_id)?;
        self.buf.set_int(p.index, p.id, p.bitwidth, p.byte0_mask, arg)?;
        self.nset += 1;
        Ok(())
    }

    /// Sets an argument from a byte string of the parameter's exact byte
    /// width.
    pub fn set_arg_bytes(&mut self, param_id: u32, arg: &[u8]) -> Result<(), EncodeError> {
        let p = *self.param(param_id)?;
        self.buf.set_bytes(p.index, p.id, p.bitwidth, p.byte0_mask, arg)?;
        self.nset += 1;
        Ok(())
    }

    /// The contiguous argument buffer: one cell per parameter followed by
    /// the spill region.
    pub fn bytes(&self) -> &[u8] {
        self.buf.bytes()
    }

    /// The formatted value of one parameter.
    pub fn arg_bytes(&self, param_id: u32) -> Result<&[u8], EncodeError> {
        let p = self.param(param_id)?;
        Ok(self.buf.value(p.index, p.bitwidth))
    }
}
