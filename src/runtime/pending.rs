//! Host -> Core 调用队列
//!
//! Host 在两次 tick 之间推入的调用按顺序追加到一段连续字节中：
//!
//! ```text
//! { func_id: u32, payload_size: u32 } payload[payload_size] zero[align8(payload_size) - payload_size]
//! ```
//!
//! 下一次 tick 开始时依次交付并清空。

use bytemuck::{Pod, Zeroable};

use super::CoreCallSink;
use crate::ids::FuncId;
use crate::wire::align8;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
struct PendingHeader {
    func_id: u32,
    payload_size: u32,
}

const PENDING_HEADER_SIZE: usize = std::mem::size_of::<PendingHeader>();

/// 待交付的 to-core 调用
#[derive(Debug, Default, Clone)]
pub struct PendingCalls {
    bytes: Vec<u8>,
    count: usize,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            count: 0,
        }
    }

    /// 追加一条调用；payload 被拷贝
    ///
    /// 超过 `u32::MAX` 字节的 payload 被丢弃并返回 `false`。
    pub fn push(&mut self, func_id: FuncId, payload: &[u8]) -> bool {
        let Ok(payload_size) = u32::try_from(payload.len()) else {
            return false;
        };
        let header = PendingHeader {
            func_id: func_id.raw(),
            payload_size,
        };

        let start = self.bytes.len();
        let total = PENDING_HEADER_SIZE + align8(payload.len());
        self.bytes.reserve(total);
        self.bytes.extend_from_slice(bytemuck::bytes_of(&header));
        self.bytes.extend_from_slice(payload);
        self.bytes.resize(start + total, 0);
        self.count += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.count = 0;
    }

    pub fn iter(&self) -> PendingIter<'_> {
        PendingIter { rest: &self.bytes }
    }

    /// 按顺序转交给 `sink` 后清空
    ///
    /// Host 在分发某个 Core 的 stream 期间不能修改该 Core，回复先缓存在这里，
    /// 分发结束后再转交。
    pub fn drain_into<S: CoreCallSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let count = self.count;
        for (func_id, payload) in self.iter() {
            sink.push_call_core(func_id, payload);
        }
        self.clear();
        count
    }

    #[cfg(test)]
    pub(crate) fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

/// 按推入顺序遍历；遇到截断的条目即停止
#[derive(Debug, Clone)]
pub struct PendingIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for PendingIter<'a> {
    type Item = (FuncId, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let header_bytes = self.rest.get(..PENDING_HEADER_SIZE)?;
        let header: PendingHeader = bytemuck::pod_read_unaligned(header_bytes);
        let after_header = &self.rest[PENDING_HEADER_SIZE..];

        let len = header.payload_size as usize;
        let padded = align8(len);
        if len > after_header.len() || padded > after_header.len() {
            self.rest = &[];
            return None;
        }

        let payload = &after_header[..len];
        self.rest = &after_header[padded..];
        Some((FuncId(header.func_id), payload))
    }
}
