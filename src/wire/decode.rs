//! Command stream 解码
//!
//! 两个变体：
//!
//! - [`decode_checked`]：来源或完整性未知时必须使用。帧长越界即停止，
//!   未知帧类型、未知函数 ID、payload 过短的帧被跳过，从不报错。
//! - [`decode_unchecked`]：调用方已在带外确认 stream 完整（例如刚由同一个
//!   Core 实例产出）时的热路径，省去越界与 payload 长度检查。

use std::marker::PhantomData;
use std::ops::AddAssign;

use bytemuck::Pod;

use super::frame::{CommandHeader, CommandType, CALL_HOST_SIZE, HEADER_SIZE};
use super::stream::{CommandStream, ExternalSpan};
use crate::abi::StringView;
use crate::ids::FuncId;

/// 一帧（含头部的完整字节）
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub header: CommandHeader,
    pub bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn command_type(&self) -> CommandType {
        self.header.command_type()
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// 解释为 `CallHost` 帧；类型不符或长度不足固定部分时返回 `None`
    pub fn as_call(&self, trusted: bool) -> Option<CallFrame<'a>> {
        if self.command_type() != CommandType::CALL_HOST || self.bytes.len() < CALL_HOST_SIZE {
            return None;
        }
        let func_id = bytemuck::pod_read_unaligned::<u32>(&self.bytes[8..12]);
        Some(CallFrame {
            func_id: FuncId(func_id),
            payload: &self.bytes[CALL_HOST_SIZE..],
            trusted,
        })
    }
}

/// 按帧遍历（检查版规则）
///
/// 剩余字节不足一个帧头、或帧头的 `size` 小于帧头/大于剩余字节时停止。
#[derive(Debug, Clone)]
pub struct FrameIter<'a> {
    bytes: &'a [u8],
    cursor: usize,
    truncated: bool,
}

impl<'a> FrameIter<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cursor: 0,
            truncated: false,
        }
    }

    /// 已消费的字节数（所有已产出帧的 `size` 之和）
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// 是否因损坏或截断的尾部而停止
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Frame<'a>> {
        let rest = &self.bytes[self.cursor..];
        let Some(header) = CommandHeader::read(rest) else {
            self.truncated = !rest.is_empty();
            return None;
        };

        let size = usize::from(header.size);
        if size < HEADER_SIZE || size > rest.len() {
            self.truncated = true;
            return None;
        }

        self.cursor += size;
        Some(Frame {
            header,
            bytes: &rest[..size],
        })
    }
}

/// 检查版解码时看到的一个 `CallHost` 帧
#[derive(Debug, Clone, Copy)]
pub struct CallFrame<'a> {
    func_id: FuncId,
    /// `size - 16` 字节，包含尾部补齐
    payload: &'a [u8],
    trusted: bool,
}

impl<'a> CallFrame<'a> {
    pub fn func_id(&self) -> FuncId {
        self.func_id
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// 读取 payload 结构体；payload 比 `T` 短时返回 `None`
    #[inline]
    pub fn args<T: Pod>(&self) -> Option<T> {
        read_args(self.payload)
    }

    /// 把 payload 中的视图包装为借用 span
    #[inline]
    pub fn span(&self, view: StringView) -> ExternalSpan<'a> {
        ExternalSpan::new(view, self.trusted)
    }
}

/// 读取 payload 开头的 `T`（不要求对齐）
#[inline]
pub fn read_args<T: Pod>(payload: &[u8]) -> Option<T> {
    payload
        .get(..std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned::<T>)
}

/// 一次解码的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// 访问过的帧数
    pub frames: usize,
    /// 调用了 handler 的帧数
    pub dispatched: usize,
    /// 被跳过的帧数（未知类型、未知 ID、payload 过短）
    pub skipped: usize,
    /// 已消费字节数，等于所有访问过的帧的 `size` 之和
    pub bytes_consumed: usize,
    /// 是否在损坏或截断的尾部停止
    pub truncated: bool,
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, other: DecodeStats) {
        self.frames += other.frames;
        self.dispatched += other.dispatched;
        self.skipped += other.skipped;
        self.bytes_consumed += other.bytes_consumed;
        self.truncated |= other.truncated;
    }
}

/// 检查版解码
///
/// 对每个 `CallHost` 帧调用 `on_call`，其返回值表示该帧是否被处理
/// （函数 ID 已知且 payload 足够长）。
pub fn decode_checked<'a, F>(stream: CommandStream<'a>, mut on_call: F) -> DecodeStats
where
    F: FnMut(CallFrame<'a>) -> bool,
{
    let trusted = stream.is_trusted();
    let mut frames = FrameIter::new(stream.as_bytes());
    let mut stats = DecodeStats::default();

    for frame in frames.by_ref() {
        stats.frames += 1;
        let handled = match frame.as_call(trusted) {
            Some(call) => on_call(call),
            None => false,
        };
        if handled {
            stats.dispatched += 1;
        } else {
            stats.skipped += 1;
        }
    }

    stats.bytes_consumed = frames.consumed();
    stats.truncated = frames.is_truncated();
    if stats.truncated {
        tracing::trace!(
            target: "bridge_runtime",
            "command stream stopped at offset {} of {} (truncated tail)",
            stats.bytes_consumed,
            stream.len()
        );
    }
    stats
}

/// 不检查版解码看到的一个 `CallHost` 帧
#[derive(Debug, Clone, Copy)]
pub struct RawCallFrame<'a> {
    func_id: FuncId,
    payload: *const u8,
    payload_len: usize,
    trusted: bool,
    _borrow: PhantomData<&'a [u8]>,
}

impl<'a> RawCallFrame<'a> {
    pub fn func_id(&self) -> FuncId {
        self.func_id
    }

    /// `size - 16`，未经验证
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// 直接按 `T` 读取 payload
    ///
    /// # Safety
    ///
    /// payload 至少有 `size_of::<T>()` 个可读字节，即该帧由对应函数 ID 的
    /// 编码 stub 写出。
    #[inline]
    pub unsafe fn args_unchecked<T: Pod>(&self) -> T {
        // SAFETY: 由调用方保证
        unsafe { std::ptr::read_unaligned(self.payload.cast::<T>()) }
    }

    #[inline]
    pub fn span(&self, view: StringView) -> ExternalSpan<'a> {
        ExternalSpan::new(view, self.trusted)
    }
}

/// 不检查版解码，返回访问过的帧数
///
/// 仍然在 `size < 8` 时停止，否则零长度帧会让游标原地不动。
///
/// # Safety
///
/// 调用方保证 stream 完整：每个帧头的 `size` 都不超过剩余字节，
/// 且每个 `CallHost` 帧的 payload 不短于其函数 ID 对应的结构体。
pub unsafe fn decode_unchecked<'a, F>(stream: CommandStream<'a>, mut on_call: F) -> usize
where
    F: FnMut(RawCallFrame<'a>),
{
    let bytes = stream.as_bytes();
    let base = bytes.as_ptr();
    let end = bytes.len();
    let trusted = stream.is_trusted();
    let call_host = CommandType::CALL_HOST.raw() as u16;

    let mut cursor = 0usize;
    let mut frames = 0usize;
    while cursor + HEADER_SIZE <= end {
        // SAFETY: cursor + 8 <= end
        let header = unsafe { std::ptr::read_unaligned(base.add(cursor).cast::<CommandHeader>()) };
        let size = usize::from(header.size);
        if size < HEADER_SIZE {
            break;
        }

        if header.kind == call_host && size >= CALL_HOST_SIZE {
            // SAFETY: 帧完整由调用方保证
            let func_id = unsafe { std::ptr::read_unaligned(base.add(cursor + 8).cast::<u32>()) };
            on_call(RawCallFrame {
                func_id: FuncId(func_id),
                payload: unsafe { base.add(cursor + CALL_HOST_SIZE) },
                payload_len: size - CALL_HOST_SIZE,
                trusted,
                _borrow: PhantomData,
            });
        }

        cursor += size;
        frames += 1;
    }
    frames
}
