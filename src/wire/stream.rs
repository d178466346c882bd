//! Command stream 视图与借用的外部 span
//!
//! 帧中的 [`StringView`] 指向生产方（Core 实例）持有的内存，只在该实例下一次
//! tick 或销毁之前有效。Host 侧通过 [`ExternalSpan`] 访问这些字节：
//! 生命周期 `'a` 绑定在 stream 上，且只有“可信”的 stream 才允许解引用指针。

use std::fmt;
use std::marker::PhantomData;

use crate::abi::StringView;

/// 一次 tick 产生的 command stream
#[derive(Clone, Copy)]
pub struct CommandStream<'a> {
    bytes: &'a [u8],
    trusted: bool,
}

impl<'a> CommandStream<'a> {
    /// 来源未知的字节；其中的 span 不可解引用
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            trusted: false,
        }
    }

    /// 从 C ABI 返回的指针构造可信 stream
    ///
    /// # Safety
    ///
    /// `ptr` 为空或 `len == 0` 时得到空 stream。否则 `ptr..ptr+len` 必须在 `'a`
    /// 内可读，且其中每个 `StringView` 指向的字节同样在 `'a` 内有效
    /// （即来自同一个 Core 实例、在其下一次 tick 之前）。
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        if ptr.is_null() || len == 0 {
            return Self::trusted(&[]);
        }
        // SAFETY: 由调用方保证
        Self::trusted(unsafe { std::slice::from_raw_parts(ptr, len) })
    }

    /// 由 Core 实例自身产生的 stream
    pub(crate) fn trusted(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            trusted: true,
        }
    }

    /// 把已有字节标记为可信
    ///
    /// # Safety
    ///
    /// 同 [`from_raw_parts`](Self::from_raw_parts)：其中的 span 必须在 `'a` 内有效。
    pub unsafe fn assume_trusted(self) -> Self {
        Self::trusted(self.bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }
}

impl fmt::Debug for CommandStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStream")
            .field("len", &self.bytes.len())
            .field("trusted", &self.trusted)
            .finish()
    }
}

/// 外部持有的字节区间，只在提供它的那一次调用内有效
///
/// 需要保留内容时必须拷贝（`to_owned`/`String::from`）。
#[derive(Clone, Copy)]
pub struct ExternalSpan<'a> {
    view: StringView,
    trusted: bool,
    _borrow: PhantomData<&'a [u8]>,
}

impl<'a> ExternalSpan<'a> {
    pub(crate) fn new(view: StringView, trusted: bool) -> Self {
        Self {
            view,
            trusted,
            _borrow: PhantomData,
        }
    }

    /// 原始视图（指针值 + 长度）
    pub fn view(&self) -> StringView {
        self.view
    }

    pub fn len(&self) -> usize {
        self.view.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// 可信 stream 中的字节；不可信或空指针时返回 `None`
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        if !self.trusted {
            return None;
        }
        if self.view.len == 0 {
            return Some(&[]);
        }
        if self.view.ptr == 0 {
            return None;
        }
        let ptr = usize::try_from(self.view.ptr).ok()? as *const u8;
        // SAFETY: 可信 stream 的构造前提保证 span 在 'a 内可读
        Some(unsafe { std::slice::from_raw_parts(ptr, self.view.len as usize) })
    }

    /// 按 UTF-8 解释；非法编码返回 `None`
    pub fn as_str(&self) -> Option<&'a str> {
        self.as_bytes().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl fmt::Debug for ExternalSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => write!(f, "ExternalSpan({text:?})"),
            None => write!(f, "ExternalSpan(0x{:X}, {})", self.view.ptr, self.view.len),
        }
    }
}
