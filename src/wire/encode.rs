//! Command stream 编码
//!
//! 每个 Core 实例持有一个 [`CommandBuffer`]：每一步开始时清空，
//! 本步内的所有 to-host 调用依次追加为帧。

use super::frame::{align8, CallHostHeader, CommandHeader, CommandType, CALL_HOST_SIZE, MAX_FRAME_SIZE};
use crate::abi::StringView;
use crate::core::error::{WireError, WireResult};
use crate::ids::FuncId;

/// 单实例的输出缓冲
#[derive(Debug, Default)]
pub struct CommandBuffer {
    bytes: Vec<u8>,
    /// 本步内通过 `store_utf8` 拷贝的字符串；`Box<[u8]>` 的堆地址在 push 后不再移动
    strings: Vec<Box<[u8]>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            strings: Vec::new(),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.bytes.reserve(additional);
    }

    /// 清空帧与字符串存储，之前返回的所有 [`StringView`] 随之失效
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.strings.clear();
    }

    /// 拷贝一段 UTF-8 文本，返回在下一次 [`clear`](Self::clear) 前有效的视图
    ///
    /// 超过 `u32::MAX` 字节的文本被截断到该长度。
    pub fn store_utf8(&mut self, text: &str) -> StringView {
        if text.is_empty() {
            return StringView::EMPTY;
        }
        let owned: Box<[u8]> = text.as_bytes().into();
        let view = StringView {
            ptr: owned.as_ptr() as usize as u64,
            len: u32::try_from(owned.len()).unwrap_or(u32::MAX),
            reserved0: 0,
        };
        self.strings.push(owned);
        view
    }

    /// 追加一个 `CallHost` 帧
    ///
    /// 帧长 = `align8(16 + payload.len())`，尾部以 0 补齐。
    /// 帧长超出 `u16::MAX` 时返回错误且不写入任何字节。
    pub fn call_host(&mut self, func_id: FuncId, payload: &[u8]) -> WireResult<()> {
        let size = align8(CALL_HOST_SIZE + payload.len());
        if size > MAX_FRAME_SIZE {
            return Err(WireError::FrameTooLarge { size });
        }

        let fixed = CallHostHeader {
            header: CommandHeader {
                kind: CommandType::CALL_HOST.raw() as u16,
                size: size as u16,
                reserved: 0,
            },
            func_id: func_id.raw(),
            payload_size: payload.len() as u32,
        };

        let start = self.bytes.len();
        self.bytes.reserve(size);
        self.bytes.extend_from_slice(bytemuck::bytes_of(&fixed));
        self.bytes.extend_from_slice(payload);
        self.bytes.resize(start + size, 0);
        Ok(())
    }

    /// 直接追加原始帧字节（测试与转发场景）
    pub fn extend_raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::frame::MAX_PAYLOAD_SIZE;

    #[test]
    fn test_call_host_layout() {
        let mut buffer = CommandBuffer::new();
        buffer.call_host(FuncId(0xDA3184A2), &[1, 2, 3]).unwrap();

        let bytes = buffer.as_bytes();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..2], &1u16.to_le_bytes());
        assert_eq!(&bytes[2..4], &24u16.to_le_bytes());
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &0xDA3184A2u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(&bytes[16..19], &[1, 2, 3]);
        assert!(bytes[19..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_frames_are_back_to_back() {
        let mut buffer = CommandBuffer::new();
        buffer.call_host(FuncId(1), &[]).unwrap();
        buffer.call_host(FuncId(2), &[0; 8]).unwrap();
        assert_eq!(buffer.len(), 16 + 24);
        assert_eq!(buffer.len() % 8, 0);
    }

    #[test]
    fn test_oversized_frame_writes_nothing() {
        let mut buffer = CommandBuffer::new();
        buffer.call_host(FuncId(1), &[7; 8]).unwrap();
        let before = buffer.len();

        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        let err = buffer.call_host(FuncId(2), &payload).unwrap_err();
        assert!(matches!(err, WireError::FrameTooLarge { .. }));
        assert_eq!(buffer.len(), before);

        let payload = vec![0u8; MAX_PAYLOAD_SIZE];
        buffer.call_host(FuncId(3), &payload).unwrap();
    }

    #[test]
    fn test_store_utf8_survives_until_clear() {
        let mut buffer = CommandBuffer::new();
        let a = buffer.store_utf8("Main/Prefabs/Bot");
        let b = buffer.store_utf8("second");
        assert_eq!(a.len, 16);
        assert_ne!(a.ptr, b.ptr);
        // SAFETY: 视图在 clear 前有效
        let text = unsafe { std::slice::from_raw_parts(a.ptr as usize as *const u8, a.len as usize) };
        assert_eq!(text, b"Main/Prefabs/Bot");

        assert!(buffer.store_utf8("").is_empty());
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
