//! 帧格式
//!
//! ```text
//! CommandHeader  { type: u16, size: u16, reserved: u32 }                 8 字节
//! CallHostFrame  { header, func_id: u32, payload_size: u32, payload... } 16 字节 + payload
//! ```
//!
//! 所有整数为小端序。`size` 是整帧长度（含头部），解码器处理完每一帧后
//! 总是前进 `size` 字节，这也是跳过未知帧的方式。

use bytemuck::{Pod, Zeroable};

use crate::abi_enum;

abi_enum! {
    /// 帧类型
    pub struct CommandType {
        NONE = 0,
        CALL_HOST = 1,
    }
}

/// 帧头
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CommandHeader {
    pub kind: u16,
    /// 整帧长度（含头部）
    pub size: u16,
    pub reserved: u32,
}

/// `CallHost` 帧的固定部分，payload 紧随其后
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CallHostHeader {
    pub header: CommandHeader,
    pub func_id: u32,
    pub payload_size: u32,
}

pub const HEADER_SIZE: usize = std::mem::size_of::<CommandHeader>();
pub const CALL_HOST_SIZE: usize = std::mem::size_of::<CallHostHeader>();

/// 帧对齐
pub const FRAME_ALIGN: usize = 8;

/// 单帧上限，受 `CommandHeader.size` 位宽限制
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// 单个 payload 的上限（同时留出固定部分与补齐）
pub const MAX_PAYLOAD_SIZE: usize = (MAX_FRAME_SIZE & !(FRAME_ALIGN - 1)) - CALL_HOST_SIZE;

const _: () = assert!(HEADER_SIZE == 8);
const _: () = assert!(CALL_HOST_SIZE == 16);

/// 向上对齐到 8
#[inline]
pub const fn align8(n: usize) -> usize {
    (n + (FRAME_ALIGN - 1)) & !(FRAME_ALIGN - 1)
}

impl CommandHeader {
    /// 从任意对齐的字节读取帧头；不足 8 字节时返回 `None`
    #[inline]
    pub fn read(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..HEADER_SIZE)
            .map(bytemuck::pod_read_unaligned::<CommandHeader>)
    }

    #[inline]
    pub fn command_type(&self) -> CommandType {
        CommandType::from_raw(u32::from(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align8() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(16), 16);
        assert_eq!(align8(17), 24);
    }

    #[test]
    fn test_max_payload_fits_in_frame() {
        assert!(CALL_HOST_SIZE + align8(MAX_PAYLOAD_SIZE) <= MAX_FRAME_SIZE);
        assert!(CALL_HOST_SIZE + align8(MAX_PAYLOAD_SIZE + 1) > MAX_FRAME_SIZE);
    }

    #[test]
    fn test_header_little_endian_layout() {
        let bytes = [1u8, 0, 24, 0, 0, 0, 0, 0, 0xFF];
        let header = CommandHeader::read(&bytes).unwrap();
        assert_eq!(header.command_type(), CommandType::CALL_HOST);
        assert_eq!(header.size, 24);
        assert!(CommandHeader::read(&bytes[..7]).is_none());
    }
}
