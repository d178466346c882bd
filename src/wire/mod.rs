//! Command stream 线格式
//!
//! - `frame` - 帧头与常量
//! - `encode` - Core 侧的输出缓冲
//! - `stream` - Host 侧的 stream 视图与借用 span
//! - `decode` - 检查版 / 不检查版解码

pub mod decode;
pub mod encode;
pub mod frame;
pub mod stream;

// payload 结构体按本机字节序直接重解释，线格式规定为小端
#[cfg(not(target_endian = "little"))]
compile_error!("the command stream wire format requires a little-endian target");

pub use decode::{
    decode_checked, decode_unchecked, read_args, CallFrame, DecodeStats, Frame, FrameIter,
    RawCallFrame,
};
pub use encode::CommandBuffer;
pub use frame::{
    align8, CallHostHeader, CommandHeader, CommandType, CALL_HOST_SIZE, HEADER_SIZE,
    MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
};
pub use stream::{CommandStream, ExternalSpan};

pub use crate::core::error::{WireError, WireResult};
