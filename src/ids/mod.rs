//! 函数标识符
//!
//! 每个声明的函数 ID 由 `{方向标记}:{模块}.{函数名}` 的 UTF-8 字节经 FNV-1a-32 计算得到，
//! 同一输入在任何机器、任何一次运行中都得到相同的值。
//!
//! ## 已知扩展上限
//!
//! 32 位空间的生日界：约 77 000 个同方向函数时冲突概率达到 50%，
//! 约 9 300 个时为 1%。冲突在生成期由 [`BuildSession`] 捕获；
//! 若将来需要更大规模，可加宽 ID 或更换哈希（对线格式而言是兼容的改动）。

mod session;

pub use session::{BuildSession, IdRegistry, Registration};

use serde::{Deserialize, Serialize};
use std::fmt;

/// 调用方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Core -> Host（写入 command stream，由 Host 分发）
    ToHost,
    /// Host -> Core（推入待处理队列，下一次 tick 时分发）
    ToCore,
}

impl Direction {
    /// 参与哈希的方向标记
    pub const fn tag(self) -> &'static str {
        match self {
            Direction::ToHost => "H",
            Direction::ToCore => "C",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToHost => f.write_str("to-host"),
            Direction::ToCore => f.write_str("to-core"),
        }
    }
}

/// 32 位函数标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncId(pub u32);

impl FuncId {
    /// 计算 `{tag}:{module}.{name}` 的 ID
    pub fn compute(direction: Direction, module: &str, name: &str) -> Self {
        Self(fnv1a32(hash_input(direction, module, name).as_bytes()))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// 参与哈希的完整字符串，例如 `H:DemoLog.Log`
pub fn hash_input(direction: Direction, module: &str, name: &str) -> String {
    format!("{}:{}", direction.tag(), qualified_name(module, name))
}

/// 限定名 `module.name`
pub fn qualified_name(module: &str, name: &str) -> String {
    format!("{module}.{name}")
}

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a 32 位哈希
pub const fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}
