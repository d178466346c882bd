//! 核心模块
//!
//! 包含生成器与运行时共用的基础设施：
//! - `error` - 错误类型定义
//! - `macros` - 共享宏（ABI 枚举声明）

pub mod error;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    CollisionError, GenError, GenResult, ParseError, ParseErrorKind, ParseResult, TypeMapError,
    TypeResult, WireError, WireResult,
};
