//! # Native Bridge
//!
//! 在一个原生模拟 Core 与嵌入它的 Host 之间传递类型化函数调用。
//!
//! ## Features
//!
//! - **IDL**: 每行一个声明，`to-host(Name, Type arg, ...)` / `to-core(...)`
//! - **Function IDs**: `FNV-1a-32("{H|C}:{Module}.{Name}")`，整次生成内检测冲突
//! - **Code Generation**: 两侧共用的 `#[repr(C)]` payload、调用 stub、handler trait 与分发函数
//! - **Command Stream**: Core 每一步输出一段连续的帧，Host 以检查版或不检查版解码
//! - **Core Runtime**: 实例、to-core 调用队列、批量推进与 C ABI
//!
//! ## Architecture Design
//!
//! - 构建期：`idl` → `ids` + `types` → `codegen`，全部成功后才写盘
//! - 运行期：`runtime::BridgeCore` 产生 `wire::CommandStream`，生成的 `dispatch`
//!   把每一帧变成 handler 方法调用
//!
//! ### Example
//!
//! ```
//! use native_bridge::codegen::{GenerateOptions, Generator, IdlSource, Side};
//!
//! let generator = Generator::new(GenerateOptions::default());
//! let plan = generator
//!     .plan(&[IdlSource::new("demo.def", "to-host(Log, LogLevel level, StringSpan message)")])
//!     .unwrap();
//! let ids = plan.file(Side::Host, "demo.ids.g.rs").unwrap();
//! assert!(ids.contents.contains("FuncId(0x57846C8C)"));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: 错误类型与共享宏
//! - [`config`]: 生成器配置
//! - [`idl`]: IDL 解析
//! - [`ids`]: 函数 ID 与生成会话
//! - [`types`]: 类型映射与 payload 布局
//! - [`codegen`]: 代码生成与写盘
//! - [`abi`]: 跨边界值类型
//! - [`wire`]: Command stream 线格式
//! - [`runtime`]: Core 运行时与 C ABI

/// Error types and shared macros
pub mod core;
/// Generator configuration
pub mod config;
/// IDL parsing
pub mod idl;
/// Function identifiers and the build session
pub mod ids;
/// Type mapping table and payload layout
pub mod types;
/// Code generation
pub mod codegen;
/// Blittable cross-boundary value types
pub mod abi;
/// Command stream wire format
pub mod wire;
/// Core runtime and C ABI
pub mod runtime;

#[doc(hidden)]
pub use bytemuck;

pub use crate::core::error::{GenError, GenResult, WireError, WireResult};
