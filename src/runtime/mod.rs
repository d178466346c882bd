//! Core 侧运行时
//!
//! - `context` - 业务层使用的 [`CoreContext`]
//! - `instance` - [`BridgeCore`] 实例与批量推进
//! - `pending` - Host -> Core 调用队列
//! - `ffi` - 对外 C ABI
//!
//! 业务层实现 [`CoreApp`]；生成的 `host_calls` 函数通过 [`CoreContext`] 写出
//! to-host 调用，生成的 `core_calls` 扩展 trait 通过 [`CoreCallSink`] 排队
//! to-core 调用。

pub mod context;
pub mod ffi;
pub mod instance;
pub mod pending;

pub use context::CoreContext;
pub use instance::{recycle_streams, tick_many, BridgeCore};
pub use pending::{PendingCalls, PendingIter};

use crate::ids::FuncId;

/// 可插拔的业务层
///
/// Runtime 负责命令流缓冲、调用交付与时序；app 决定每一步输出哪些 Host 调用。
pub trait CoreApp: Send {
    /// 每一步调用一次，`dt` 不小于 0
    fn tick(&mut self, ctx: &mut CoreContext<'_>, dt: f32);

    /// 每条 Host -> Core 调用在下一步开始时按顺序交付
    ///
    /// 通常转发给生成的 `dispatch_core_call`。
    fn on_call_core(&mut self, ctx: &mut CoreContext<'_>, func_id: FuncId, payload: &[u8]) {
        let _ = (ctx, func_id, payload);
    }
}

/// 什么也不做的 app
#[derive(Debug, Default, Clone, Copy)]
pub struct NullApp;

impl CoreApp for NullApp {
    fn tick(&mut self, _ctx: &mut CoreContext<'_>, _dt: f32) {}
}

/// to-core 调用的接收端
///
/// 生成的 `{Module}CoreCalls` trait 对所有实现者全覆盖实现。
pub trait CoreCallSink {
    fn push_call_core(&mut self, func_id: FuncId, payload: &[u8]);
}

impl CoreCallSink for PendingCalls {
    fn push_call_core(&mut self, func_id: FuncId, payload: &[u8]) {
        self.push(func_id, payload);
    }
}

impl<S: CoreCallSink + ?Sized> CoreCallSink for &mut S {
    fn push_call_core(&mut self, func_id: FuncId, payload: &[u8]) {
        (**self).push_call_core(func_id, payload);
    }
}
