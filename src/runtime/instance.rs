//! Core 实例
//!
//! 每一步的时序：
//! 1. 清空上一步的 command stream（之前借出的 stream 与 span 随之失效）
//! 2. 按推入顺序交付 Host -> Core 调用，然后清空队列
//! 3. 运行 `app.tick(ctx, max(0, dt))`

use std::mem::ManuallyDrop;

use super::context::CoreContext;
use super::pending::PendingCalls;
use super::{CoreApp, CoreCallSink};
use crate::abi::CoreConfig;
use crate::ids::FuncId;
use crate::wire::{CommandBuffer, CommandStream};

const INITIAL_COMMAND_CAPACITY: usize = 1024;
const INITIAL_PENDING_CAPACITY: usize = 256;

/// 一个 Core 实例：业务 app、输出缓冲、待交付的 to-core 调用
pub struct BridgeCore {
    config: CoreConfig,
    next_request_id: u64,
    commands: CommandBuffer,
    pending: PendingCalls,
    app: Box<dyn CoreApp>,
    steps: u64,
}

impl BridgeCore {
    pub fn new(config: CoreConfig, app: Box<dyn CoreApp>) -> Self {
        tracing::debug!(
            target: "bridge_runtime",
            "creating core (seed {}, mode {:?})",
            config.seed,
            config.mode()
        );
        Self {
            config,
            next_request_id: 1,
            commands: CommandBuffer::with_capacity(INITIAL_COMMAND_CAPACITY),
            pending: PendingCalls::with_capacity(INITIAL_PENDING_CAPACITY),
            app,
            steps: 0,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// 已执行的步数
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// 尚未交付的 to-core 调用数
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// 推进一步
    pub fn tick(&mut self, dt: f32) {
        let Self {
            config,
            next_request_id,
            commands,
            pending,
            app,
            steps,
        } = self;

        commands.clear();
        let mut ctx = CoreContext::new(config, next_request_id, commands);

        for (func_id, payload) in pending.iter() {
            app.on_call_core(&mut ctx, func_id, payload);
        }
        pending.clear();

        let dt = if dt > 0.0 { dt } else { 0.0 };
        app.tick(&mut ctx, dt);
        *steps += 1;
    }

    /// 当前（最近一步产生的）command stream
    ///
    /// 借用持续到下一次修改本实例为止，其中的 span 在此期间有效。
    pub fn command_stream(&self) -> CommandStream<'_> {
        CommandStream::trusted(self.commands.as_bytes())
    }

    pub fn tick_and_get_command_stream(&mut self, dt: f32) -> CommandStream<'_> {
        self.tick(dt);
        self.command_stream()
    }

    /// 排队一条 to-core 调用，在下一步开始时交付
    pub fn push_call_core(&mut self, func_id: FuncId, payload: &[u8]) {
        if !self.pending.push(func_id, payload) {
            tracing::warn!(
                target: "bridge_runtime",
                "call {} dropped: payload of {} bytes is too large",
                func_id,
                payload.len()
            );
        }
    }
}

impl CoreCallSink for BridgeCore {
    fn push_call_core(&mut self, func_id: FuncId, payload: &[u8]) {
        BridgeCore::push_call_core(self, func_id, payload);
    }
}

impl std::fmt::Debug for BridgeCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeCore")
            .field("config", &self.config)
            .field("next_request_id", &self.next_request_id)
            .field("command_bytes", &self.commands.len())
            .field("pending_calls", &self.pending.len())
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

/// 批量推进：返回的 `streams[i]` 对应 `cores[i]`
///
/// `scratch` 的分配被复用；跨帧循环时用 [`recycle_streams`] 把上一帧的结果
/// 还原成 scratch：
///
/// ```
/// # use native_bridge::abi::CoreConfig;
/// # use native_bridge::runtime::{recycle_streams, tick_many, BridgeCore, NullApp};
/// let mut cores = vec![BridgeCore::new(CoreConfig::default(), Box::new(NullApp))];
/// let mut scratch = Vec::new();
/// for _ in 0..3 {
///     let streams = tick_many(&mut cores, 1.0 / 60.0, scratch);
///     assert_eq!(streams.len(), 1);
///     scratch = recycle_streams(streams);
/// }
/// ```
pub fn tick_many<'a>(
    cores: &'a mut [BridgeCore],
    dt: f32,
    mut scratch: Vec<CommandStream<'a>>,
) -> Vec<CommandStream<'a>> {
    scratch.clear();
    scratch.reserve(cores.len());
    scratch.extend(
        cores
            .iter_mut()
            .map(|core| core.tick_and_get_command_stream(dt)),
    );
    scratch
}

/// 清空并解除与 Core 的借用，保留分配
pub fn recycle_streams(streams: Vec<CommandStream<'_>>) -> Vec<CommandStream<'static>> {
    let mut streams = ManuallyDrop::new(streams);
    streams.clear();
    let ptr = streams.as_mut_ptr().cast::<CommandStream<'static>>();
    let capacity = streams.capacity();
    // SAFETY: 向量已清空，不含任何借用；两个元素类型只差生命周期，大小、对齐
    // 与分配器都相同，原分配的所有权转交给新向量
    unsafe { Vec::from_raw_parts(ptr, 0, capacity) }
}
