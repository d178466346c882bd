//! 业务层在 tick 与 to-core 回调中使用的上下文

use crate::abi::{CoreConfig, StringView, Transform};
use crate::core::error::WireResult;
use crate::ids::FuncId;
use crate::wire::CommandBuffer;

/// 由 [`BridgeCore`](super::BridgeCore) 在每一步创建并传给 [`CoreApp`](super::CoreApp)
pub struct CoreContext<'a> {
    config: &'a CoreConfig,
    next_request_id: &'a mut u64,
    commands: &'a mut CommandBuffer,
}

impl<'a> CoreContext<'a> {
    pub(crate) fn new(
        config: &'a CoreConfig,
        next_request_id: &'a mut u64,
        commands: &'a mut CommandBuffer,
    ) -> Self {
        Self {
            config,
            next_request_id,
            commands,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        self.config
    }

    /// 实例内递增的请求 ID，从 1 开始
    pub fn alloc_request_id(&mut self) -> u64 {
        let id = *self.next_request_id;
        *self.next_request_id = id.wrapping_add(1);
        id
    }

    /// 拷贝文本到本步的字符串存储
    pub fn store_utf8(&mut self, text: &str) -> StringView {
        self.commands.store_utf8(text)
    }

    /// 向 Host 追加一个 `CallHost` 帧
    ///
    /// 一般通过生成的 `host_calls` 函数调用，而不是直接使用。
    ///
    /// # Safety
    ///
    /// `payload` 中的每个 [`StringView`] 必须为空或由本步的
    /// [`store_utf8`](Self::store_utf8) 返回：Host 从可信 stream 中读取
    /// span 时会直接解引用这些指针。
    pub unsafe fn call_host(&mut self, func_id: FuncId, payload: &[u8]) -> WireResult<()> {
        self.commands.call_host(func_id, payload).map_err(|e| {
            tracing::warn!(target: "bridge_runtime", "call {} dropped: {}", func_id, e);
            e
        })
    }

    /// 本步已写出的字节数
    pub fn command_bytes(&self) -> usize {
        self.commands.len()
    }

    pub fn identity_transform() -> Transform {
        Transform::IDENTITY
    }
}

impl std::fmt::Debug for CoreContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreContext")
            .field("config", self.config)
            .field("next_request_id", &*self.next_request_id)
            .field("command_bytes", &self.commands.len())
            .finish()
    }
}
