//! 生成会话
//!
//! 一次生成运行内累积的函数 ID 注册表。聚合分发器把所有模块的 to-host ID
//! 放在同一个 `match` 空间里，所以跨模块冲突必须在生成期发现，而不是解码期。

use std::collections::BTreeMap;

use super::{qualified_name, Direction, FuncId};
use crate::core::error::CollisionError;

/// 注册结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 首次出现
    New,
    /// 同一限定名再次出现（幂等接受）
    AlreadyRegistered,
}

/// 单方向的 ID -> 限定名 映射
#[derive(Debug, Clone)]
pub struct IdRegistry {
    direction: Direction,
    names: BTreeMap<FuncId, String>,
}

impl IdRegistry {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            names: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// 注册 `id -> qualified`
    ///
    /// 同名重复注册是幂等的；不同限定名占用同一 ID 返回 [`CollisionError`]，
    /// 且注册表保持不变。
    pub fn register(&mut self, id: FuncId, qualified: &str) -> Result<Registration, CollisionError> {
        match self.names.get(&id) {
            None => {
                self.names.insert(id, qualified.to_string());
                Ok(Registration::New)
            }
            Some(existing) if existing == qualified => Ok(Registration::AlreadyRegistered),
            Some(existing) => Err(CollisionError {
                direction: self.direction,
                id,
                existing: existing.clone(),
                incoming: qualified.to_string(),
            }),
        }
    }

    pub fn get(&self, id: FuncId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按 ID 升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (FuncId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

/// 一次生成运行的会话状态
///
/// 由调用方显式创建并在解析/生成过程中传递，不是进程级单例。
#[derive(Debug, Clone)]
pub struct BuildSession {
    host: IdRegistry,
    core: IdRegistry,
}

impl Default for BuildSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSession {
    pub fn new() -> Self {
        Self {
            host: IdRegistry::new(Direction::ToHost),
            core: IdRegistry::new(Direction::ToCore),
        }
    }

    /// 计算并注册一个声明的 ID
    pub fn register(
        &mut self,
        direction: Direction,
        module: &str,
        name: &str,
    ) -> Result<FuncId, CollisionError> {
        let id = FuncId::compute(direction, module, name);
        let qualified = qualified_name(module, name);
        let registration = self.registry_mut(direction).register(id, &qualified)?;
        if registration == Registration::AlreadyRegistered {
            tracing::debug!(target: "bridgegen", "{} {} re-registered as {}", direction, qualified, id);
        }
        Ok(id)
    }

    pub fn registry(&self, direction: Direction) -> &IdRegistry {
        match direction {
            Direction::ToHost => &self.host,
            Direction::ToCore => &self.core,
        }
    }

    fn registry_mut(&mut self, direction: Direction) -> &mut IdRegistry {
        match direction {
            Direction::ToHost => &mut self.host,
            Direction::ToCore => &mut self.core,
        }
    }
}
