//! Core 侧示例 app
//!
//! - 第一步：请求启动 Prefab
//! - 收到 `AssetLoaded` 后的第一步：生成实体
//! - 之后每一步：沿 x 轴移动实体

use native_bridge::abi::{AssetStatus, AssetType, CoreConfig, LogLevel, Transform};
use native_bridge::ids::FuncId;
use native_bridge::runtime::{CoreApp, CoreContext};
use native_bridge::WireResult;

use crate::bindings::core::{demo_asset, demo_entity, demo_log, demo_telemetry, dispatch_core_call};

/// 启动时请求的 Prefab
pub const STARTUP_ASSET_KEY: &str = "Main/Prefabs/Bot";

/// 示例实体的 ID
pub const ENTITY_ID: u64 = 1;

/// `SetTransform` 的位置掩码
pub const TRANSFORM_MASK_POSITION: u32 = 1;

#[derive(Debug, Default)]
pub struct DemoAssetApp {
    startup_request: Option<u64>,
    startup_handle: Option<u64>,
    entity_spawned: bool,
    elapsed: f32,
}

impl DemoAssetApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// 可注册为 [`native_bridge::runtime::ffi::set_app_factory`] 的工厂
    pub fn create(_config: &CoreConfig) -> Box<dyn CoreApp> {
        Box::new(Self::new())
    }

    pub fn startup_request(&self) -> Option<u64> {
        self.startup_request
    }

    pub fn startup_handle(&self) -> Option<u64> {
        self.startup_handle
    }

    pub fn is_entity_spawned(&self) -> bool {
        self.entity_spawned
    }

    /// 实体生成后累计的时间
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn step(&mut self, ctx: &mut CoreContext<'_>, dt: f32) -> WireResult<()> {
        if self.startup_request.is_none() {
            let request_id = ctx.alloc_request_id();
            self.startup_request = Some(request_id);
            demo_log::log(ctx, LogLevel::INFO, "Requesting startup prefab asset")?;
            demo_asset::load_asset(ctx, request_id, AssetType::PREFAB, STARTUP_ASSET_KEY)?;
        }

        if let Some(handle) = self.startup_handle.filter(|_| !self.entity_spawned) {
            self.entity_spawned = true;
            demo_entity::spawn_entity(ctx, ENTITY_ID, handle, CoreContext::identity_transform(), 0)?;
        }

        if self.entity_spawned {
            self.elapsed += dt;
            let transform = Transform::from_translation(glam::Vec3::new(self.elapsed, 0.0, 0.0));
            demo_entity::set_transform(ctx, ENTITY_ID, TRANSFORM_MASK_POSITION, transform)?;
        }
        Ok(())
    }
}

impl CoreApp for DemoAssetApp {
    fn tick(&mut self, ctx: &mut CoreContext<'_>, dt: f32) {
        if let Err(e) = self.step(ctx, dt) {
            tracing::warn!(target: "demo", "step failed: {}", e);
        }
    }

    fn on_call_core(&mut self, ctx: &mut CoreContext<'_>, func_id: FuncId, payload: &[u8]) {
        if !dispatch_core_call(self, ctx, func_id, payload) {
            tracing::debug!(
                target: "demo",
                "ignored call {} ({} bytes)",
                func_id,
                payload.len()
            );
        }
    }
}

impl demo_asset::DemoAssetCoreApi for DemoAssetApp {
    fn asset_loaded(
        &mut self,
        ctx: &mut CoreContext<'_>,
        request_id: u64,
        handle: u64,
        status: AssetStatus,
    ) {
        if self.startup_request != Some(request_id) {
            return;
        }

        let logged = if status == AssetStatus::OK {
            self.startup_handle = Some(handle);
            demo_log::log(ctx, LogLevel::INFO, "Startup asset loaded")
        } else {
            demo_log::log(ctx, LogLevel::ERROR, "Startup asset failed to load")
        };
        if let Err(e) = logged {
            tracing::warn!(target: "demo", "log dropped: {}", e);
        }
    }
}

impl demo_entity::DemoEntityCoreApi for DemoAssetApp {}

impl demo_log::DemoLogCoreApi for DemoAssetApp {}

impl demo_telemetry::DemoTelemetryCoreApi for DemoAssetApp {}
