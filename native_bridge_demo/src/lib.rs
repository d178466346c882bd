//! # Native Bridge Demo
//!
//! 用 `defs/` 下的 IDL 模块演示完整数据流：
//!
//! - Core 侧 [`app::DemoAssetApp`] 请求一个 Prefab，加载完成后生成实体并每步移动它
//! - Host 侧 [`hosts::RecordingHost`] 记录收到的每个调用，
//!   [`hosts::RobotHost`] 以假资源句柄应答资源请求
//! - `DemoTelemetry.Sample` 一次携带全部参数类型，用于逐位往返测试
//!
//! 两侧绑定由 `build.rs` 在构建时生成。

/// 生成的绑定
pub mod bindings {
    /// Host 侧：handler trait、to-core 调用扩展与 `dispatch`
    pub mod host {
        include!(concat!(env!("OUT_DIR"), "/host/bridge_all.g.rs"));
    }

    /// Core 侧：to-host 调用函数、to-core handler trait 与 `dispatch_core_call`
    pub mod core {
        include!(concat!(env!("OUT_DIR"), "/core/bridge_core_all.g.rs"));
    }
}

pub mod app;
pub mod hosts;

pub use app::DemoAssetApp;
pub use hosts::{
    fake_handle_from_key, HostEvent, RecordingHost, RobotHost, RobotStats, TelemetrySample,
};
