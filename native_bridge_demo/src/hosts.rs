//! Host 侧示例实现

use native_bridge::abi::{AssetStatus, AssetType, LogLevel, Quat, Transform, Vec3};
use native_bridge::bytemuck;
use native_bridge::runtime::{CoreCallSink, PendingCalls};
use native_bridge::wire::ExternalSpan;

use crate::bindings::host::demo_asset::{DemoAssetCoreCalls, DemoAssetHostApi};
use crate::bindings::host::demo_entity::DemoEntityHostApi;
use crate::bindings::host::demo_log::DemoLogHostApi;
use crate::bindings::host::demo_telemetry::DemoTelemetryHostApi;

/// [`RecordingHost`] 收到的调用
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Log {
        level: LogLevel,
        message: Option<String>,
    },
    SpawnEntity {
        entity_id: u64,
        prefab_handle: u64,
        transform: Transform,
        flags: u32,
    },
    SetTransform {
        entity_id: u64,
        mask: u32,
        transform: Transform,
    },
    DestroyEntity {
        entity_id: u64,
    },
    LoadAsset {
        request_id: u64,
        asset_type: AssetType,
        asset_key: Option<String>,
    },
    Sample(Box<TelemetrySample>),
}

/// `DemoTelemetry.Sample` 的全部参数
///
/// 浮点与浮点组成的值类型按位保存，NaN 也能逐位比较。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySample {
    pub flags: u8,
    pub time_bits: u64,
    pub delta: i8,
    pub channel: u16,
    pub ticks: i64,
    pub offset: i16,
    pub count: u32,
    pub gain_bits: u32,
    pub bias: i32,
    pub sequence: u64,
    pub velocity_bits: [u32; 4],
    pub orientation_bits: [u32; 4],
    pub pose_bits: [u32; 12],
    pub level: LogLevel,
    pub kind: AssetType,
    pub status: AssetStatus,
    pub label: Option<String>,
}

impl TelemetrySample {
    pub fn time(&self) -> f64 {
        f64::from_bits(self.time_bits)
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits)
    }

    pub fn velocity(&self) -> Vec3 {
        bytemuck::cast(self.velocity_bits)
    }

    pub fn orientation(&self) -> Quat {
        bytemuck::cast(self.orientation_bits)
    }

    pub fn pose(&self) -> Transform {
        bytemuck::cast(self.pose_bits)
    }
}

/// 按到达顺序记录每个调用
///
/// span 参数在不可信 stream 中读不到，记录为 `None`。
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub events: Vec<HostEvent>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}

fn span_text(span: ExternalSpan<'_>) -> Option<String> {
    span.as_str().map(str::to_owned)
}

impl DemoLogHostApi for RecordingHost {
    fn log(&mut self, level: LogLevel, message: ExternalSpan<'_>) {
        self.events.push(HostEvent::Log {
            level,
            message: span_text(message),
        });
    }
}

impl DemoEntityHostApi for RecordingHost {
    fn spawn_entity(&mut self, entity_id: u64, prefab_handle: u64, transform: &Transform, flags: u32) {
        self.events.push(HostEvent::SpawnEntity {
            entity_id,
            prefab_handle,
            transform: *transform,
            flags,
        });
    }

    fn set_transform(&mut self, entity_id: u64, mask: u32, transform: &Transform) {
        self.events.push(HostEvent::SetTransform {
            entity_id,
            mask,
            transform: *transform,
        });
    }

    fn destroy_entity(&mut self, entity_id: u64) {
        self.events.push(HostEvent::DestroyEntity { entity_id });
    }
}

impl DemoAssetHostApi for RecordingHost {
    fn load_asset(&mut self, request_id: u64, asset_type: AssetType, asset_key: ExternalSpan<'_>) {
        self.events.push(HostEvent::LoadAsset {
            request_id,
            asset_type,
            asset_key: span_text(asset_key),
        });
    }
}

impl DemoTelemetryHostApi for RecordingHost {
    fn sample(
        &mut self,
        flags: u8,
        time: f64,
        delta: i8,
        channel: u16,
        ticks: i64,
        offset: i16,
        count: u32,
        gain: f32,
        bias: i32,
        sequence: u64,
        velocity: Vec3,
        orientation: Quat,
        pose: &Transform,
        level: LogLevel,
        kind: AssetType,
        status: AssetStatus,
        label: ExternalSpan<'_>,
    ) {
        self.events.push(HostEvent::Sample(Box::new(TelemetrySample {
            flags,
            time_bits: time.to_bits(),
            delta,
            channel,
            ticks,
            offset,
            count,
            gain_bits: gain.to_bits(),
            bias,
            sequence,
            velocity_bits: bytemuck::cast(velocity),
            orientation_bits: bytemuck::cast(orientation),
            pose_bits: bytemuck::cast(*pose),
            level,
            kind,
            status,
            label: span_text(label),
        })));
    }
}

/// 64 位 FNV-1a；结果为 0 时取 1，0 保留为无效句柄
pub fn fake_handle_from_key(key: &[u8]) -> u64 {
    const OFFSET: u64 = 1_469_598_103_934_665_603;
    const PRIME: u64 = 1_099_511_628_211;

    let hash = key
        .iter()
        .fold(OFFSET, |hash, &byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME));
    if hash == 0 {
        1
    } else {
        hash
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RobotStats {
    pub logs: u64,
    pub spawns: u64,
    pub transforms: u64,
    pub destroys: u64,
    pub asset_requests: u64,
    pub samples: u64,
}

impl RobotStats {
    pub fn total_commands(&self) -> u64 {
        self.logs + self.spawns + self.transforms + self.destroys + self.asset_requests + self.samples
    }
}

/// 压测用 Host：只计数，并立即以假句柄应答资源请求
///
/// 应答先进入 [`outbox`](Self::outbox)，分发结束后调用
/// [`flush_into`](Self::flush_into) 转交给对应 Core。
#[derive(Debug, Default)]
pub struct RobotHost {
    pub stats: RobotStats,
    outbox: PendingCalls,
}

impl RobotHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outbox(&self) -> &PendingCalls {
        &self.outbox
    }

    /// 把缓存的应答转交给 `core`，返回条数
    pub fn flush_into<S: CoreCallSink + ?Sized>(&mut self, core: &mut S) -> usize {
        self.outbox.drain_into(core)
    }
}

impl DemoLogHostApi for RobotHost {
    fn log(&mut self, _level: LogLevel, _message: ExternalSpan<'_>) {
        self.stats.logs += 1;
    }
}

impl DemoEntityHostApi for RobotHost {
    fn spawn_entity(&mut self, _entity_id: u64, _prefab_handle: u64, _transform: &Transform, _flags: u32) {
        self.stats.spawns += 1;
    }

    fn set_transform(&mut self, _entity_id: u64, _mask: u32, _transform: &Transform) {
        self.stats.transforms += 1;
    }

    fn destroy_entity(&mut self, _entity_id: u64) {
        self.stats.destroys += 1;
    }
}

impl DemoAssetHostApi for RobotHost {
    fn load_asset(&mut self, request_id: u64, _asset_type: AssetType, asset_key: ExternalSpan<'_>) {
        self.stats.asset_requests += 1;
        let (handle, status) = match asset_key.as_bytes() {
            Some(key) => (fake_handle_from_key(key), AssetStatus::OK),
            None => (0, AssetStatus::ERROR),
        };
        self.outbox.asset_loaded(request_id, handle, status);
    }
}

impl DemoTelemetryHostApi for RobotHost {
    fn sample(
        &mut self,
        _flags: u8,
        _time: f64,
        _delta: i8,
        _channel: u16,
        _ticks: i64,
        _offset: i16,
        _count: u32,
        _gain: f32,
        _bias: i32,
        _sequence: u64,
        _velocity: Vec3,
        _orientation: Quat,
        _pose: &Transform,
        _level: LogLevel,
        _kind: AssetType,
        _status: AssetStatus,
        _label: ExternalSpan<'_>,
    ) {
        self.stats.samples += 1;
    }
}
