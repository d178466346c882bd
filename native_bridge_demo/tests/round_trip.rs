//! 生成代码端到端：Core 侧 stub 编码 → Host 侧 dispatch 解码

use native_bridge::abi::{AssetStatus, AssetType, CoreConfig, LogLevel, Transform};
use native_bridge::ids::{Direction, FuncId};
use native_bridge::runtime::{BridgeCore, CoreApp, CoreContext};
use native_bridge::wire::{CommandBuffer, CommandStream};
use native_bridge_demo::app::{ENTITY_ID, STARTUP_ASSET_KEY, TRANSFORM_MASK_POSITION};
use native_bridge_demo::bindings::{core as core_side, host};
use native_bridge_demo::{
    fake_handle_from_key, DemoAssetApp, HostEvent, RecordingHost, RobotHost, TelemetrySample,
};
use proptest::prelude::*;

use host::demo_asset::DemoAssetCoreCalls;

const DT: f32 = 1.0 / 60.0;

fn demo_core() -> BridgeCore {
    BridgeCore::new(CoreConfig::default(), Box::new(DemoAssetApp::new()))
}

fn tick_and_record(core: &mut BridgeCore, dt: f32) -> Vec<HostEvent> {
    let mut recorder = RecordingHost::new();
    let stats = host::dispatch(core.tick_and_get_command_stream(dt), &mut recorder);
    assert!(!stats.truncated);
    assert_eq!(stats.skipped, 0);
    recorder.take()
}

/// 每步执行一次给定闭包的 app
struct ScriptApp<F>(F);

impl<F> CoreApp for ScriptApp<F>
where
    F: FnMut(&mut CoreContext<'_>) + Send,
{
    fn tick(&mut self, ctx: &mut CoreContext<'_>, _dt: f32) {
        (self.0)(ctx);
    }
}

fn script_core<F>(script: F) -> BridgeCore
where
    F: FnMut(&mut CoreContext<'_>) + Send + 'static,
{
    BridgeCore::new(CoreConfig::default(), Box::new(ScriptApp(script)))
}

/// 每个字段取任意位模式，浮点包括全部 NaN 载荷
fn telemetry_samples() -> impl Strategy<Value = TelemetrySample> {
    (
        (any::<u8>(), any::<u64>(), any::<i8>(), any::<u16>(), any::<i64>(), any::<i16>()),
        (any::<u32>(), any::<u32>(), any::<i32>(), any::<u64>()),
        (
            prop::array::uniform4(any::<u32>()),
            prop::array::uniform4(any::<u32>()),
            prop::array::uniform12(any::<u32>()),
        ),
        (any::<u32>(), any::<u32>(), any::<u32>(), "\\PC{0,32}"),
    )
        .prop_map(
            |(
                (flags, time_bits, delta, channel, ticks, offset),
                (count, gain_bits, bias, sequence),
                (velocity_bits, orientation_bits, pose_bits),
                (level, kind, status, label),
            )| TelemetrySample {
                flags,
                time_bits,
                delta,
                channel,
                ticks,
                offset,
                count,
                gain_bits,
                bias,
                sequence,
                velocity_bits,
                orientation_bits,
                pose_bits,
                level: LogLevel::from_raw(level),
                kind: AssetType::from_raw(kind),
                status: AssetStatus::from_raw(status),
                label: Some(label),
            },
        )
}

fn send_sample(ctx: &mut CoreContext<'_>, s: &TelemetrySample) {
    core_side::demo_telemetry::sample(
        ctx,
        s.flags,
        s.time(),
        s.delta,
        s.channel,
        s.ticks,
        s.offset,
        s.count,
        s.gain(),
        s.bias,
        s.sequence,
        s.velocity(),
        s.orientation(),
        s.pose(),
        s.level,
        s.kind,
        s.status,
        s.label.as_deref().unwrap_or_default(),
    )
    .unwrap();
}

#[test]
fn test_ids_match_hash_of_qualified_names() {
    assert_eq!(host::demo_log::host_func_id::LOG, FuncId(0xDA3184A2));
    assert_eq!(
        host::demo_entity::host_func_id::SPAWN_ENTITY,
        FuncId::compute(Direction::ToHost, "DemoEntity", "SpawnEntity")
    );
    assert_eq!(host::demo_asset::host_func_id::LOAD_ASSET, FuncId(0x82A5E93A));
    assert_eq!(core_side::demo_asset::core_func_id::ASSET_LOADED, FuncId(0x2442BC8A));
    assert_eq!(host::demo_telemetry::host_func_id::SAMPLE, FuncId(0x64CA71ED));
    // 两侧是同一份常量
    assert_eq!(
        core_side::demo_entity::host_func_id::DESTROY_ENTITY,
        host::demo_entity::host_func_id::DESTROY_ENTITY
    );
}

#[test]
fn test_payload_layouts_agree() {
    use std::mem::size_of;

    assert_eq!(size_of::<host::demo_log::HostArgsLog>(), 24);
    assert_eq!(size_of::<host::demo_entity::HostArgsSpawnEntity>(), 72);
    assert_eq!(size_of::<host::demo_entity::HostArgsSetTransform>(), 64);
    assert_eq!(size_of::<host::demo_entity::HostArgsDestroyEntity>(), 8);
    assert_eq!(size_of::<host::demo_asset::CoreArgsAssetLoaded>(), 24);
    assert_eq!(size_of::<host::demo_telemetry::HostArgsSample>(), 168);
    assert_eq!(
        size_of::<host::demo_telemetry::HostArgsSample>(),
        size_of::<core_side::demo_telemetry::HostArgsSample>()
    );
    assert_eq!(
        size_of::<host::demo_asset::HostArgsLoadAsset>(),
        size_of::<core_side::demo_asset::HostArgsLoadAsset>()
    );
}

#[test]
fn test_startup_flow() {
    let mut core = demo_core();

    // 第一步：请求资源
    let events = tick_and_record(&mut core, DT);
    assert_eq!(
        events,
        vec![
            HostEvent::Log {
                level: LogLevel::INFO,
                message: Some("Requesting startup prefab asset".to_string()),
            },
            HostEvent::LoadAsset {
                request_id: 1,
                asset_type: AssetType::PREFAB,
                asset_key: Some(STARTUP_ASSET_KEY.to_string()),
            },
        ]
    );

    // 资源未就绪时什么也不发
    assert!(tick_and_record(&mut core, DT).is_empty());

    core.asset_loaded(1, 42, AssetStatus::OK);
    assert_eq!(core.pending_calls(), 1);

    // 应答在下一步开头交付，随后生成实体并移动
    let events = tick_and_record(&mut core, DT);
    assert_eq!(core.pending_calls(), 0);
    assert_eq!(
        events,
        vec![
            HostEvent::Log {
                level: LogLevel::INFO,
                message: Some("Startup asset loaded".to_string()),
            },
            HostEvent::SpawnEntity {
                entity_id: ENTITY_ID,
                prefab_handle: 42,
                transform: Transform::IDENTITY,
                flags: 0,
            },
            HostEvent::SetTransform {
                entity_id: ENTITY_ID,
                mask: TRANSFORM_MASK_POSITION,
                transform: Transform::from_translation(glam::Vec3::new(DT, 0.0, 0.0)),
            },
        ]
    );

    let events = tick_and_record(&mut core, DT);
    assert_eq!(
        events,
        vec![HostEvent::SetTransform {
            entity_id: ENTITY_ID,
            mask: TRANSFORM_MASK_POSITION,
            transform: Transform::from_translation(glam::Vec3::new(DT + DT, 0.0, 0.0)),
        }]
    );
    assert_eq!(core.steps(), 4);
}

#[test]
fn test_failed_load_is_logged_and_no_entity_spawned() {
    let mut core = demo_core();
    tick_and_record(&mut core, DT);

    core.asset_loaded(1, 0, AssetStatus::NOT_FOUND);
    let events = tick_and_record(&mut core, DT);
    assert_eq!(
        events,
        vec![HostEvent::Log {
            level: LogLevel::ERROR,
            message: Some("Startup asset failed to load".to_string()),
        }]
    );
    assert!(tick_and_record(&mut core, DT).is_empty());
}

#[test]
fn test_reply_for_other_request_is_ignored() {
    let mut core = demo_core();
    tick_and_record(&mut core, DT);

    core.asset_loaded(99, 42, AssetStatus::OK);
    assert!(tick_and_record(&mut core, DT).is_empty());
}

#[test]
fn test_robot_host_replies_with_fake_handle() {
    let mut core = demo_core();
    let mut robot = RobotHost::new();

    host::dispatch(core.tick_and_get_command_stream(DT), &mut robot);
    assert_eq!(robot.stats.logs, 1);
    assert_eq!(robot.stats.asset_requests, 1);
    assert_eq!(robot.outbox().len(), 1);
    assert_eq!(robot.flush_into(&mut core), 1);
    assert!(robot.outbox().is_empty());

    let events = tick_and_record(&mut core, DT);
    let expected = fake_handle_from_key(STARTUP_ASSET_KEY.as_bytes());
    assert!(events.iter().any(|event| matches!(
        event,
        HostEvent::SpawnEntity { prefab_handle, .. } if *prefab_handle == expected
    )));
}

#[test]
fn test_checked_and_unchecked_dispatch_agree() {
    let mut core = demo_core();
    tick_and_record(&mut core, DT);
    core.asset_loaded(1, 7, AssetStatus::OK);

    let stream = core.tick_and_get_command_stream(DT);
    let mut checked = RecordingHost::new();
    let stats = host::dispatch(stream, &mut checked);

    let mut unchecked = RecordingHost::new();
    // SAFETY: stream 来自本进程的 Core，且下一次 tick 之前使用
    let frames = unsafe { host::dispatch_unchecked(stream, &mut unchecked) };

    assert_eq!(stats.frames, 3);
    assert_eq!(frames, 3);
    assert_eq!(checked.events, unchecked.events);
}

#[test]
fn test_untrusted_copy_hides_spans() {
    let mut core = demo_core();
    let bytes = core.tick_and_get_command_stream(DT).as_bytes().to_vec();

    let mut recorder = RecordingHost::new();
    let stats = host::dispatch(CommandStream::from_bytes(&bytes), &mut recorder);
    assert_eq!(stats.dispatched, 2);
    assert_eq!(
        recorder.events,
        vec![
            HostEvent::Log {
                level: LogLevel::INFO,
                message: None,
            },
            HostEvent::LoadAsset {
                request_id: 1,
                asset_type: AssetType::PREFAB,
                asset_key: None,
            },
        ]
    );
}

#[test]
fn test_unknown_calls_are_skipped() {
    let mut destroy: host::demo_entity::HostArgsDestroyEntity =
        native_bridge::bytemuck::Zeroable::zeroed();
    destroy.entity_id = 9;

    let mut buffer = CommandBuffer::new();
    buffer.call_host(FuncId(0xDEAD_BEEF), &[0xFF; 20]).unwrap();
    buffer
        .call_host(
            host::demo_entity::host_func_id::DESTROY_ENTITY,
            native_bridge::bytemuck::bytes_of(&destroy),
        )
        .unwrap();
    // payload 过短
    buffer
        .call_host(host::demo_entity::host_func_id::SPAWN_ENTITY, &[0; 8])
        .unwrap();

    let mut recorder = RecordingHost::new();
    let stats = host::dispatch(CommandStream::from_bytes(buffer.as_bytes()), &mut recorder);
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(recorder.events, vec![HostEvent::DestroyEntity { entity_id: 9 }]);
}

#[test]
fn test_core_side_ignores_unknown_to_core_calls() {
    let mut core = demo_core();
    tick_and_record(&mut core, DT);

    core.push_call_core(FuncId(0x1234_5678), &[1, 2, 3]);
    // payload 过短
    core.push_call_core(core_side::demo_asset::core_func_id::ASSET_LOADED, &[0; 4]);
    assert!(tick_and_record(&mut core, DT).is_empty());
}

proptest! {
    #[test]
    fn entity_calls_round_trip(
        entity_id in any::<u64>(),
        prefab in any::<u64>(),
        flags in any::<u32>(),
        mask in any::<u32>(),
        position in prop::array::uniform3(-1.0e6f32..1.0e6),
    ) {
        let transform = Transform::from_translation(glam::Vec3::from_array(position));
        let mut core = script_core(move |ctx| {
            core_side::demo_entity::spawn_entity(ctx, entity_id, prefab, transform, flags).unwrap();
            core_side::demo_entity::set_transform(ctx, entity_id, mask, transform).unwrap();
            core_side::demo_entity::destroy_entity(ctx, entity_id).unwrap();
        });

        let events = tick_and_record(&mut core, DT);
        prop_assert_eq!(
            events,
            vec![
                HostEvent::SpawnEntity { entity_id, prefab_handle: prefab, transform, flags },
                HostEvent::SetTransform { entity_id, mask, transform },
                HostEvent::DestroyEntity { entity_id },
            ]
        );
    }

    #[test]
    fn every_type_round_trips_bit_for_bit(sample in telemetry_samples()) {
        let sent = sample.clone();
        let mut core = script_core(move |ctx| send_sample(ctx, &sent));

        let stream = core.tick_and_get_command_stream(DT);
        let mut checked = RecordingHost::new();
        let stats = host::dispatch(stream, &mut checked);
        prop_assert_eq!(stats.dispatched, 1);
        prop_assert_eq!(stats.skipped, 0);

        let mut unchecked = RecordingHost::new();
        // SAFETY: stream 来自本进程的 Core，且在下一次 tick 之前使用
        let frames = unsafe { host::dispatch_unchecked(stream, &mut unchecked) };
        prop_assert_eq!(frames, 1);

        let expected = vec![HostEvent::Sample(Box::new(sample))];
        prop_assert_eq!(&checked.events, &expected);
        prop_assert_eq!(&unchecked.events, &expected);
    }

    #[test]
    fn text_spans_round_trip(message in "\\PC{0,64}", key in "[A-Za-z0-9/_]{0,32}", level in 0u32..4) {
        let (message_in, key_in) = (message.clone(), key.clone());
        let mut core = script_core(move |ctx| {
            core_side::demo_log::log(ctx, LogLevel::from_raw(level), &message_in).unwrap();
            let request_id = ctx.alloc_request_id();
            core_side::demo_asset::load_asset(ctx, request_id, AssetType::UNKNOWN, &key_in).unwrap();
        });

        let events = tick_and_record(&mut core, DT);
        prop_assert_eq!(
            events,
            vec![
                HostEvent::Log { level: LogLevel::from_raw(level), message: Some(message) },
                HostEvent::LoadAsset { request_id: 1, asset_type: AssetType::UNKNOWN, asset_key: Some(key) },
            ]
        );
    }
}
