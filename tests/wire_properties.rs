//! Command stream 属性测试
//!
//! 使用proptest验证编码/解码的游标守恒、截断安全与前向跳过

use native_bridge::abi::{AssetStatus, LogLevel, Quat, StringView, Transform, Vec3};
use native_bridge::ids::{fnv1a32, Direction, FuncId};
use native_bridge::wire::{
    decode_checked, read_args, CommandBuffer, CommandStream, FrameIter, CALL_HOST_SIZE,
    HEADER_SIZE,
};
use proptest::prelude::*;

fn calls() -> impl Strategy<Value = Vec<(u32, Vec<u8>)>> {
    prop::collection::vec(
        (any::<u32>(), prop::collection::vec(any::<u8>(), 0..96)),
        0..24,
    )
}

fn encode(calls: &[(u32, Vec<u8>)]) -> CommandBuffer {
    let mut buffer = CommandBuffer::new();
    for (id, payload) in calls {
        buffer.call_host(FuncId(*id), payload).unwrap();
    }
    buffer
}

/// 逐字节的参考实现
fn reference_fnv1a32(input: &str) -> u32 {
    let mut hash: u32 = 0x811C_9DC5;
    for byte in input.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

proptest! {
    #[test]
    fn func_id_is_deterministic(module in "[A-Z][A-Za-z0-9]{0,12}", name in "[A-Z][A-Za-z0-9]{0,16}") {
        let first = FuncId::compute(Direction::ToHost, &module, &name);
        let second = FuncId::compute(Direction::ToHost, &module, &name);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.raw(), reference_fnv1a32(&format!("H:{module}.{name}")));
        prop_assert_eq!(
            FuncId::compute(Direction::ToCore, &module, &name).raw(),
            fnv1a32(format!("C:{module}.{name}").as_bytes())
        );
    }

    #[test]
    fn checked_decode_round_trips(calls in calls()) {
        let buffer = encode(&calls);
        let mut seen = Vec::new();
        let stats = decode_checked(CommandStream::from_bytes(buffer.as_bytes()), |call| {
            seen.push((call.func_id().raw(), call.payload().to_vec()));
            true
        });

        prop_assert_eq!(stats.frames, calls.len());
        prop_assert_eq!(stats.dispatched, calls.len());
        prop_assert_eq!(stats.bytes_consumed, buffer.len());
        prop_assert!(!stats.truncated);
        for ((id, payload), (seen_id, seen_payload)) in calls.iter().zip(&seen) {
            prop_assert_eq!(id, seen_id);
            // 解码得到的 payload 含尾部补齐
            prop_assert_eq!(&seen_payload[..payload.len()], &payload[..]);
            prop_assert!(seen_payload[payload.len()..].iter().all(|&b| b == 0));
            prop_assert_eq!((CALL_HOST_SIZE + seen_payload.len()) % 8, 0);
        }
    }

    #[test]
    fn cursor_is_conserved(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut frames = FrameIter::new(&bytes);
        let mut total = 0usize;
        for frame in frames.by_ref() {
            prop_assert!(frame.size() >= HEADER_SIZE);
            prop_assert_eq!(usize::from(frame.header.size), frame.size());
            total += frame.size();
        }
        prop_assert_eq!(total, frames.consumed());
        prop_assert!(total <= bytes.len());

        let stats = decode_checked(CommandStream::from_bytes(&bytes), |_| true);
        prop_assert_eq!(stats.bytes_consumed, total);
        prop_assert_eq!(stats.dispatched + stats.skipped, stats.frames);
    }

    #[test]
    fn truncated_tail_stops_cleanly(calls in calls(), cut in any::<prop::sample::Index>()) {
        let buffer = encode(&calls);
        let bytes = buffer.as_bytes();
        let cut = if bytes.is_empty() { 0 } else { cut.index(bytes.len()) };
        let truncated = &bytes[..cut];

        let mut seen = Vec::new();
        let stats = decode_checked(CommandStream::from_bytes(truncated), |call| {
            seen.push(call.func_id().raw());
            true
        });

        prop_assert!(stats.bytes_consumed <= cut);
        // 只交付完整的前缀帧
        let expected: Vec<u32> = calls.iter().map(|(id, _)| *id).take(seen.len()).collect();
        prop_assert_eq!(&seen, &expected);
        if stats.bytes_consumed < cut {
            prop_assert!(stats.truncated);
        }
    }

    #[test]
    fn unknown_ids_are_skipped_in_order(
        known in prop::collection::vec(any::<u16>(), 1..16),
        unknown_every in 1usize..4,
    ) {
        // 已知 ID 为偶数，未知 ID 为奇数
        let mut buffer = CommandBuffer::new();
        let mut expected = Vec::new();
        for (index, value) in known.iter().enumerate() {
            let id = u32::from(*value) * 2;
            buffer.call_host(FuncId(id), &value.to_le_bytes()).unwrap();
            expected.push(id);
            if index % unknown_every == 0 {
                buffer.call_host(FuncId(id + 1), &[0xFF; 3]).unwrap();
            }
        }

        let mut seen = Vec::new();
        let stats = decode_checked(CommandStream::from_bytes(buffer.as_bytes()), |call| {
            let id = call.func_id().raw();
            if id % 2 == 1 {
                return false;
            }
            seen.push(id);
            true
        });

        prop_assert_eq!(seen, expected);
        prop_assert_eq!(stats.frames, stats.dispatched + stats.skipped);
        prop_assert_eq!(stats.bytes_consumed, buffer.len());
    }

    #[test]
    fn value_types_round_trip_bit_for_bit(
        position in prop::array::uniform3(any::<f32>()),
        rotation in prop::array::uniform4(any::<f32>()),
        level in any::<u32>(),
        request in any::<u64>(),
    ) {
        #[repr(C)]
        #[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
        struct Payload {
            request: u64,
            level: LogLevel,
            status: AssetStatus,
            transform: Transform,
            text: StringView,
        }

        let payload = Payload {
            request,
            level: LogLevel::from_raw(level),
            status: AssetStatus::NOT_FOUND,
            transform: Transform {
                position: Vec3 { x: position[0], y: position[1], z: position[2], reserved0: 0.0 },
                rotation: Quat { x: rotation[0], y: rotation[1], z: rotation[2], w: rotation[3] },
                scale: Vec3::ONE,
            },
            text: StringView::EMPTY,
        };

        let mut buffer = CommandBuffer::new();
        buffer.call_host(FuncId(1), bytemuck::bytes_of(&payload)).unwrap();
        let mut decoded = None;
        decode_checked(CommandStream::from_bytes(buffer.as_bytes()), |call| {
            decoded = call.args::<Payload>();
            decoded.is_some()
        });

        let decoded = decoded.unwrap();
        prop_assert_eq!(bytemuck::bytes_of(&decoded), bytemuck::bytes_of(&payload));
        prop_assert_eq!(decoded.level.raw(), level);
        prop_assert!(read_args::<Payload>(&bytemuck::bytes_of(&payload)[..8]).is_none());
    }
}

#[test]
fn test_size_below_header_stops() {
    let mut bytes = vec![0u8; 32];
    // type = CallHost, size = 4
    bytes[0] = 1;
    bytes[2] = 4;
    let stats = decode_checked(CommandStream::from_bytes(&bytes), |_| true);
    assert_eq!(stats.frames, 0);
    assert!(stats.truncated);
}

#[test]
fn test_unknown_command_type_skipped() {
    let mut buffer = CommandBuffer::new();
    // type = 7, size = 16
    let mut unknown = vec![0u8; 16];
    unknown[0] = 7;
    unknown[2] = 16;
    buffer.call_host(FuncId(1), &[1; 4]).unwrap();
    buffer.extend_raw(&unknown);
    buffer.call_host(FuncId(2), &[2; 4]).unwrap();

    let mut seen = Vec::new();
    let stats = decode_checked(CommandStream::from_bytes(buffer.as_bytes()), |call| {
        seen.push(call.func_id());
        true
    });
    assert_eq!(seen, vec![FuncId(1), FuncId(2)]);
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_untrusted_spans_are_unreadable() {
    let mut buffer = CommandBuffer::new();
    let view = buffer.store_utf8("Main/Prefabs/Bot");
    buffer.call_host(FuncId(3), bytemuck::bytes_of(&view)).unwrap();

    decode_checked(CommandStream::from_bytes(buffer.as_bytes()), |call| {
        let view: StringView = call.args().unwrap();
        let span = call.span(view);
        assert_eq!(span.len(), 16);
        assert_eq!(span.as_str(), None);
        true
    });
}
