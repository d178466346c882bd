//! 对外 C ABI
//!
//! 这一层只做参数校验并转发给 [`BridgeCore`]。Core 运行的 app 由进程级工厂
//! 创建：业务库在加载时调用一次 [`set_app_factory`]；未注册时实例运行
//! [`NullApp`]。
//!
//! 所有返回的 stream 指针只在对应实例下一次 tick 或销毁之前有效。

#![allow(non_snake_case)]

use std::sync::OnceLock;

use super::{BridgeCore, CoreApp, NullApp};
use crate::abi::{BridgeResult, BridgeVersion, CoreConfig, BRIDGE_VERSION};
use crate::ids::FuncId;

/// 为每个新实例创建 app
pub type AppFactory = fn(&CoreConfig) -> Box<dyn CoreApp>;

static APP_FACTORY: OnceLock<AppFactory> = OnceLock::new();

/// 注册进程级 app 工厂；只有第一次调用生效，返回是否生效
pub fn set_app_factory(factory: AppFactory) -> bool {
    let installed = APP_FACTORY.set(factory).is_ok();
    if !installed {
        tracing::warn!(target: "bridge_runtime", "app factory already registered, ignoring");
    }
    installed
}

fn create_app(config: &CoreConfig) -> Box<dyn CoreApp> {
    match APP_FACTORY.get() {
        Some(factory) => factory(config),
        None => Box::new(NullApp),
    }
}

#[no_mangle]
pub extern "C" fn Bridge_GetVersion() -> BridgeVersion {
    BRIDGE_VERSION
}

/// 创建实例；用 [`BridgeCore_Destroy`] 释放
#[no_mangle]
pub extern "C" fn BridgeCore_Create(config: CoreConfig) -> *mut BridgeCore {
    let app = create_app(&config);
    Box::into_raw(Box::new(BridgeCore::new(config, app)))
}

/// # Safety
///
/// `core` 为空，或是 [`BridgeCore_Create`] 返回且尚未销毁的指针。
#[no_mangle]
pub unsafe extern "C" fn BridgeCore_Destroy(core: *mut BridgeCore) {
    if core.is_null() {
        return;
    }
    // SAFETY: 由调用方保证指针来自 Box::into_raw 且只销毁一次
    drop(unsafe { Box::from_raw(core) });
}

/// # Safety
///
/// `core` 为空或是有效实例，且没有其他线程同时访问它。
#[no_mangle]
pub unsafe extern "C" fn BridgeCore_Tick(core: *mut BridgeCore, dt: f32) {
    // SAFETY: 由调用方保证
    if let Some(core) = unsafe { core.as_mut() } {
        core.tick(dt);
    }
}

/// # Safety
///
/// `core` 同 [`BridgeCore_Tick`]；`out_ptr`/`out_len` 为空或可写。
#[no_mangle]
pub unsafe extern "C" fn BridgeCore_TickAndGetCommandStream(
    core: *mut BridgeCore,
    dt: f32,
    out_ptr: *mut *const u8,
    out_len: *mut u32,
) -> BridgeResult {
    if out_ptr.is_null() || out_len.is_null() {
        return BridgeResult::InvalidArgument;
    }
    // SAFETY: 由调用方保证
    let Some(core) = (unsafe { core.as_mut() }) else {
        return BridgeResult::InvalidArgument;
    };
    core.tick(dt);
    // SAFETY: 已检查非空，可写性由调用方保证
    unsafe { write_stream(core, out_ptr, out_len) }
}

/// 批量推进 `count` 个实例，`out_ptrs[i]`/`out_lens[i]` 对应 `cores[i]`
///
/// 空实例指针得到空 stream。
///
/// # Safety
///
/// `cores`、`out_ptrs`、`out_lens` 各自指向至少 `count` 个元素；每个非空实例
/// 有效且在数组中只出现一次。
#[no_mangle]
pub unsafe extern "C" fn BridgeCore_TickManyAndGetCommandStreams(
    cores: *const *mut BridgeCore,
    count: u32,
    dt: f32,
    out_ptrs: *mut *const u8,
    out_lens: *mut u32,
) -> BridgeResult {
    if count == 0 {
        return BridgeResult::Ok;
    }
    if cores.is_null() || out_ptrs.is_null() || out_lens.is_null() {
        return BridgeResult::InvalidArgument;
    }

    let count = count as usize;
    // SAFETY: 长度由调用方保证
    let (cores, out_ptrs, out_lens) = unsafe {
        (
            std::slice::from_raw_parts(cores, count),
            std::slice::from_raw_parts_mut(out_ptrs, count),
            std::slice::from_raw_parts_mut(out_lens, count),
        )
    };

    for ((&core, out_ptr), out_len) in cores.iter().zip(out_ptrs).zip(out_lens) {
        // SAFETY: 由调用方保证
        match unsafe { core.as_mut() } {
            Some(core) => {
                core.tick(dt);
                let bytes = core.command_stream().as_bytes();
                *out_ptr = bytes.as_ptr();
                *out_len = stream_len(bytes);
            }
            None => {
                *out_ptr = std::ptr::null();
                *out_len = 0;
            }
        }
    }
    BridgeResult::Ok
}

/// # Safety
///
/// 同 [`BridgeCore_TickAndGetCommandStream`]。
#[no_mangle]
pub unsafe extern "C" fn BridgeCore_GetCommandStream(
    core: *const BridgeCore,
    out_ptr: *mut *const u8,
    out_len: *mut u32,
) -> BridgeResult {
    if out_ptr.is_null() || out_len.is_null() {
        return BridgeResult::InvalidArgument;
    }
    // SAFETY: 由调用方保证
    let Some(core) = (unsafe { core.as_ref() }) else {
        return BridgeResult::InvalidArgument;
    };
    // SAFETY: 已检查非空
    unsafe { write_stream(core, out_ptr, out_len) }
}

/// # Safety
///
/// `core` 同 [`BridgeCore_Tick`]；`payload_size > 0` 时 `payload` 指向至少
/// `payload_size` 个可读字节。
#[no_mangle]
pub unsafe extern "C" fn BridgeCore_PushCallCore(
    core: *mut BridgeCore,
    func_id: u32,
    payload: *const u8,
    payload_size: u32,
) -> BridgeResult {
    // SAFETY: 由调用方保证
    let Some(core) = (unsafe { core.as_mut() }) else {
        return BridgeResult::InvalidArgument;
    };
    let payload: &[u8] = if payload_size == 0 {
        &[]
    } else if payload.is_null() {
        return BridgeResult::InvalidArgument;
    } else {
        // SAFETY: 由调用方保证
        unsafe { std::slice::from_raw_parts(payload, payload_size as usize) }
    };
    core.push_call_core(FuncId(func_id), payload);
    BridgeResult::Ok
}

/// # Safety
///
/// `out_ptr` 与 `out_len` 非空且可写。
unsafe fn write_stream(core: &BridgeCore, out_ptr: *mut *const u8, out_len: *mut u32) -> BridgeResult {
    let bytes = core.command_stream().as_bytes();
    // SAFETY: 由调用方保证
    unsafe {
        *out_ptr = bytes.as_ptr();
        *out_len = stream_len(bytes);
    }
    BridgeResult::Ok
}

/// 单步输出超过 `u32::MAX` 字节时饱和
fn stream_len(bytes: &[u8]) -> u32 {
    u32::try_from(bytes.len()).unwrap_or(u32::MAX)
}
