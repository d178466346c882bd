//! 跨边界值类型
//!
//! 这些类型在 Core 与 Host 两侧逐字节一致：`#[repr(C)]`、无隐式填充、
//! 全部实现 `bytemuck::Pod`，因此可以直接从 command stream 的字节中按位读取。

use bytemuck::{Pod, Zeroable};

use crate::abi_enum;

/// 借用的外部字符串（指针 + 长度）
///
/// `ptr` 以 64 位存储，保证在 32/64 位目标上布局相同。
/// 只在提供它的那一次调用期间有效。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct StringView {
    pub ptr: u64,
    pub len: u32,
    pub reserved0: u32,
}

impl StringView {
    pub const EMPTY: StringView = StringView {
        ptr: 0,
        len: 0,
        reserved0: 0,
    };

    /// 只看长度；空指针配非零长度不算空，读取时另行拒绝
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub reserved0: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            reserved0: 0.0,
        }
    }
}

impl From<glam::Vec3> for Vec3 {
    fn from(v: glam::Vec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for glam::Vec3 {
    fn from(v: Vec3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<glam::Quat> for Quat {
    fn from(q: glam::Quat) -> Self {
        Quat {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl From<Quat> for glam::Quat {
    fn from(q: Quat) -> Self {
        glam::Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

/// 位置 / 旋转 / 缩放
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(position: glam::Vec3) -> Self {
        Self {
            position: position.into(),
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

abi_enum! {
    /// 日志级别
    pub struct LogLevel {
        DEBUG = 0,
        INFO = 1,
        WARN = 2,
        ERROR = 3,
    }
}

abi_enum! {
    pub struct AssetType {
        UNKNOWN = 0,
        PREFAB = 1,
    }
}

abi_enum! {
    pub struct AssetStatus {
        OK = 0,
        NOT_FOUND = 1,
        ERROR = 2,
    }
}

abi_enum! {
    /// Core 运行模式
    pub struct BridgeMode {
        GAME = 0,
        ROBOT = 1,
    }
}

/// 创建 Core 实例时传入的配置
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CoreConfig {
    pub seed: u64,
    /// [`BridgeMode`] 的原始值
    pub mode: u32,
    pub reserved0: u32,
}

impl CoreConfig {
    pub fn mode(&self) -> BridgeMode {
        BridgeMode::from_raw(self.mode)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BridgeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// 当前 ABI 版本
pub const BRIDGE_VERSION: BridgeVersion = BridgeVersion {
    major: 0,
    minor: 2,
    patch: 0,
};

/// C ABI 函数的返回码
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeResult {
    Ok = 0,
    Error = 1,
    InvalidArgument = 2,
}

const _: () = assert!(std::mem::size_of::<StringView>() == 16);
const _: () = assert!(std::mem::align_of::<StringView>() == 8);
const _: () = assert!(std::mem::size_of::<Vec3>() == 16);
const _: () = assert!(std::mem::size_of::<Quat>() == 16);
const _: () = assert!(std::mem::size_of::<Transform>() == 48);
const _: () = assert!(std::mem::align_of::<Transform>() == 4);
const _: () = assert!(std::mem::size_of::<CoreConfig>() == 16);
