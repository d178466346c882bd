//! 类型映射表
//!
//! IDL 类型记号 -> 二进制表示。两侧生成的 payload 结构体都由这张表
//! 决定字段类型、大小与对齐，因此布局逐字节一致。

pub mod layout;

pub use layout::{LayoutItem, StructLayout};

use crate::core::error::{TypeMapError, TypeResult};
use crate::idl::ApiFn;
use crate::ids::{qualified_name, Direction};

/// 类型类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 定宽整数 / 浮点
    Scalar,
    /// 由标量组成的定长值类型（向量、四元数、变换）
    Value,
    /// 以 `u32` 为底层表示的枚举
    Enum,
    /// 借用的外部 span，只允许出现在 to-host 方向
    Span,
}

/// 一个类型记号的映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// 规范记号
    pub token: &'static str,
    /// 同样接受的别名（C 风格名称等）
    pub aliases: &'static [&'static str],
    pub kind: TypeKind,
    pub size: usize,
    pub align: usize,
    /// Rust 类型名；非标量位于运行时 crate 的 `abi` 模块中
    pub rust_name: &'static str,
    /// Host handler 以引用接收
    pub by_ref: bool,
}

impl TypeMapping {
    const fn scalar(token: &'static str, aliases: &'static [&'static str], size: usize) -> Self {
        Self {
            token,
            aliases,
            kind: TypeKind::Scalar,
            size,
            align: size,
            rust_name: token,
            by_ref: false,
        }
    }

    const fn abi(
        token: &'static str,
        aliases: &'static [&'static str],
        kind: TypeKind,
        size: usize,
        align: usize,
    ) -> Self {
        Self {
            token,
            aliases,
            kind,
            size,
            align,
            rust_name: token,
            by_ref: false,
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        self.token == token || self.aliases.contains(&token)
    }

    pub fn is_span(&self) -> bool {
        self.kind == TypeKind::Span
    }

    /// payload 结构体中的字段类型
    pub fn field_type(&self, runtime: &str) -> String {
        match self.kind {
            TypeKind::Scalar => self.rust_name.to_string(),
            _ => format!("{runtime}::abi::{}", self.rust_name),
        }
    }

    /// Host handler trait 方法的参数类型
    pub fn host_param_type(&self, runtime: &str) -> String {
        match self.kind {
            TypeKind::Span => format!("{runtime}::wire::ExternalSpan<'_>"),
            _ if self.by_ref => format!("&{}", self.field_type(runtime)),
            _ => self.field_type(runtime),
        }
    }

    /// 分发器里把 payload 字段 `field`（形如 `a.message`）变成 handler 实参
    pub fn host_arg_expr(&self, field: &str, call: &str) -> String {
        match self.kind {
            TypeKind::Span => format!("{call}.span({field})"),
            _ if self.by_ref => format!("&{field}"),
            _ => field.to_string(),
        }
    }

    /// Core 侧 to-host 调用 stub 的参数类型
    pub fn core_param_type(&self, runtime: &str) -> String {
        match self.kind {
            TypeKind::Span => "&str".to_string(),
            _ => self.field_type(runtime),
        }
    }

    /// Core 侧 stub 中把参数 `param` 写入 payload 字段的表达式
    pub fn core_assign_expr(&self, param: &str, ctx: &str) -> String {
        match self.kind {
            TypeKind::Span => format!("{ctx}.store_utf8({param})"),
            _ => param.to_string(),
        }
    }
}

/// 类型映射表
#[derive(Debug, Clone)]
pub struct TypeTable {
    entries: Vec<TypeMapping>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeTable {
    /// 内置映射
    pub fn standard() -> Self {
        let entries = vec![
            TypeMapping::scalar("u8", &["uint8_t"], 1),
            TypeMapping::scalar("i8", &["int8_t"], 1),
            TypeMapping::scalar("u16", &["uint16_t"], 2),
            TypeMapping::scalar("i16", &["int16_t"], 2),
            TypeMapping::scalar("u32", &["uint32_t"], 4),
            TypeMapping::scalar("i32", &["int32_t"], 4),
            TypeMapping::scalar("u64", &["uint64_t"], 8),
            TypeMapping::scalar("i64", &["int64_t"], 8),
            TypeMapping::scalar("f32", &["float"], 4),
            TypeMapping::scalar("f64", &["double"], 8),
            TypeMapping::abi("Vec3", &["BridgeVec3"], TypeKind::Value, 16, 4),
            TypeMapping::abi("Quat", &["BridgeQuat"], TypeKind::Value, 16, 4),
            TypeMapping {
                by_ref: true,
                ..TypeMapping::abi("Transform", &["BridgeTransform"], TypeKind::Value, 48, 4)
            },
            TypeMapping::abi("LogLevel", &["BridgeLogLevel"], TypeKind::Enum, 4, 4),
            TypeMapping::abi("AssetType", &["BridgeAssetType"], TypeKind::Enum, 4, 4),
            TypeMapping::abi("AssetStatus", &["BridgeAssetStatus"], TypeKind::Enum, 4, 4),
            TypeMapping {
                rust_name: "StringView",
                ..TypeMapping::abi(
                    "StringSpan",
                    &["StringView", "BridgeStringView"],
                    TypeKind::Span,
                    16,
                    8,
                )
            },
        ];
        Self { entries }
    }

    pub fn lookup(&self, token: &str) -> Option<&TypeMapping> {
        self.entries.iter().find(|m| m.matches(token))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeMapping> {
        self.entries.iter()
    }

    /// 解析一条声明的全部参数类型
    ///
    /// 未知记号、或 span 出现在 to-core 方向时返回错误。
    pub fn check_fn(
        &self,
        direction: Direction,
        module: &str,
        decl: &ApiFn,
    ) -> TypeResult<Vec<&TypeMapping>> {
        decl.args
            .iter()
            .map(|arg| {
                let mapping = self.lookup(&arg.ty).ok_or_else(|| TypeMapError::UnknownType {
                    qualified: qualified_name(module, &decl.name),
                    arg: arg.name.clone(),
                    ty: arg.ty.clone(),
                })?;
                if mapping.is_span() && direction == Direction::ToCore {
                    return Err(TypeMapError::SpanInCoreDirection {
                        qualified: qualified_name(module, &decl.name),
                        arg: arg.name.clone(),
                    });
                }
                Ok(mapping)
            })
            .collect()
    }
}
