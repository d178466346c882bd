//! 代码生成
//!
//! - `code_writer` - 带缩进的文本写入器
//! - `common` - 两侧共用的 ID 常量与 payload 结构体
//! - `host_side` - Host 侧 handler trait 与 to-core 调用扩展
//! - `core_side` - Core 侧 to-host 调用 stub 与 to-core handler trait
//! - `aggregate` - 全部模块的聚合文件（联合 trait + 分发函数）
//! - `generator` - 解析 → 检查 → 生成 → 写出 的完整流程
//!
//! 生成过程纯机械：输入相同则输出逐字节相同。

pub mod aggregate;
pub mod code_writer;
pub mod common;
pub mod core_side;
pub mod generator;
pub mod host_side;

pub use code_writer::CodeWriter;
pub use generator::{
    clean_module_outputs, GenerateOptions, GeneratedFile, GenerationPlan, Generator, IdlSource,
    Side, WriteReport,
};

use crate::idl::naming::{rust_field_name, to_screaming_snake_case};
use crate::idl::{ApiFn, Module};
use crate::ids::{Direction, FuncId};
use crate::types::StructLayout;

/// 一条已检查的声明
#[derive(Debug, Clone)]
pub struct FnIr<'a> {
    pub direction: Direction,
    pub decl: &'a ApiFn,
    pub id: FuncId,
    pub layout: StructLayout<'a>,
}

impl FnIr<'_> {
    /// payload 结构体名：`HostArgsSpawnEntity` / `CoreArgsAssetLoaded`
    pub fn struct_name(&self) -> String {
        match self.direction {
            Direction::ToHost => format!("HostArgs{}", self.decl.name),
            Direction::ToCore => format!("CoreArgs{}", self.decl.name),
        }
    }

    /// ID 常量名：`SPAWN_ENTITY`
    pub fn const_name(&self) -> String {
        to_screaming_snake_case(&self.decl.name)
    }

    /// 方法 / 函数名：`spawn_entity`
    pub fn method_name(&self) -> String {
        rust_field_name(&self.decl.name)
    }

    /// ID 常量所在的模块
    pub fn id_module(&self) -> &'static str {
        match self.direction {
            Direction::ToHost => "host_func_id",
            Direction::ToCore => "core_func_id",
        }
    }
}

/// 一个已检查模块的生成输入
#[derive(Debug, Clone)]
pub struct ModuleIr<'a> {
    pub module: &'a Module,
    pub host_fns: Vec<FnIr<'a>>,
    pub core_fns: Vec<FnIr<'a>>,
}

impl ModuleIr<'_> {
    pub fn name(&self) -> &str {
        &self.module.name
    }

    pub fn namespace(&self) -> &str {
        &self.module.namespace
    }

    pub fn fns(&self, direction: Direction) -> &[FnIr<'_>] {
        match direction {
            Direction::ToHost => &self.host_fns,
            Direction::ToCore => &self.core_fns,
        }
    }

    pub fn host_api_trait(&self) -> String {
        format!("{}HostApi", self.module.name)
    }

    pub fn core_calls_trait(&self) -> String {
        format!("{}CoreCalls", self.module.name)
    }

    pub fn core_api_trait(&self) -> String {
        format!("{}CoreApi", self.module.name)
    }

    /// 生成文件名：`{namespace}.{kind}.g.rs`
    pub fn file_name(&self, kind: &str) -> String {
        format!("{}.{kind}.g.rs", self.module.namespace)
    }
}

/// 每个生成文件的开头
pub(crate) fn write_banner(w: &mut CodeWriter, module: &str, side: Side) -> std::fmt::Result {
    w.writeln("// <auto-generated>")?;
    crate::cw_writeln!(w, "//   bridgegen: {module} ({side} side). Do not edit; regenerate instead.")?;
    w.writeln("// </auto-generated>")?;
    w.blank_line()
}

/// 声明签名的可读形式，用于生成代码中的文档
pub(crate) fn signature_text(decl: &ApiFn) -> String {
    let args: Vec<String> = decl
        .args
        .iter()
        .map(|arg| format!("{} {}", arg.ty, arg.name))
        .collect();
    if args.is_empty() {
        decl.name.clone()
    } else {
        format!("{}({})", decl.name, args.join(", "))
    }
}
