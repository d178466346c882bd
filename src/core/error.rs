//! 统一错误处理模块
//!
//! 提供生成器与运行时范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **生成期错误** (`GenError` 及其子类型): IDL 语法、类型映射、函数 ID 冲突等。
//!   这些错误全部是致命的：生成中止，不写出任何文件。
//! - **运行期错误** (`WireError`): 仅用于编码侧（写入 command stream）。
//!   解码侧从不报错，异常帧被静默跳过，见 [`crate::wire::DecodeStats`]。

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::ids::{Direction, FuncId};

/// 生成器顶层错误类型
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Type error: {0}")]
    Type(#[from] TypeMapError),

    #[error("{0}")]
    Collision(#[from] CollisionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid module name derived from {source_name}: {reason}")]
    InvalidModule { source_name: String, reason: String },

    #[error("Module `{module}` was declared twice with different contents")]
    DuplicateModule { module: String },

    #[error("`{qualified}` is declared twice with different parameters (lines {first_line} and {second_line})")]
    ConflictingDeclaration {
        qualified: String,
        first_line: usize,
        second_line: usize,
    },

    #[error("`{qualified}`: {reason}")]
    NameClash { qualified: String, reason: String },

    #[error("--module/--namespace overrides require exactly one IDL input, got {0}")]
    OverrideRequiresSingleSource(usize),

    #[error("No IDL input found (looked in {0})")]
    NoInput(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Code emission error: {0}")]
    Emit(#[from] std::fmt::Error),
}

/// IDL 语法错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}line {line}: {kind} in `{text}`", source_prefix(.source_name))]
pub struct ParseError {
    /// 源文件（解析字符串时为空）
    pub source_name: Option<String>,
    /// 行号（从 1 开始）
    pub line: usize,
    /// 出错行原文（已去除首尾空白）
    pub text: String,
    pub kind: ParseErrorKind,
}

fn source_prefix(source_name: &Option<String>) -> String {
    match source_name {
        Some(name) => format!("{name}: "),
        None => String::new(),
    }
}

impl ParseError {
    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unknown directive `{0}`")]
    UnknownDirective(String),

    #[error("declaration must have the form `TAG(Name, Type arg, ...)`")]
    Malformed,

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("missing function name")]
    MissingName,

    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("argument `{0}` must have the form `Type name`")]
    InvalidArgument(String),
}

/// 类型映射错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeMapError {
    #[error("`{qualified}` argument `{arg}` uses type `{ty}` which has no binary mapping")]
    UnknownType {
        qualified: String,
        arg: String,
        ty: String,
    },

    #[error("`{qualified}` argument `{arg}` is a borrowed span; spans are only allowed in to-host declarations")]
    SpanInCoreDirection { qualified: String, arg: String },
}

/// 函数 ID 冲突（同一次生成中两个不同的限定名得到相同的 32 位 ID）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("FuncId collision ({direction}): {id} is used by both `{existing}` and `{incoming}`; rename one of them or split the module")]
pub struct CollisionError {
    pub direction: Direction,
    pub id: FuncId,
    pub existing: String,
    pub incoming: String,
}

/// 编码错误（Core 侧写入 command stream）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Frame of {size} bytes exceeds the 65535 byte limit of CommandHeader.size")]
    FrameTooLarge { size: usize },
}

/// 生成器结果类型别名
pub type GenResult<T> = Result<T, GenError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type TypeResult<T> = Result<T, TypeMapError>;
pub type WireResult<T> = Result<T, WireError>;
