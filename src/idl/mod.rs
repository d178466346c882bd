//! IDL 模块
//!
//! 把 `.def` 文本解析为 [`ApiModel`]，并负责模块命名规则。

pub mod model;
pub mod naming;
pub mod parser;

pub use model::{ApiArg, ApiFn, ApiModel, Module};
pub use parser::{direction_for_tag, parse, split_top_level, COMMENT_MARKER};
