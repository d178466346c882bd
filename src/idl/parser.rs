//! IDL 文本解析
//!
//! 每行一条声明：`BRIDGE_HOST_API(Name, Type arg, ...)` 或 `to-core(Name, ...)`。
//! `//` 开头的行是注释，空行跳过，其余任何内容都是语法错误。

use super::model::{ApiArg, ApiFn, ApiModel};
use super::naming::is_identifier;
use crate::core::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ids::Direction;

/// 注释标记
pub const COMMENT_MARKER: &str = "//";

const HOST_TAGS: &[&str] = &["BRIDGE_HOST_API", "to-host"];
const CORE_TAGS: &[&str] = &["BRIDGE_CORE_API", "to-core"];

/// 识别方向标记
pub fn direction_for_tag(tag: &str) -> Option<Direction> {
    if HOST_TAGS.contains(&tag) {
        Some(Direction::ToHost)
    } else if CORE_TAGS.contains(&tag) {
        Some(Direction::ToCore)
    } else {
        None
    }
}

/// 解析一个 IDL 源单元
///
/// 同一方向内完全相同的重复声明只保留第一条；同名但参数不同的声明
/// 原样保留，由生成器报告冲突。
pub fn parse(text: &str) -> ParseResult<ApiModel> {
    let mut model = ApiModel::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let (direction, decl) = parse_line(line, index + 1)?;
        let fns = model.fns_mut(direction);
        if fns.iter().any(|existing| existing.same_signature(&decl)) {
            tracing::debug!(target: "bridgegen", "line {}: duplicate declaration of {} ignored", decl.line, decl.name);
            continue;
        }
        fns.push(decl);
    }

    Ok(model)
}

/// 解析一行声明
fn parse_line(line: &str, line_no: usize) -> ParseResult<(Direction, ApiFn)> {
    let error = |kind| ParseError {
        source_name: None,
        line: line_no,
        text: line.to_string(),
        kind,
    };

    let open = match line.find('(') {
        Some(open) => open,
        None => {
            return Err(error(match direction_for_tag(line) {
                Some(_) => ParseErrorKind::Malformed,
                None => ParseErrorKind::UnknownDirective(first_word(line).to_string()),
            }))
        }
    };

    let tag = line[..open].trim();
    let direction = direction_for_tag(tag)
        .ok_or_else(|| error(ParseErrorKind::UnknownDirective(tag.to_string())))?;

    // 允许行尾的 `;`
    let rest = line[open..].trim_end().trim_end_matches(';').trim_end();
    if !rest.ends_with(')') {
        return Err(error(ParseErrorKind::Malformed));
    }
    let inner = &rest[1..rest.len() - 1];

    let parts = split_top_level(inner).ok_or_else(|| error(ParseErrorKind::UnbalancedParens))?;
    let mut parts = parts.into_iter();

    let name = parts.next().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(error(ParseErrorKind::MissingName));
    }
    if !is_identifier(name) {
        return Err(error(ParseErrorKind::InvalidIdentifier(name.to_string())));
    }

    let mut args = Vec::new();
    for part in parts {
        let part = part.trim();
        // 空参数槽（例如尾随逗号）
        if part.is_empty() {
            continue;
        }
        let arg = split_arg(part).ok_or_else(|| error(ParseErrorKind::InvalidArgument(part.to_string())))?;
        if !is_identifier(&arg.name) {
            return Err(error(ParseErrorKind::InvalidIdentifier(arg.name)));
        }
        args.push(arg);
    }

    Ok((
        direction,
        ApiFn {
            name: name.to_string(),
            args,
            line: line_no,
        },
    ))
}

fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or(line)
}

/// 按顶层逗号拆分
///
/// 只跟踪圆括号深度：`Map<K, V>` 这类带尖括号的类型会在内部逗号处被拆开，
/// 这是当前类型表达式语法的已知限制。括号不配对时返回 `None`。
pub fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(&s[start..]);
    Some(parts)
}

/// 在最后一个空白处拆分为 `类型` 与 `参数名`
fn split_arg(part: &str) -> Option<ApiArg> {
    let split = part.rfind(char::is_whitespace)?;
    let ty = part[..split].trim();
    let name = part[split..].trim();
    if ty.is_empty() || name.is_empty() {
        return None;
    }
    Some(ApiArg {
        ty: ty.to_string(),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_and_core_declarations() {
        let text = "\
// 资源加载
BRIDGE_HOST_API(LoadAsset, u64 requestId, AssetType assetType, StringView assetKey)

BRIDGE_CORE_API(AssetLoaded, u64 requestId, u64 handle, AssetStatus status)
";
        let model = parse(text).unwrap();
        assert_eq!(model.host_fns.len(), 1);
        assert_eq!(model.core_fns.len(), 1);

        let load = &model.host_fns[0];
        assert_eq!(load.name, "LoadAsset");
        assert_eq!(load.line, 2);
        let names: Vec<_> = load.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["requestId", "assetType", "assetKey"]);
        assert_eq!(load.args[2].ty, "StringView");
        assert_eq!(model.core_fns[0].line, 4);
    }

    #[test]
    fn test_parse_short_tags_and_no_args() {
        let model = parse("to-host(Ping)\nto-core(Pong, f32 value);").unwrap();
        assert!(model.host_fns[0].args.is_empty());
        assert_eq!(model.core_fns[0].args[0].ty, "f32");
    }

    #[test]
    fn test_arg_splits_on_last_space() {
        let model = parse("to-host(Set, unsigned int  value)").unwrap();
        let arg = &model.host_fns[0].args[0];
        assert_eq!(arg.ty, "unsigned int");
        assert_eq!(arg.name, "value");
    }

    #[test]
    fn test_nested_parentheses_do_not_split() {
        assert_eq!(split_top_level("A, Fn(u32, u32) cb, u8 x").unwrap().len(), 3);
        assert_eq!(split_top_level("Map<u32, u32> m").unwrap().len(), 2);
        assert!(split_top_level("a, (b").is_none());
        assert!(split_top_level("a) , b").is_none());
    }

    #[test]
    fn test_trailing_comma_is_skipped() {
        let model = parse("to-host(Log, u32 level,)").unwrap();
        assert_eq!(model.host_fns[0].args.len(), 1);
    }

    #[test]
    fn test_argument_without_name_is_error() {
        let err = parse("\n\nto-host(Log, level)").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, ParseErrorKind::InvalidArgument("level".to_string()));
    }

    #[test]
    fn test_unknown_directive_is_error() {
        let err = parse("HOST_API(Log, u32 level)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownDirective("HOST_API".to_string()));

        let err = parse("garbage here").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownDirective("garbage".to_string()));
    }

    #[test]
    fn test_malformed_and_invalid_names() {
        assert_eq!(parse("to-host(Log, u32 level").unwrap_err().kind, ParseErrorKind::Malformed);
        assert_eq!(parse("to-host(, u32 level)").unwrap_err().kind, ParseErrorKind::MissingName);
        assert_eq!(
            parse("to-host(9Log)").unwrap_err().kind,
            ParseErrorKind::InvalidIdentifier("9Log".to_string())
        );
        assert_eq!(
            parse("to-host(Log, u32 le-vel)").unwrap_err().kind,
            ParseErrorKind::InvalidIdentifier("le-vel".to_string())
        );
        assert_eq!(
            parse("to-host(Log, Fn(u32 x)").unwrap_err().kind,
            ParseErrorKind::UnbalancedParens
        );
        assert_eq!(
            parse("to-host(Log, Fn(u32 x)))").unwrap_err().kind,
            ParseErrorKind::UnbalancedParens
        );
    }

    #[test]
    fn test_identical_redeclaration_is_deduplicated() {
        let model = parse("to-host(Log, u32 level)\nto-host(Log, u32 level)").unwrap();
        assert_eq!(model.host_fns.len(), 1);

        // 参数不同的同名声明保留，交给生成器报告
        let model = parse("to-host(Log, u32 level)\nto-host(Log, u64 level)").unwrap();
        assert_eq!(model.host_fns.len(), 2);
    }
}
