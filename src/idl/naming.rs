//! 命名转换
//!
//! IDL 中函数名使用 PascalCase（`SpawnEntity`），参数名使用 camelCase（`entityId`）；
//! 生成的 Rust 代码使用 snake_case 方法/字段与 SCREAMING_SNAKE_CASE 常量。

use std::path::Path;

/// `SpawnEntity` -> `spawn_entity`，`entityId` -> `entity_id`，`HTTPServer` -> `http_server`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                Some(_) => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `SpawnEntity` -> `SPAWN_ENTITY`
pub fn to_screaming_snake_case(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}

/// `demo_log` -> `DemoLog`
pub fn to_pascal_case(name: &str) -> String {
    name.split(['_', '-', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// 由 IDL 文件路径推导模块名
///
/// 去掉扩展名与 `_api` 后缀，再按 `_`/`-`/`.` 拆分并逐段首字母大写：
/// `demo_log_api.def` -> `DemoLog`。结果为空时返回 `None`。
pub fn module_name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let stem = strip_suffix_ignore_case(stem, "_api").unwrap_or(stem);
    let name = to_pascal_case(stem);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
        Some(&s[..split])
    } else {
        None
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// 关键字以及 `self`/`super`/`crate`/`Self`：不能直接用作模块名
pub fn is_reserved_word(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name) || matches!(name, "self" | "super" | "crate" | "Self")
}

/// 生成 Rust 标识符：关键字加 `r#` 前缀
pub fn rust_ident(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// 字段/参数名：snake_case，避开关键字与生成代码占用的名字
pub fn rust_field_name(name: &str) -> String {
    let snake = to_snake_case(name);
    match snake.as_str() {
        // 无法作为原始标识符
        "self" | "super" | "crate" | "Self" => format!("{snake}_"),
        // 生成代码内部使用的局部变量
        "ctx" | "a" => format!("{snake}_arg"),
        _ => rust_ident(&snake),
    }
}
