//! 带缩进跟踪的代码写入器
//!
//! 缩进层级放在 `Rc<Cell<usize>>` 里，缩进守卫与可变写入互不冲突：
//!
//! ```
//! use native_bridge::codegen::CodeWriter;
//! use native_bridge::cw_writeln;
//!
//! let mut w = CodeWriter::new();
//! w.block("pub mod ids", |w| {
//!     cw_writeln!(w, "pub const LOG: u32 = 0x{:08X};", 0xDA3184A2u32)
//! })
//! .unwrap();
//! assert_eq!(w.finish(), "pub mod ids {\n    pub const LOG: u32 = 0xDA3184A2;\n}\n");
//! ```

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

const INDENT: &str = "    ";

pub struct CodeWriter {
    out: String,
    indent_level: Rc<Cell<usize>>,
    at_line_start: bool,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent_level: Rc::new(Cell::new(0)),
            at_line_start: true,
        }
    }

    /// 写入文本（不换行），位于行首时先写缩进
    pub fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }
        if self.at_line_start {
            for _ in 0..self.indent_level.get() {
                self.out.write_str(INDENT)?;
            }
            self.at_line_start = false;
        }
        self.out.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        match args.as_str() {
            Some(text) => self.write(text),
            None => self.write(&args.to_string()),
        }
    }

    pub fn blank_line(&mut self) -> fmt::Result {
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// 缩进守卫：存活期间缩进加一
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// `/// text`，多行文本逐行加前缀
    pub fn doc(&mut self, text: &str) -> fmt::Result {
        for line in text.lines() {
            if line.is_empty() {
                self.writeln("///")?;
            } else {
                self.writeln(&format!("/// {line}"))?;
            }
        }
        Ok(())
    }

    pub fn comment(&mut self, text: &str) -> fmt::Result {
        self.writeln(&format!("// {text}"))
    }

    /// `header {` ... `}`
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.block_with_end(header, "}", body)
    }

    /// 结尾不是单独 `}` 的块，例如 `},` 或 `});`
    pub fn block_with_end<F>(&mut self, header: &str, end: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        if header.is_empty() {
            self.writeln("{")?;
        } else {
            self.writeln(&format!("{header} {{"))?;
        }
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln(end)
    }

    pub fn finish(self) -> String {
        self.out
    }
}

pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.indent_level.set(self.indent_level.get().saturating_sub(1));
    }
}

/// `write!` 到 [`CodeWriter`]
#[macro_export]
macro_rules! cw_write {
    ($w:expr, $($arg:tt)*) => {
        $w.write_fmt(format_args!($($arg)*))
    };
}

/// `writeln!` 到 [`CodeWriter`]
#[macro_export]
macro_rules! cw_writeln {
    ($w:expr, $($arg:tt)*) => {
        $w.write_fmt(format_args!($($arg)*)).and_then(|_| $w.writeln(""))
    };
}
