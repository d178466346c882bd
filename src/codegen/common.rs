//! 两侧共用的生成内容：函数 ID 常量与 payload 结构体
//!
//! 两侧的这两个文件内容相同（除横幅外），这正是二进制契约成立的前提。

use std::fmt;

use super::{signature_text, write_banner, CodeWriter, FnIr, ModuleIr, Side};
use crate::cw_writeln;
use crate::ids::Direction;
use crate::types::LayoutItem;

/// `{m}.ids.g.rs`
pub fn emit_ids(ir: &ModuleIr<'_>, side: Side, runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, ir.name(), side)?;

    for direction in [Direction::ToHost, Direction::ToCore] {
        let fns = ir.fns(direction);
        let module = match direction {
            Direction::ToHost => "host_func_id",
            Direction::ToCore => "core_func_id",
        };
        cw_writeln!(w, "/// {} function identifiers of `{}`.", direction_title(direction), ir.name())?;
        w.block(&format!("pub mod {module}"), |w| {
            for f in fns {
                cw_writeln!(w, "/// `{}`", id_input(ir, f))?;
                cw_writeln!(
                    w,
                    "pub const {}: {runtime}::ids::FuncId = {runtime}::ids::FuncId(0x{:08X});",
                    f.const_name(),
                    f.id.raw()
                )?;
            }
            Ok(())
        })?;
        if direction == Direction::ToHost {
            w.blank_line()?;
        }
    }

    Ok(w.finish())
}

/// `{m}.structs.g.rs`
pub fn emit_structs(ir: &ModuleIr<'_>, side: Side, runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, ir.name(), side)?;

    let all = ir.host_fns.iter().chain(&ir.core_fns);
    for (index, f) in all.enumerate() {
        if index > 0 {
            w.blank_line()?;
        }
        emit_struct(&mut w, ir, f, runtime)?;
    }

    Ok(w.finish())
}

fn emit_struct(w: &mut CodeWriter, ir: &ModuleIr<'_>, f: &FnIr<'_>, runtime: &str) -> fmt::Result {
    let name = f.struct_name();
    cw_writeln!(
        w,
        "/// Payload of `{}.{}` ({}).",
        ir.name(),
        signature_text(f.decl),
        f.direction
    )?;
    w.writeln("#[repr(C)]")?;
    w.writeln("#[derive(Debug, Clone, Copy, PartialEq)]")?;
    w.block(&format!("pub struct {name}"), |w| {
        for item in &f.layout.items {
            match item {
                LayoutItem::Field { name, mapping, .. } => {
                    cw_writeln!(w, "pub {name}: {},", mapping.field_type(runtime))?;
                }
                LayoutItem::Pad { name, len, .. } => {
                    cw_writeln!(w, "pub {name}: [u8; {len}],")?;
                }
            }
        }
        Ok(())
    })?;

    // 布局断言
    cw_writeln!(
        w,
        "const _: () = assert!(::core::mem::size_of::<{name}>() == {});",
        f.layout.size
    )?;
    for item in &f.layout.items {
        if let LayoutItem::Field { name: field, offset, .. } = item {
            cw_writeln!(
                w,
                "const _: () = assert!(::core::mem::offset_of!({name}, {field}) == {offset});"
            )?;
        }
    }
    w.writeln("// SAFETY: #[repr(C)], every field is Pod and all padding is explicit.")?;
    cw_writeln!(w, "unsafe impl {runtime}::bytemuck::Zeroable for {name} {{}}")?;
    cw_writeln!(w, "unsafe impl {runtime}::bytemuck::Pod for {name} {{}}")
}

fn id_input(ir: &ModuleIr<'_>, f: &FnIr<'_>) -> String {
    crate::ids::hash_input(f.direction, ir.name(), &f.decl.name)
}

fn direction_title(direction: Direction) -> &'static str {
    match direction {
        Direction::ToHost => "Core -> Host",
        Direction::ToCore => "Host -> Core",
    }
}
