//! Core 侧生成
//!
//! - `{m}.host_calls.g.rs`：每个 to-host 声明一个调用 stub，写入 command stream
//! - `{m}.core_api.g.rs`：to-core handler trait

use std::fmt;

use super::host_side::{emit_fill_payload, value_params};
use super::{signature_text, write_banner, CodeWriter, FnIr, ModuleIr, Side};
use crate::cw_writeln;

/// `{m}.host_calls.g.rs`
pub fn emit_host_calls(ir: &ModuleIr<'_>, runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, ir.name(), Side::Core)?;

    for (index, f) in ir.host_fns.iter().enumerate() {
        if index > 0 {
            w.blank_line()?;
        }
        emit_stub(&mut w, ir, f, runtime)?;
    }

    Ok(w.finish())
}

fn emit_stub(w: &mut CodeWriter, ir: &ModuleIr<'_>, f: &FnIr<'_>, runtime: &str) -> fmt::Result {
    let params: String = f
        .layout
        .fields()
        .map(|(name, mapping)| format!(", {name}: {}", mapping.core_param_type(runtime)))
        .collect();
    let has_span = f.layout.fields().any(|(_, mapping)| mapping.is_span());

    cw_writeln!(w, "/// Core -> Host: `{}.{}`", ir.name(), signature_text(f.decl))?;
    if has_span {
        w.writeln("///")?;
        w.writeln("/// Text arguments are copied into the context's per-step storage.")?;
    }
    w.writeln("#[inline]")?;
    w.block(
        &format!(
            "pub fn {}(ctx: &mut {runtime}::runtime::CoreContext<'_>{params}) -> {runtime}::wire::WireResult<()>",
            f.method_name()
        ),
        |w| {
            emit_fill_payload(w, f, runtime, |name, mapping| mapping.core_assign_expr(name, "ctx"))?;
            w.writeln("// SAFETY: every StringView in `a` was produced by `ctx.store_utf8` during this step.")?;
            cw_writeln!(
                w,
                "unsafe {{ ctx.call_host({}::{}, {runtime}::bytemuck::bytes_of(&a)) }}",
                f.id_module(),
                f.const_name()
            )
        },
    )
}

/// `{m}.core_api.g.rs`
pub fn emit_core_api(ir: &ModuleIr<'_>, runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, ir.name(), Side::Core)?;

    cw_writeln!(w, "/// Handler contract for the Host -> Core calls of `{}`.", ir.name())?;
    w.block(&format!("pub trait {}", ir.core_api_trait()), |w| {
        for (index, f) in ir.core_fns.iter().enumerate() {
            if index > 0 {
                w.blank_line()?;
            }
            cw_writeln!(w, "/// `{}`", signature_text(f.decl))?;
            cw_writeln!(
                w,
                "fn {}(&mut self, ctx: &mut {runtime}::runtime::CoreContext<'_>{});",
                f.method_name(),
                value_params(f, runtime)
            )?;
        }
        Ok(())
    })?;

    Ok(w.finish())
}
