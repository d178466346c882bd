//! Host 侧生成
//!
//! - `{m}.host_api.g.rs`：handler trait，每个 to-host 声明一个方法
//! - `{m}.core_calls.g.rs`：to-core 调用扩展 trait，对所有 `CoreCallSink` 全覆盖实现

use std::fmt;

use super::{signature_text, write_banner, CodeWriter, FnIr, ModuleIr, Side};
use crate::cw_writeln;
use crate::types::TypeMapping;

/// `{m}.host_api.g.rs`
pub fn emit_host_api(ir: &ModuleIr<'_>, runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, ir.name(), Side::Host)?;

    cw_writeln!(w, "/// Handler contract for the Core -> Host calls of `{}`.", ir.name())?;
    w.writeln("///")?;
    w.writeln("/// Span arguments borrow the producing core's memory and are only valid during the call.")?;
    w.block(&format!("pub trait {}", ir.host_api_trait()), |w| {
        for (index, f) in ir.host_fns.iter().enumerate() {
            if index > 0 {
                w.blank_line()?;
            }
            cw_writeln!(w, "/// `{}`", signature_text(f.decl))?;
            cw_writeln!(w, "fn {}(&mut self{});", f.method_name(), host_params(f, runtime))?;
        }
        Ok(())
    })?;

    Ok(w.finish())
}

fn host_params(f: &FnIr<'_>, runtime: &str) -> String {
    f.layout
        .fields()
        .map(|(name, mapping)| format!(", {name}: {}", mapping.host_param_type(runtime)))
        .collect()
}

/// `{m}.core_calls.g.rs`
pub fn emit_core_calls(ir: &ModuleIr<'_>, runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, ir.name(), Side::Host)?;

    let trait_name = ir.core_calls_trait();
    cw_writeln!(w, "/// Host -> Core calls of `{}`.", ir.name())?;
    w.writeln("///")?;
    w.writeln("/// Calls are queued and delivered in order at the start of the core's next tick.")?;
    w.block(&format!("pub trait {trait_name}"), |w| {
        for (index, f) in ir.core_fns.iter().enumerate() {
            if index > 0 {
                w.blank_line()?;
            }
            cw_writeln!(w, "/// `{}`", signature_text(f.decl))?;
            cw_writeln!(w, "fn {}(&mut self{});", f.method_name(), value_params(f, runtime))?;
        }
        Ok(())
    })?;
    w.blank_line()?;

    w.block(
        &format!("impl<S: {runtime}::runtime::CoreCallSink + ?Sized> {trait_name} for S"),
        |w| {
            for (index, f) in ir.core_fns.iter().enumerate() {
                if index > 0 {
                    w.blank_line()?;
                }
                w.writeln("#[inline]")?;
                w.block(
                    &format!("fn {}(&mut self{})", f.method_name(), value_params(f, runtime)),
                    |w| {
                        emit_fill_payload(w, f, runtime, |name, _| name.to_string())?;
                        cw_writeln!(
                            w,
                            "{runtime}::runtime::CoreCallSink::push_call_core(self, {}::{}, {runtime}::bytemuck::bytes_of(&a));",
                            f.id_module(),
                            f.const_name()
                        )
                    },
                )?;
            }
            Ok(())
        },
    )?;

    Ok(w.finish())
}

/// 参数按 payload 字段类型以值传递
pub(crate) fn value_params(f: &FnIr<'_>, runtime: &str) -> String {
    f.layout
        .fields()
        .map(|(name, mapping)| format!(", {name}: {}", mapping.field_type(runtime)))
        .collect()
}

/// `let mut a = zeroed(); a.x = ...;`，`assign` 生成每个字段的右值
pub(crate) fn emit_fill_payload<F>(
    w: &mut CodeWriter,
    f: &FnIr<'_>,
    runtime: &str,
    mut assign: F,
) -> fmt::Result
where
    F: FnMut(&str, &TypeMapping) -> String,
{
    let struct_name = f.struct_name();
    let mut fields = f.layout.fields().peekable();
    if fields.peek().is_none() {
        return cw_writeln!(
            w,
            "let a: {struct_name} = {runtime}::bytemuck::Zeroable::zeroed();"
        );
    }
    cw_writeln!(
        w,
        "let mut a: {struct_name} = {runtime}::bytemuck::Zeroable::zeroed();"
    )?;
    for (name, mapping) in fields {
        cw_writeln!(w, "a.{name} = {};", assign(name, mapping))?;
    }
    Ok(())
}
