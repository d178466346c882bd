//! 聚合文件
//!
//! 所有模块的 to-host 函数 ID 共享一个 `match` 空间，因此分发函数只能在
//! 见过整次运行的全部模块之后生成。Handler 以泛型参数接收，联合 trait
//! 对任何实现了全部模块 trait 的类型自动成立，不依赖虚分派。

use std::fmt;

use super::{write_banner, CodeWriter, FnIr, ModuleIr, Side};
use crate::cw_writeln;

/// Host 侧聚合文件名
pub const HOST_AGGREGATE_FILE: &str = "bridge_all.g.rs";
/// Core 侧聚合文件名
pub const CORE_AGGREGATE_FILE: &str = "bridge_core_all.g.rs";

const HOST_MODULE_FILES: &[&str] = &["ids", "structs", "host_api", "core_calls"];
const CORE_MODULE_FILES: &[&str] = &["ids", "structs", "host_calls", "core_api"];

/// `bridge_all.g.rs`
pub fn emit_host_aggregate(modules: &[ModuleIr<'_>], runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, "all modules", Side::Host)?;
    emit_module_wrappers(&mut w, modules, HOST_MODULE_FILES)?;

    let bounds = trait_bounds(modules, |ir| ir.host_api_trait());
    emit_union_trait(
        &mut w,
        "BridgeAllHostApi",
        "Every module's host handler contract; implemented automatically.",
        &bounds,
    )?;
    w.blank_line()?;

    // 检查版
    w.writeln("/// Decodes `stream` and invokes `host` for every recognised call, in stream order.")?;
    w.writeln("///")?;
    w.writeln("/// Frames with an unknown type or function id, or a payload shorter than the")?;
    w.writeln("/// registered struct, are skipped. A truncated tail stops decoding.")?;
    w.block(
        &format!(
            "pub fn dispatch<H: BridgeAllHostApi + ?Sized>(stream: {runtime}::wire::CommandStream<'_>, host: &mut H) -> {runtime}::wire::DecodeStats"
        ),
        |w| {
            w.block_with_end(
                &format!("{runtime}::wire::decode_checked(stream, |call| match call.func_id().raw()"),
                "})",
                |w| {
                    for ir in modules {
                        for f in &ir.host_fns {
                            cw_writeln!(w, "// {}.{}", ir.name(), f.decl.name)?;
                            w.block_with_end(
                                &format!(
                                    "0x{:08X} => match call.args::<{}::{}>()",
                                    f.id.raw(),
                                    ir.namespace(),
                                    f.struct_name()
                                ),
                                "},",
                                |w| {
                                    w.block("Some(a) =>", |w| {
                                        emit_host_invoke(w, ir, f)?;
                                        w.writeln("true")
                                    })?;
                                    w.writeln("None => false,")
                                },
                            )?;
                        }
                    }
                    w.writeln("_ => false,")
                },
            )
        },
    )?;
    w.blank_line()?;

    // 不检查版
    w.writeln("/// Same as [`dispatch`] without the bounds and payload length checks.")?;
    w.writeln("/// Returns the number of frames visited.")?;
    w.writeln("///")?;
    w.writeln("/// # Safety")?;
    w.writeln("///")?;
    w.writeln("/// `stream` must be well formed: every frame's `size` fits in the remaining bytes and")?;
    w.writeln("/// every call payload is at least as long as the struct registered for its id. This")?;
    w.writeln("/// holds for a stream taken from a core in this process before its next tick.")?;
    w.writeln("#[allow(unused_unsafe)]")?;
    w.block(
        &format!(
            "pub unsafe fn dispatch_unchecked<H: BridgeAllHostApi + ?Sized>(stream: {runtime}::wire::CommandStream<'_>, host: &mut H) -> usize"
        ),
        |w| {
            if modules.iter().all(|ir| ir.host_fns.is_empty()) {
                w.writeln("let _ = host;")?;
            }
            w.writeln("// SAFETY: forwarded to the caller.")?;
            w.block_with_end(
                &format!(
                    "unsafe {{ {runtime}::wire::decode_unchecked(stream, |call| match call.func_id().raw()"
                ),
                "}) }",
                |w| {
                    for ir in modules {
                        for f in &ir.host_fns {
                            cw_writeln!(w, "// {}.{}", ir.name(), f.decl.name)?;
                            w.block_with_end(&format!("0x{:08X} =>", f.id.raw()), "}", |w| {
                                cw_writeln!(
                                    w,
                                    "let a = unsafe {{ call.args_unchecked::<{}::{}>() }};",
                                    ir.namespace(),
                                    f.struct_name()
                                )?;
                                emit_host_invoke(w, ir, f)
                            })?;
                        }
                    }
                    w.writeln("_ => {}")
                },
            )
        },
    )?;

    Ok(w.finish())
}

/// `module::Trait::method(&mut *host, a.x, call.span(a.y), &a.z);`
fn emit_host_invoke(w: &mut CodeWriter, ir: &ModuleIr<'_>, f: &FnIr<'_>) -> fmt::Result {
    let args: String = f
        .layout
        .fields()
        .map(|(name, mapping)| format!(", {}", mapping.host_arg_expr(&format!("a.{name}"), "call")))
        .collect();
    cw_writeln!(
        w,
        "{}::{}::{}(&mut *host{args});",
        ir.namespace(),
        ir.host_api_trait(),
        f.method_name()
    )
}

/// `bridge_core_all.g.rs`
pub fn emit_core_aggregate(modules: &[ModuleIr<'_>], runtime: &str) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    write_banner(&mut w, "all modules", Side::Core)?;
    emit_module_wrappers(&mut w, modules, CORE_MODULE_FILES)?;

    let bounds = trait_bounds(modules, |ir| ir.core_api_trait());
    emit_union_trait(
        &mut w,
        "BridgeAllCoreApi",
        "Every module's core handler contract; implemented automatically.",
        &bounds,
    )?;
    w.blank_line()?;

    w.writeln("/// Decodes one queued Host -> Core call and invokes `app`.")?;
    w.writeln("///")?;
    w.writeln("/// Returns `false` for an unknown function id or a payload shorter than its struct.")?;
    w.block(
        &format!(
            "pub fn dispatch_core_call<A: BridgeAllCoreApi + ?Sized>(app: &mut A, ctx: &mut {runtime}::runtime::CoreContext<'_>, func_id: {runtime}::ids::FuncId, payload: &[u8]) -> bool"
        ),
        |w| {
            if modules.iter().all(|ir| ir.core_fns.is_empty()) {
                w.writeln("let _ = (app, ctx, payload);")?;
            }
            w.block("match func_id.raw()", |w| {
                for ir in modules {
                    for f in &ir.core_fns {
                        cw_writeln!(w, "// {}.{}", ir.name(), f.decl.name)?;
                        w.block_with_end(
                            &format!(
                                "0x{:08X} => match {runtime}::wire::read_args::<{}::{}>(payload)",
                                f.id.raw(),
                                ir.namespace(),
                                f.struct_name()
                            ),
                            "},",
                            |w| {
                                w.block("Some(a) =>", |w| {
                                    let args: String = f
                                        .layout
                                        .fields()
                                        .map(|(name, _)| format!(", a.{name}"))
                                        .collect();
                                    cw_writeln!(
                                        w,
                                        "{}::{}::{}(&mut *app, &mut *ctx{args});",
                                        ir.namespace(),
                                        ir.core_api_trait(),
                                        f.method_name()
                                    )?;
                                    w.writeln("true")
                                })?;
                                w.writeln("None => false,")
                            },
                        )?;
                    }
                }
                w.writeln("_ => false,")
            })
        },
    )?;

    Ok(w.finish())
}

fn emit_module_wrappers(w: &mut CodeWriter, modules: &[ModuleIr<'_>], kinds: &[&str]) -> fmt::Result {
    for ir in modules {
        cw_writeln!(w, "/// Module `{}`.", ir.name())?;
        w.writeln("#[allow(dead_code, clippy::all)]")?;
        w.block(&format!("pub mod {}", ir.namespace()), |w| {
            for kind in kinds {
                cw_writeln!(w, "include!(\"{}\");", ir.file_name(kind))?;
            }
            Ok(())
        })?;
        w.blank_line()?;
    }
    Ok(())
}

fn trait_bounds<F>(modules: &[ModuleIr<'_>], trait_name: F) -> Vec<String>
where
    F: Fn(&ModuleIr<'_>) -> String,
{
    modules
        .iter()
        .map(|ir| format!("{}::{}", ir.namespace(), trait_name(ir)))
        .collect()
}

fn emit_union_trait(w: &mut CodeWriter, name: &str, doc: &str, bounds: &[String]) -> fmt::Result {
    w.doc(doc)?;
    if bounds.is_empty() {
        cw_writeln!(w, "pub trait {name} {{}}")?;
        return cw_writeln!(w, "impl<T: ?Sized> {name} for T {{}}");
    }
    let joined = bounds.join(" + ");
    cw_writeln!(w, "pub trait {name}: {joined} {{}}")?;
    cw_writeln!(w, "impl<T: ?Sized + {joined}> {name} for T {{}}")
}
