//! 构建时运行 bridgegen，把 `defs/*.def` 生成到 `OUT_DIR/core` 与 `OUT_DIR/host`

use std::env;
use std::path::PathBuf;

use native_bridge::codegen::generator::collect_sources;
use native_bridge::codegen::{GenerateOptions, Generator};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let defs = manifest_dir.join("defs");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", defs.display());

    let sources = collect_sources(&[], &defs).unwrap_or_else(|e| panic!("bridgegen: {e}"));
    for source in &sources {
        println!("cargo:rerun-if-changed={}", source.name);
    }

    let options = GenerateOptions {
        out_core: out_dir.join("core"),
        out_host: out_dir.join("host"),
        runtime_crate: "::native_bridge".to_string(),
        clean: true,
        module: None,
        namespace: None,
    };
    if let Err(e) = Generator::new(options).run(&sources) {
        panic!("bridgegen: {e}");
    }
}
