//! bridgegen: 由 IDL 生成 Core/Host 两侧的绑定代码
//!
//! # Usage
//!
//! ```bash
//! bridgegen --api defs/demo_log_api.def --out-core gen/core --out-host gen/host
//! bridgegen --config bridgegen.toml --clean false
//! ```
//!
//! 命令行参数覆盖环境变量（`BRIDGEGEN_*`），环境变量覆盖配置文件。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use native_bridge::codegen::generator::collect_sources;
use native_bridge::codegen::{GenerateOptions, Generator};
use native_bridge::config::{GeneratorConfig, LoggingConfig, Verbosity};
use native_bridge::GenResult;

#[derive(Parser, Debug)]
#[command(name = "bridgegen")]
#[command(about = "Generates core and host bindings from bridge IDL files")]
struct Args {
    /// Config file (TOML or JSON); defaults to ./bridgegen.toml or ./bridgegen.json
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// IDL file; may be repeated. Without it, every *.def in --defs-dir is used
    #[arg(long = "api", value_name = "FILE")]
    api: Vec<PathBuf>,

    /// Directory scanned for *.def files
    #[arg(long, value_name = "DIR")]
    defs_dir: Option<PathBuf>,

    /// Output root for the core side
    #[arg(long, value_name = "DIR")]
    out_core: Option<PathBuf>,

    /// Output root for the host side
    #[arg(long, value_name = "DIR")]
    out_host: Option<PathBuf>,

    /// Module name override (single input only)
    #[arg(long, value_name = "NAME")]
    module: Option<String>,

    /// Rust module name override (single input only)
    #[arg(long, value_name = "NAME")]
    namespace: Option<String>,

    /// Delete the module's previously generated files first
    #[arg(long, value_name = "BOOL")]
    clean: Option<bool>,

    /// Path of the runtime crate in generated code
    #[arg(long, value_name = "PATH")]
    runtime_crate: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<Verbosity>,
}

impl Args {
    fn apply_to(self, config: &mut GeneratorConfig) {
        if !self.api.is_empty() {
            config.inputs = self.api;
        }
        if let Some(dir) = self.defs_dir {
            config.defs_dir = dir;
        }
        if let Some(dir) = self.out_core {
            config.out_core = dir;
        }
        if let Some(dir) = self.out_host {
            config.out_host = dir;
        }
        if self.module.is_some() {
            config.module = self.module;
        }
        if self.namespace.is_some() {
            config.namespace = self.namespace;
        }
        if let Some(clean) = self.clean {
            config.clean = clean;
        }
        if let Some(path) = self.runtime_crate {
            config.runtime_crate = path;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bridgegen: {e}");
            return ExitCode::from(1);
        }
    };
    initialize_logging(&config.logging);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: "bridgegen", "generation failed: {}", e);
            eprintln!("bridgegen: {e}");
            ExitCode::from(1)
        }
    }
}

fn load_config(args: Args) -> GenResult<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::load_or_default()?,
    };
    config.apply_env_overrides();
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` 优先，否则使用配置的级别
fn initialize_logging(logging: &LoggingConfig) {
    if !logging.log_to_console {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.level.as_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(config: &GeneratorConfig) -> GenResult<()> {
    let sources = collect_sources(&config.inputs, &config.defs_dir)?;
    let generator = Generator::new(GenerateOptions::from(config));
    let (plan, report) = generator.run(&sources)?;

    for module in &plan.modules {
        println!(
            "{}: {} to-host, {} to-core",
            module.name,
            module.model.host_fns.len(),
            module.model.core_fns.len()
        );
    }
    println!(
        "{} written, {} unchanged, {} removed",
        report.written.len(),
        report.unchanged.len(),
        report.removed.len()
    );
    Ok(())
}
