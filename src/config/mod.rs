//! 生成器配置
//!
//! 提供TOML/JSON配置文件、环境变量覆盖和命令行覆盖

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::idl::naming::is_identifier;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 默认配置文件名
pub const CONFIG_FILE_TOML: &str = "bridgegen.toml";
pub const CONFIG_FILE_JSON: &str = "bridgegen.json";

/// 生成器主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 显式指定的IDL文件；为空时扫描 `defs_dir`
    pub inputs: Vec<PathBuf>,

    /// IDL目录（查找 `*.def`）
    pub defs_dir: PathBuf,

    /// Core侧输出目录
    pub out_core: PathBuf,

    /// Host侧输出目录
    pub out_host: PathBuf,

    /// 生成代码中引用运行时crate的路径
    pub runtime_crate: String,

    /// 生成前删除该模块之前生成的文件
    pub clean: bool,

    /// 覆盖模块名（仅限单个输入）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// 覆盖生成的Rust模块名（仅限单个输入）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// 日志配置
    pub logging: LoggingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            defs_dir: PathBuf::from("defs"),
            out_core: PathBuf::from("generated/core"),
            out_host: PathBuf::from("generated/host"),
            runtime_crate: "::native_bridge".to_string(),
            clean: true,
            module: None,
            namespace: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载（`.json` 为JSON，其余按TOML）
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// 用给定的查找函数覆盖配置（`BRIDGEGEN_*` 键）
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BRIDGEGEN_DEFS_DIR") {
            self.defs_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("BRIDGEGEN_OUT_CORE") {
            self.out_core = PathBuf::from(val);
        }
        if let Some(val) = lookup("BRIDGEGEN_OUT_HOST") {
            self.out_host = PathBuf::from(val);
        }
        if let Some(val) = lookup("BRIDGEGEN_RUNTIME_CRATE") {
            self.runtime_crate = val;
        }
        if let Some(val) = lookup("BRIDGEGEN_CLEAN") {
            self.clean = val.parse().unwrap_or(self.clean);
        }

        // 日志配置
        if let Some(val) = lookup("BRIDGEGEN_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.out_core.as_os_str().is_empty() || self.out_host.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "out_core and out_host must not be empty".to_string(),
            ));
        }
        if self.out_core == self.out_host {
            return Err(ConfigError::ValidationError(format!(
                "out_core and out_host must differ (both are {})",
                self.out_core.display()
            )));
        }
        if !is_runtime_path(&self.runtime_crate) {
            return Err(ConfigError::ValidationError(format!(
                "runtime_crate `{}` is not a Rust path",
                self.runtime_crate
            )));
        }
        for (what, value) in [("module", &self.module), ("namespace", &self.namespace)] {
            if let Some(value) = value {
                if !is_identifier(value) {
                    return Err(ConfigError::ValidationError(format!(
                        "{what} `{value}` is not a valid identifier"
                    )));
                }
            }
        }
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./bridgegen.toml
    /// 2. ./bridgegen.json
    /// 3. <用户配置目录>/native_bridge/bridgegen.toml
    /// 4. 使用默认配置
    ///
    /// 存在但无法读取或解析的文件是错误，不会退回默认配置。
    pub fn load_or_default() -> ConfigResult<Self> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_TOML), PathBuf::from(CONFIG_FILE_JSON)];
        candidates.extend(Self::user_config_path());

        match Self::load_first(&candidates)? {
            Some(config) => Ok(config),
            None => {
                tracing::debug!(target: "bridgegen", "Using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// 加载 `candidates` 中第一个存在的文件；都不存在时返回 `None`
    pub fn load_first(candidates: &[PathBuf]) -> ConfigResult<Option<Self>> {
        for path in candidates {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!(target: "bridgegen", "Loaded config from {}", path.display());
                    return Ok(Some(config));
                }
                Err(ConfigError::FileError(e)) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(ConfigError::ParseError(message)) => {
                    return Err(ConfigError::ParseError(format!("{}: {message}", path.display())));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// `<用户配置目录>/native_bridge/bridgegen.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("native_bridge").join(CONFIG_FILE_TOML))
    }
}

/// `::a::b`、`crate`、`native_bridge` 等
fn is_runtime_path(path: &str) -> bool {
    let trimmed = path.strip_prefix("::").unwrap_or(path);
    !trimmed.is_empty() && trimmed.split("::").all(is_identifier)
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: Verbosity,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Verbosity::Info,
            log_to_console: true,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl Verbosity {
    /// `EnvFilter` 指令
    pub fn as_filter(self) -> &'static str {
        match self {
            Verbosity::Trace => "trace",
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warn => "warn",
            Verbosity::Error => "error",
        }
    }
}

impl std::str::FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Verbosity::Trace),
            "debug" => Ok(Verbosity::Debug),
            "info" => Ok(Verbosity::Info),
            "warn" | "warning" => Ok(Verbosity::Warn),
            "error" => Ok(Verbosity::Error),
            other => Err(ConfigError::ParseError(format!("unknown log level `{other}`"))),
        }
    }
}
