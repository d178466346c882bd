//! 生成流程
//!
//! 1. 收集并解析全部 IDL 源
//! 2. 确定模块名；逐模块检查类型、在 [`BuildSession`] 中注册函数 ID、计算布局
//! 3. 在内存中生成两侧的全部文件
//! 4. 前三步全部成功后才写盘：清理过期文件，再逐个原子写入
//!
//! 任何一步失败都不会写出或删除文件。

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::aggregate::{emit_core_aggregate, emit_host_aggregate, CORE_AGGREGATE_FILE, HOST_AGGREGATE_FILE};
use super::common::{emit_ids, emit_structs};
use super::core_side::{emit_core_api, emit_host_calls};
use super::host_side::{emit_core_calls, emit_host_api};
use super::{FnIr, ModuleIr};
use crate::config::GeneratorConfig;
use crate::core::error::{GenError, GenResult};
use crate::idl::naming::{is_identifier, is_reserved_word, module_name_from_path, to_snake_case};
use crate::idl::{parse, ApiModel, Module};
use crate::ids::{qualified_name, BuildSession, Direction};
use crate::types::{StructLayout, TypeTable};

/// IDL 文件扩展名
pub const IDL_EXTENSION: &str = "def";

/// 生成目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Core,
    Host,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Core => f.write_str("core"),
            Side::Host => f.write_str("host"),
        }
    }
}

/// 一个 IDL 源单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlSource {
    /// 文件路径或名称，用于推导模块名与报错
    pub name: String,
    pub text: String,
}

impl IdlSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn from_file(path: &Path) -> GenResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| GenError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// 收集 IDL 源：显式列表优先，否则扫描 `defs_dir` 下的 `*.def`（按文件名不区分大小写排序）
pub fn collect_sources(inputs: &[PathBuf], defs_dir: &Path) -> GenResult<Vec<IdlSource>> {
    if !inputs.is_empty() {
        return inputs.iter().map(|path| IdlSource::from_file(path)).collect();
    }

    let entries = fs::read_dir(defs_dir).map_err(|source| GenError::Read {
        path: defs_dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(IDL_EXTENSION))
        })
        .collect();
    if paths.is_empty() {
        return Err(GenError::NoInput(defs_dir.to_path_buf()));
    }
    paths.sort_by_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    paths.iter().map(|path| IdlSource::from_file(path)).collect()
}

/// 生成选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub out_core: PathBuf,
    pub out_host: PathBuf,
    /// 生成代码中引用运行时 crate 的路径
    pub runtime_crate: String,
    pub clean: bool,
    /// 覆盖模块名（仅限单个输入）
    pub module: Option<String>,
    /// 覆盖生成的 Rust 模块名（仅限单个输入）
    pub namespace: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for GenerateOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            out_core: config.out_core.clone(),
            out_host: config.out_host.clone(),
            runtime_crate: config.runtime_crate.clone(),
            clean: config.clean,
            module: config.module.clone(),
            namespace: config.namespace.clone(),
        }
    }
}

/// 一个生成的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub side: Side,
    pub file_name: String,
    pub contents: String,
}

/// 步骤 1-3 的结果（尚未写盘）
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    /// 去重后的模块，按处理顺序
    pub modules: Vec<Module>,
    pub files: Vec<GeneratedFile>,
    pub session: BuildSession,
}

impl GenerationPlan {
    pub fn file(&self, side: Side, file_name: &str) -> Option<&GeneratedFile> {
        self.files
            .iter()
            .find(|f| f.side == side && f.file_name == file_name)
    }
}

/// 步骤 4 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// 新写入或内容有变化的文件
    pub written: Vec<PathBuf>,
    /// 内容未变、未触碰的文件
    pub unchanged: Vec<PathBuf>,
    /// 清理模式下删除的过期文件
    pub removed: Vec<PathBuf>,
}

/// IDL 生成器
#[derive(Debug, Clone)]
pub struct Generator {
    options: GenerateOptions,
    types: TypeTable,
}

impl Generator {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            types: TypeTable::standard(),
        }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// 解析、检查并在内存中生成全部文件
    pub fn plan(&self, sources: &[IdlSource]) -> GenResult<GenerationPlan> {
        let has_override = self.options.module.is_some() || self.options.namespace.is_some();
        if has_override && sources.len() != 1 {
            return Err(GenError::OverrideRequiresSingleSource(sources.len()));
        }

        let modules = self.resolve_modules(sources)?;

        let mut session = BuildSession::new();
        let mut irs = Vec::with_capacity(modules.len());
        for module in &modules {
            irs.push(self.check_module(module, &mut session)?);
        }

        let files = self.emit(&irs)?;

        tracing::info!(
            target: "bridgegen",
            "planned {} modules ({} to-host, {} to-core functions), {} files",
            modules.len(),
            session.registry(Direction::ToHost).len(),
            session.registry(Direction::ToCore).len(),
            files.len()
        );

        Ok(GenerationPlan {
            modules,
            files,
            session,
        })
    }

    /// 步骤 1-2 前半：解析并命名模块
    fn resolve_modules(&self, sources: &[IdlSource]) -> GenResult<Vec<Module>> {
        let mut modules: Vec<Module> = Vec::with_capacity(sources.len());

        for source in sources {
            let model = parse(&source.text).map_err(|e| e.with_source(source.name.clone()))?;

            let name = match &self.options.module {
                Some(name) => name.clone(),
                None => module_name_from_path(Path::new(&source.name)).ok_or_else(|| {
                    GenError::InvalidModule {
                        source_name: source.name.clone(),
                        reason: "file name yields an empty module name".to_string(),
                    }
                })?,
            };
            if !is_identifier(&name) {
                return Err(GenError::InvalidModule {
                    source_name: source.name.clone(),
                    reason: format!("`{name}` is not a valid identifier"),
                });
            }
            let namespace = match &self.options.namespace {
                Some(namespace) => namespace.clone(),
                None => to_snake_case(&name),
            };
            if !is_identifier(&namespace) {
                return Err(GenError::InvalidModule {
                    source_name: source.name.clone(),
                    reason: format!("namespace `{namespace}` is not a valid identifier"),
                });
            }
            if is_reserved_word(&namespace) {
                return Err(GenError::InvalidModule {
                    source_name: source.name.clone(),
                    reason: format!("namespace `{namespace}` is a Rust keyword"),
                });
            }

            check_conflicts(&name, &model)?;

            if let Some(existing) = modules.iter().find(|m| m.name == name) {
                if existing.model.same_declarations(&model) {
                    tracing::debug!(target: "bridgegen", "module {} seen again in {}, skipped", name, source.name);
                    continue;
                }
                return Err(GenError::DuplicateModule { module: name });
            }
            if let Some(existing) = modules.iter().find(|m| m.namespace == namespace) {
                return Err(GenError::InvalidModule {
                    source_name: source.name.clone(),
                    reason: format!("namespace `{namespace}` is already used by module {}", existing.name),
                });
            }

            tracing::debug!(
                target: "bridgegen",
                "parsed {} as module {} ({} to-host, {} to-core)",
                source.name,
                name,
                model.host_fns.len(),
                model.core_fns.len()
            );
            modules.push(Module {
                name,
                namespace,
                model,
            });
        }

        Ok(modules)
    }

    /// 步骤 2 后半：类型检查、注册 ID、计算布局
    fn check_module<'a>(
        &'a self,
        module: &'a Module,
        session: &mut BuildSession,
    ) -> GenResult<ModuleIr<'a>> {
        let mut check = |direction: Direction| -> GenResult<Vec<FnIr<'a>>> {
            module
                .model
                .fns(direction)
                .iter()
                .map(|decl| {
                    let mappings = self.types.check_fn(direction, &module.name, decl)?;
                    let id = session.register(direction, &module.name, &decl.name)?;
                    Ok(FnIr {
                        direction,
                        decl,
                        id,
                        layout: StructLayout::compute(&decl.args, &mappings),
                    })
                })
                .collect()
        };

        let host_fns = check(Direction::ToHost)?;
        let core_fns = check(Direction::ToCore)?;
        check_rust_names(&module.name, &host_fns)?;
        check_rust_names(&module.name, &core_fns)?;
        Ok(ModuleIr {
            module,
            host_fns,
            core_fns,
        })
    }

    /// 步骤 3：生成全部文件
    fn emit(&self, irs: &[ModuleIr<'_>]) -> GenResult<Vec<GeneratedFile>> {
        let runtime = self.options.runtime_crate.as_str();
        let mut files = Vec::with_capacity(irs.len() * 8 + 2);
        let mut push = |side: Side, file_name: String, contents: String| {
            files.push(GeneratedFile {
                side,
                file_name,
                contents,
            });
        };

        for ir in irs {
            push(Side::Host, ir.file_name("ids"), emit_ids(ir, Side::Host, runtime)?);
            push(Side::Host, ir.file_name("structs"), emit_structs(ir, Side::Host, runtime)?);
            push(Side::Host, ir.file_name("host_api"), emit_host_api(ir, runtime)?);
            push(Side::Host, ir.file_name("core_calls"), emit_core_calls(ir, runtime)?);

            push(Side::Core, ir.file_name("ids"), emit_ids(ir, Side::Core, runtime)?);
            push(Side::Core, ir.file_name("structs"), emit_structs(ir, Side::Core, runtime)?);
            push(Side::Core, ir.file_name("host_calls"), emit_host_calls(ir, runtime)?);
            push(Side::Core, ir.file_name("core_api"), emit_core_api(ir, runtime)?);
        }
        push(Side::Host, HOST_AGGREGATE_FILE.to_string(), emit_host_aggregate(irs, runtime)?);
        push(Side::Core, CORE_AGGREGATE_FILE.to_string(), emit_core_aggregate(irs, runtime)?);

        Ok(files)
    }

    fn root(&self, side: Side) -> &Path {
        match side {
            Side::Core => &self.options.out_core,
            Side::Host => &self.options.out_host,
        }
    }

    /// 步骤 4：写盘
    ///
    /// 清理模式下先删除该次运行中各模块不再生成的 `{namespace}.*.g.rs`，
    /// 再写入全部文件；内容未变的文件不触碰，保持修改时间不变。
    pub fn write(&self, plan: &GenerationPlan) -> GenResult<WriteReport> {
        let mut report = WriteReport::default();

        if self.options.clean {
            for side in [Side::Host, Side::Core] {
                let root = self.root(side);
                let keep: HashSet<&str> = plan
                    .files
                    .iter()
                    .filter(|f| f.side == side)
                    .map(|f| f.file_name.as_str())
                    .collect();
                for module in &plan.modules {
                    let removed = clean_module_outputs(root, &module.namespace, &keep)?;
                    report.removed.extend(removed);
                }
            }
        }

        for side in [Side::Host, Side::Core] {
            let root = self.root(side);
            fs::create_dir_all(root).map_err(|source| GenError::Write {
                path: root.to_path_buf(),
                source,
            })?;
        }

        for file in &plan.files {
            let path = self.root(file.side).join(&file.file_name);
            if fs::read(&path).is_ok_and(|existing| existing == file.contents.as_bytes()) {
                report.unchanged.push(path);
                continue;
            }
            write_atomic(&path, file.contents.as_bytes())?;
            report.written.push(path);
        }

        tracing::info!(
            target: "bridgegen",
            "wrote {} files ({} unchanged, {} removed)",
            report.written.len(),
            report.unchanged.len(),
            report.removed.len()
        );
        Ok(report)
    }

    /// 完整流程
    pub fn run(&self, sources: &[IdlSource]) -> GenResult<(GenerationPlan, WriteReport)> {
        let plan = self.plan(sources)?;
        let report = self.write(&plan)?;
        Ok((plan, report))
    }
}

/// 同名同方向的声明必须完全一致
fn check_conflicts(module: &str, model: &ApiModel) -> GenResult<()> {
    for direction in [Direction::ToHost, Direction::ToCore] {
        let fns = model.fns(direction);
        for (i, first) in fns.iter().enumerate() {
            if let Some(second) = fns[i + 1..].iter().find(|f| f.name == first.name) {
                return Err(GenError::ConflictingDeclaration {
                    qualified: qualified_name(module, &first.name),
                    first_line: first.line,
                    second_line: second.line,
                });
            }
        }
    }
    Ok(())
}

/// 同一方向内生成的方法名、ID 常量名，以及同一声明内的字段名必须互不相同
///
/// `_pad` 开头的字段名留给布局生成的填充字段。
fn check_rust_names(module: &str, fns: &[FnIr<'_>]) -> GenResult<()> {
    let clash = |name: &str, reason: String| GenError::NameClash {
        qualified: qualified_name(module, name),
        reason,
    };

    let mut methods: HashMap<String, &str> = HashMap::new();
    let mut consts: HashMap<String, &str> = HashMap::new();
    for f in fns {
        let name = f.decl.name.as_str();
        let method = f.method_name();
        if let Some(first) = methods.insert(method.clone(), name) {
            return Err(clash(name, format!("generates method `{method}`, already used by `{first}`")));
        }
        let constant = f.const_name();
        if let Some(first) = consts.insert(constant.clone(), name) {
            return Err(clash(name, format!("generates id constant `{constant}`, already used by `{first}`")));
        }

        let mut fields = HashSet::new();
        for (field, _) in f.layout.fields() {
            if field.starts_with("_pad") {
                return Err(clash(name, format!("argument field `{field}` is reserved for padding")));
            }
            if !fields.insert(field) {
                return Err(clash(name, format!("two arguments generate the field `{field}`")));
            }
        }
    }
    Ok(())
}

/// 删除 `dir` 下模块 `namespace` 生成的 `{namespace}.{kind}.g.rs`（`keep` 中的除外）
///
/// 目录不存在时什么也不做。其他模块的文件不受影响。
pub fn clean_module_outputs(
    dir: &Path,
    namespace: &str,
    keep: &HashSet<&str>,
) -> GenResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(GenError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut removed = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !is_module_output(file_name, namespace) || keep.contains(file_name) {
            continue;
        }
        let path = entry.path();
        fs::remove_file(&path).map_err(|source| GenError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(target: "bridgegen", "removed stale {}", path.display());
        removed.push(path);
    }
    removed.sort();
    Ok(removed)
}

/// `{namespace}.{kind}.g.rs`，`kind` 非空且不含 `.`
fn is_module_output(file_name: &str, namespace: &str) -> bool {
    file_name
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".g.rs"))
        .is_some_and(|kind| !kind.is_empty() && !kind.contains('.'))
}

/// 写入同目录的临时文件后原子替换
fn write_atomic(path: &Path, contents: &[u8]) -> GenResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source: std::io::Error| GenError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
