//! 生成器端到端测试：解析 → 检查 → 生成 → 写盘

use std::fs;
use std::path::{Path, PathBuf};

use native_bridge::codegen::generator::collect_sources;
use native_bridge::codegen::{GenerateOptions, Generator, IdlSource};
use native_bridge::core::error::TypeMapError;
use native_bridge::ids::{Direction, FuncId};
use native_bridge::GenError;

const DEMO_LOG: &str = "\
// Core -> Host logging
to-host(Log, LogLevel level, StringSpan message)
";

const DEMO_ENTITY: &str = "\
to-host(SpawnEntity, u64 entityId, u64 prefabHandle, Transform transform, u32 flags)
to-host(SetTransform, u64 entityId, u32 mask, Transform transform)
to-host(DestroyEntity, u64 entityId)
";

const DEMO_ASSET: &str = "\
BRIDGE_HOST_API(LoadAsset, u64 requestId, AssetType assetType, StringSpan assetKey)
BRIDGE_CORE_API(AssetLoaded, u64 requestId, u64 handle, AssetStatus status)
";

fn options(root: &Path) -> GenerateOptions {
    GenerateOptions {
        out_core: root.join("core"),
        out_host: root.join("host"),
        ..GenerateOptions::default()
    }
}

fn write_defs(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("demo_log_api.def"), DEMO_LOG)?;
    fs::write(dir.join("demo_entity_api.def"), DEMO_ENTITY)?;
    fs::write(dir.join("Demo_Asset_api.def"), DEMO_ASSET)?;
    Ok(())
}

fn file_names(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[test]
fn test_generates_all_files_for_both_sides() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let defs = tmp.path().join("defs");
    write_defs(&defs)?;

    let sources = collect_sources(&[], &defs)?;
    let generator = Generator::new(options(tmp.path()));
    let (plan, report) = generator.run(&sources)?;

    // 按文件名不区分大小写排序
    let names: Vec<&str> = plan.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["DemoAsset", "DemoEntity", "DemoLog"]);
    assert_eq!(report.written.len(), 3 * 8 + 2);
    assert!(report.removed.is_empty());

    let host = file_names(&tmp.path().join("host"))?;
    assert_eq!(host.len(), 13);
    assert!(host.contains(&"bridge_all.g.rs".to_string()));
    assert!(host.contains(&"demo_entity.core_calls.g.rs".to_string()));
    let core = file_names(&tmp.path().join("core"))?;
    assert_eq!(core.len(), 13);
    assert!(core.contains(&"bridge_core_all.g.rs".to_string()));
    assert!(core.contains(&"demo_asset.host_calls.g.rs".to_string()));

    let ids = fs::read_to_string(tmp.path().join("core/demo_entity.ids.g.rs"))?;
    let spawn = FuncId::compute(Direction::ToHost, "DemoEntity", "SpawnEntity");
    assert_eq!(spawn, FuncId(0xBCAA331D));
    assert!(ids.contains("pub const SPAWN_ENTITY: ::native_bridge::ids::FuncId = ::native_bridge::ids::FuncId(0xBCAA331D);"));

    let structs = fs::read_to_string(tmp.path().join("host/demo_entity.structs.g.rs"))?;
    assert!(structs.contains("const _: () = assert!(::core::mem::size_of::<HostArgsSpawnEntity>() == 72);"));
    assert!(structs.contains("const _: () = assert!(::core::mem::size_of::<HostArgsSetTransform>() == 64);"));

    let all = fs::read_to_string(tmp.path().join("host/bridge_all.g.rs"))?;
    assert!(all.contains("include!(\"demo_asset.host_api.g.rs\");"));
    assert!(all.contains("pub trait BridgeAllHostApi: demo_asset::DemoAssetHostApi + demo_entity::DemoEntityHostApi + demo_log::DemoLogHostApi {}"));
    assert!(all.contains("0xDA3184A2 =>"));
    Ok(())
}

#[test]
fn test_structs_identical_across_sides() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let defs = tmp.path().join("defs");
    write_defs(&defs)?;
    Generator::new(options(tmp.path())).run(&collect_sources(&[], &defs)?)?;

    for kind in ["ids", "structs"] {
        let name = format!("demo_asset.{kind}.g.rs");
        let host = fs::read_to_string(tmp.path().join("host").join(&name))?;
        let core = fs::read_to_string(tmp.path().join("core").join(&name))?;
        // 只有横幅不同
        let strip = |s: &str| s.lines().skip(4).collect::<Vec<_>>().join("\n");
        assert_eq!(strip(&host), strip(&core), "{name}");
    }
    Ok(())
}

#[test]
fn test_nothing_written_on_collision() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let sources = [
        IdlSource::new("demo_log_api.def", DEMO_LOG),
        IdlSource::new("ModHgZO.def", "to-host(Ping)"),
        IdlSource::new("ModpEnA.def", "to-host(Ping)"),
    ];

    let err = Generator::new(options(tmp.path())).run(&sources).unwrap_err();
    match err {
        GenError::Collision(collision) => {
            assert_eq!(collision.id, FuncId(0x6BEE720B));
            assert_eq!(collision.existing, "ModHgZO.Ping");
            assert_eq!(collision.incoming, "ModpEnA.Ping");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!tmp.path().join("host").exists());
    assert!(!tmp.path().join("core").exists());
    Ok(())
}

#[test]
fn test_span_in_core_direction_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let sources = [IdlSource::new(
        "demo_asset_api.def",
        "to-core(AssetLoaded, u64 requestId, StringSpan assetKey)",
    )];

    let err = Generator::new(options(tmp.path())).run(&sources).unwrap_err();
    assert!(matches!(
        err,
        GenError::Type(TypeMapError::SpanInCoreDirection { ref qualified, ref arg })
            if qualified == "DemoAsset.AssetLoaded" && arg == "assetKey"
    ));
    assert!(!tmp.path().join("core").exists());
    Ok(())
}

#[test]
fn test_unknown_type_rejected() {
    let sources = [IdlSource::new("demo.def", "to-host(Move, Vector3 delta)")];
    let err = Generator::new(GenerateOptions::default()).plan(&sources).unwrap_err();
    assert!(err.to_string().contains("Demo.Move"));
    assert!(err.to_string().contains("Vector3"));
}

#[test]
fn test_clean_removes_stale_module_files_only() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let host = tmp.path().join("host");
    fs::create_dir_all(&host)?;
    fs::write(host.join("demo_log.legacy.g.rs"), "// stale")?;
    fs::write(host.join("other.ids.g.rs"), "// other module")?;
    fs::write(host.join("notes.txt"), "keep")?;

    let sources = [IdlSource::new("demo_log_api.def", DEMO_LOG)];
    let (_, report) = Generator::new(options(tmp.path())).run(&sources)?;

    assert_eq!(report.removed, vec![host.join("demo_log.legacy.g.rs")]);
    assert!(!host.join("demo_log.legacy.g.rs").exists());
    assert!(host.join("other.ids.g.rs").exists());
    assert!(host.join("notes.txt").exists());
    Ok(())
}

#[test]
fn test_no_clean_keeps_stale_files() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let host = tmp.path().join("host");
    fs::create_dir_all(&host)?;
    fs::write(host.join("demo_log.legacy.g.rs"), "// stale")?;

    let generator = Generator::new(GenerateOptions {
        clean: false,
        ..options(tmp.path())
    });
    let (_, report) = generator.run(&[IdlSource::new("demo_log_api.def", DEMO_LOG)])?;

    assert!(report.removed.is_empty());
    assert!(host.join("demo_log.legacy.g.rs").exists());
    Ok(())
}

#[test]
fn test_regeneration_is_byte_identical() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let defs = tmp.path().join("defs");
    write_defs(&defs)?;
    let sources = collect_sources(&[], &defs)?;

    let first = tmp.path().join("first");
    let second = tmp.path().join("second");
    Generator::new(options(&first)).run(&sources)?;
    Generator::new(options(&second)).run(&sources)?;

    for side in ["host", "core"] {
        let names = file_names(&first.join(side))?;
        assert_eq!(names, file_names(&second.join(side))?);
        for name in names {
            let a = fs::read(first.join(side).join(&name))?;
            let b = fs::read(second.join(side).join(&name))?;
            assert_eq!(a, b, "{side}/{name}");
        }
    }

    // 再跑一次：内容未变，不重写
    let (_, report) = Generator::new(options(&first)).run(&sources)?;
    assert!(report.written.is_empty());
    assert_eq!(report.unchanged.len(), 26);
    Ok(())
}

#[test]
fn test_collect_sources_errors() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty)?;
    fs::write(empty.join("readme.md"), "not idl")?;
    assert!(matches!(collect_sources(&[], &empty), Err(GenError::NoInput(_))));

    let missing: PathBuf = tmp.path().join("missing.def");
    assert!(matches!(
        collect_sources(&[missing], &empty),
        Err(GenError::Read { .. })
    ));
    Ok(())
}

#[test]
fn test_demo_log_scenario() {
    let sources = [IdlSource::new(
        "demo.def",
        "to-host(Log, LogLevel level, StringSpan message)",
    )];
    let plan = Generator::new(GenerateOptions::default()).plan(&sources).unwrap();

    let id = plan
        .session
        .registry(Direction::ToHost)
        .iter()
        .find(|(_, name)| *name == "Demo.Log")
        .map(|(id, _)| id);
    assert_eq!(id, Some(FuncId(0x57846C8C)));
    assert_eq!(id, Some(FuncId::compute(Direction::ToHost, "Demo", "Log")));
}
