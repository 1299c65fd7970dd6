// tests/resolver.rs

mod common;
use crate::common::builders::{ProjectTree, TsConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;

use tsc_util::config::{ConfigModel, load_config};
use tsc_util::finder::FileFinder;
use tsc_util::fs::RealFileSystem;
use tsc_util::fs::mock::MockFileSystem;
use tsc_util::resolver::FileSetResolver;

type TestResult = Result<(), Box<dyn Error>>;

fn resolver_for(tree: &ProjectTree) -> Result<FileSetResolver, Box<dyn Error>> {
    let fs = Arc::new(RealFileSystem);
    let config = load_config(fs.as_ref(), "tsconfig.json", &tree.root(), false)?;
    Ok(FileSetResolver::new(Arc::new(config), FileFinder::new(fs)))
}

fn mock_resolver(model: ConfigModel) -> FileSetResolver {
    FileSetResolver::new(Arc::new(model), FileFinder::new(Arc::new(MockFileSystem::new())))
}

#[tokio::test]
async fn include_directory_selects_sources_below_it() -> TestResult {
    init_tracing();
    let tree = ProjectTree::new()
        .file(
            "tsconfig.json",
            &TsConfigBuilder::new().include(&["lib"]).exclude(&[]).to_json(),
        )
        .file("lib/a.ts", "")
        .file("lib/sub/b.ts", "")
        .file("lib/types.d.ts", "")
        .file("lib/c.js", "")
        .file("node_modules/x/c.ts", "");

    let files = with_timeout(resolver_for(&tree)?.resolve_file_paths()).await?;
    assert_eq!(files, vec![tree.path("lib/a.ts"), tree.path("lib/sub/b.ts")]);
    Ok(())
}

#[tokio::test]
async fn default_include_skips_declarations_and_vendor_dirs() -> TestResult {
    let tree = ProjectTree::new()
        .file("tsconfig.json", "{}")
        .file("a.ts", "")
        .file("b.tsx", "")
        .file("c.js", "")
        .file("d.d.ts", "")
        .file("node_modules/x/index.ts", "");

    let files = with_timeout(resolver_for(&tree)?.resolve_file_paths()).await?;
    assert_eq!(files, vec![tree.path("a.ts"), tree.path("b.tsx")]);
    Ok(())
}

#[tokio::test]
async fn out_dir_inside_root_is_excluded() -> TestResult {
    let tree = ProjectTree::new()
        .file("tsconfig.json", &TsConfigBuilder::new().out_dir("dist").to_json())
        .file("src/a.ts", "")
        .file("dist/old.ts", "");

    let files = with_timeout(resolver_for(&tree)?.resolve_file_paths()).await?;
    assert_eq!(files, vec![tree.path("src/a.ts")]);
    Ok(())
}

#[tokio::test]
async fn files_entries_are_included_verbatim() -> TestResult {
    let tree = ProjectTree::new()
        .file(
            "tsconfig.json",
            &TsConfigBuilder::new().files(&["main.ts"]).to_json(),
        )
        .file("main.ts", "")
        .file("other.ts", "");

    let files = with_timeout(resolver_for(&tree)?.resolve_file_paths()).await?;
    assert_eq!(files, vec![tree.path("main.ts")]);
    Ok(())
}

#[tokio::test]
async fn auxiliary_files_are_declarations_and_scripts() -> TestResult {
    let tree = ProjectTree::new()
        .file("tsconfig.json", &TsConfigBuilder::new().out_dir("dist").to_json())
        .file("lib/a.js", "")
        .file("lib/b.d.ts", "")
        .file("lib/c.ts", "")
        .file("node_modules/x/y.js", "")
        .file("dist/z.js", "");

    let files = with_timeout(resolver_for(&tree)?.resolve_auxiliary_file_paths()).await?;
    assert_eq!(files, vec![tree.path("lib/b.d.ts"), tree.path("lib/a.js")]);
    Ok(())
}

#[test]
fn included_file_spec_lists_absolute_globs() -> TestResult {
    let resolver = mock_resolver(
        TsConfigBuilder::new()
            .out_dir("dist")
            .include(&["lib"])
            .files(&["main.ts"])
            .model("/proj"),
    );

    let spec = resolver.included_file_spec(true)?;
    assert_eq!(spec.root_path, std::path::PathBuf::from("/proj"));
    assert_eq!(spec.include, vec!["/proj/lib/**/*.{ts,tsx}", "/proj/main.ts"]);
    assert_eq!(
        spec.exclude,
        vec![
            "/proj/dist/**/*",
            "/proj/node_modules/**/*",
            "/proj/bower_components/**/*",
            "/proj/jspm_packages/**/*",
            "/proj/.git/**/*",
            "/proj/**/*.d.ts",
        ]
    );

    let without_default = resolver.included_file_spec(false)?;
    assert_eq!(without_default.exclude.len(), 5);
    Ok(())
}

#[test]
fn watch_patterns_follow_include_entries() -> TestResult {
    let resolver = mock_resolver(
        TsConfigBuilder::new()
            .include(&["lib", "bin/*", "main.ts", "types/x.d.ts"])
            .model("/proj"),
    );

    assert_eq!(
        resolver.watch_patterns()?,
        vec![
            "/proj/lib/**/*.js",
            "/proj/lib/**/*.d.ts",
            "/proj/bin/**/*.js",
            "/proj/bin/**/*.d.ts",
            "/proj/types/x.d.ts",
        ]
    );
    Ok(())
}

#[test]
fn watch_patterns_default_to_the_root() -> TestResult {
    let resolver = mock_resolver(TsConfigBuilder::new().root_dir("src").model("/proj"));
    assert_eq!(
        resolver.watch_patterns()?,
        vec!["/proj/src/**/*.js", "/proj/src/**/*.d.ts"]
    );
    Ok(())
}
