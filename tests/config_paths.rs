// tests/config_paths.rs

mod common;
use crate::common::builders::TsConfigBuilder;

use std::path::{Path, PathBuf};

#[test]
fn out_and_root_paths_mirror_each_other() {
    let model = TsConfigBuilder::new().out_dir("dist").model("/proj");

    assert_eq!(model.root_path(), PathBuf::from("/proj"));
    assert_eq!(model.out_path(), PathBuf::from("/proj/dist"));
    assert!(model.is_out_dir());

    assert_eq!(
        model.to_out_path(Path::new("/proj/lib/a.js")),
        PathBuf::from("/proj/dist/lib/a.js")
    );
    assert_eq!(
        model.to_out_path(Path::new("lib/a.js")),
        PathBuf::from("/proj/dist/lib/a.js")
    );
    assert_eq!(
        model.to_root_path(Path::new("/proj/dist/lib/a.js")),
        PathBuf::from("/proj/lib/a.js")
    );
    assert_eq!(
        model.to_out_paths(&["bin/x.js", "y.d.ts"]),
        vec![PathBuf::from("/proj/dist/bin/x.js"), PathBuf::from("/proj/dist/y.d.ts")]
    );
}

#[test]
fn resolved_options_carry_absolute_dirs() {
    let model = TsConfigBuilder::new().root_dir("src").out_dir("lib").model("/proj");
    let opts = model.resolved_compiler_options();
    assert_eq!(opts.root_dir.as_deref(), Some("/proj/src"));
    assert_eq!(opts.out_dir.as_deref(), Some("/proj/lib"));
}

#[test]
fn module_spec_into_out_tree_is_rewritten() {
    let model = TsConfigBuilder::new().out_dir("dist").model("/proj");

    assert_eq!(
        model.move_module_spec(Path::new("./bin/tsc.js"), "../dist/lib/index"),
        "../lib/index"
    );
    assert_eq!(
        model.move_module_spec(Path::new("./bin/tsc.js"), "../lib/test"),
        "../lib/test"
    );
    assert_eq!(model.move_module_spec(Path::new("./bin/tsc.js"), "./util"), "./util");
}

#[test]
fn module_spec_landing_beside_the_moved_module() {
    let model = TsConfigBuilder::new().root_dir("src").out_dir("lib").model("/proj");
    assert_eq!(
        model.move_module_spec(Path::new("/proj/src/index.js"), "../lib/foo"),
        "./foo"
    );
    assert_eq!(model.move_module_spec(Path::new("/proj/src/index.js"), "../lib"), ".");
}

#[test]
fn module_spec_unchanged_without_separate_out_dir() {
    let model = TsConfigBuilder::new().model("/proj");
    assert_eq!(
        model.move_module_spec(Path::new("./bin/tsc.js"), "../dist/lib/index"),
        "../dist/lib/index"
    );
}

#[test]
fn excluded_dirs_lead_with_the_out_dir() {
    let model = TsConfigBuilder::new().out_dir("dist").model("/proj");
    assert_eq!(
        model.excluded_dirs(),
        vec![
            "/proj/dist",
            "/proj/node_modules",
            "/proj/bower_components",
            "/proj/jspm_packages",
            "/proj/.git",
        ]
    );

    let same = TsConfigBuilder::new().exclude(&["vendor/**/*"]).model("/proj");
    assert_eq!(same.excluded_dirs(), vec!["/proj/vendor"]);
}

#[test]
fn ignored_paths_include_descendants() {
    let model = TsConfigBuilder::new().out_dir("dist").model("/proj");
    assert!(model.is_ignored_path(Path::new("/proj/node_modules")));
    assert!(model.is_ignored_path(Path::new("/proj/node_modules/x/y.js")));
    assert!(model.is_ignored_path(Path::new("/proj/dist/a.js")));
    assert!(model.is_ignored_path(Path::new("node_modules/x/y.js")));
    assert!(!model.is_ignored_path(Path::new("/proj/lib/a.js")));
    assert!(!model.is_ignored_path(Path::new("/proj/distant/a.js")));

    let nested = TsConfigBuilder::new().exclude(&["**/fixtures"]).model("/proj");
    assert!(nested.is_ignored_path(Path::new("/proj/a/fixtures/x.js")));
    assert!(!nested.is_ignored_path(Path::new("/proj/a/b/x.js")));
}
