// tests/finder.rs

mod common;
use crate::common::builders::ProjectTree;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tsc_util::errors::TscUtilError;
use tsc_util::finder::{FileFinder, FindOptions};
use tsc_util::fs::mock::MockFileSystem;
use tsc_util::fs::{FileSystem, RealFileSystem};
use tsc_util::vpath::to_virtual;

type TestResult = Result<(), Box<dyn Error>>;

fn sample_tree() -> ProjectTree {
    ProjectTree::new()
        .file("lib/a.ts", "export const a = 1;\n")
        .file("lib/sub/b.ts", "export const b = 2;\n")
        .file("lib/c.js", "module.exports = 3;\n")
        .file("node_modules/x/c.ts", "export {};\n")
}

fn finder() -> FileFinder {
    FileFinder::new(Arc::new(RealFileSystem))
}

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn overlapping_patterns_yield_each_file_once() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let options = FindOptions {
        cwd: Some(tree.root()),
        ..FindOptions::default()
    };

    let found = with_timeout(finder().find(&patterns(&["**/*.ts", "lib/**/*.ts"]), &options)).await?;
    assert_eq!(
        found,
        vec![
            PathBuf::from("lib/a.ts"),
            PathBuf::from("lib/sub/b.ts"),
            PathBuf::from("node_modules/x/c.ts"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn excluded_directories_are_skipped() -> TestResult {
    let tree = sample_tree();
    let options = FindOptions {
        cwd: Some(tree.root()),
        exclude: patterns(&["node_modules/**/*", "lib/sub/**/*"]),
        full_path: false,
    };

    let found = with_timeout(finder().find(&patterns(&["**/*.ts"]), &options)).await?;
    assert_eq!(found, vec![PathBuf::from("lib/a.ts")]);
    Ok(())
}

#[tokio::test]
async fn absolute_patterns_with_full_paths() -> TestResult {
    let tree = sample_tree();
    let root = to_virtual(&tree.root());
    let options = FindOptions {
        cwd: Some(tree.root()),
        exclude: vec![format!("{root}/**/*.ts")],
        full_path: true,
    };

    let found = with_timeout(finder().find(&[format!("{root}/lib/**/*")], &options)).await?;
    assert_eq!(found, vec![tree.path("lib/c.js")]);
    Ok(())
}

#[tokio::test]
async fn missing_directories_match_nothing() -> TestResult {
    let tree = sample_tree();
    let options = FindOptions {
        cwd: Some(tree.root()),
        ..FindOptions::default()
    };

    let found = with_timeout(finder().find(&patterns(&["missing/**/*.ts"]), &options)).await?;
    assert!(found.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_pattern_fails_the_call() {
    let tree = sample_tree();
    let options = FindOptions {
        cwd: Some(tree.root()),
        ..FindOptions::default()
    };

    let err = with_timeout(finder().find(&patterns(&["lib/**/*.ts", "lib/["]), &options))
        .await
        .unwrap_err();
    assert!(matches!(err, TscUtilError::GlobError(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn linked_directory_loops_are_not_followed() -> TestResult {
    init_tracing();
    let tree = ProjectTree::new().file("lib/a.ts", "export {};\n");
    std::os::unix::fs::symlink(tree.path("lib"), tree.path("lib/loop"))?;
    let options = FindOptions {
        cwd: Some(tree.root()),
        ..FindOptions::default()
    };

    let found = with_timeout(finder().find(&patterns(&["lib/**/*.ts"]), &options)).await?;
    assert_eq!(found, vec![PathBuf::from("lib/a.ts")]);
    Ok(())
}

/// Mock tree where one directory disappears between being listed and read.
#[derive(Debug)]
struct VanishingDir {
    inner: MockFileSystem,
    gone: PathBuf,
}

impl FileSystem for VanishingDir {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.inner.read_to_string(path)
    }
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.inner.write(path, contents)
    }
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.copy(from, to)
    }
    fn remove_all(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_all(path)
    }
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
    fn is_symlink(&self, path: &Path) -> bool {
        self.inner.is_symlink(path)
    }
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.canonicalize(path)
    }
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if path == self.gone {
            return Err(io::Error::new(io::ErrorKind::NotFound, "removed"));
        }
        self.inner.read_dir(path)
    }
}

#[tokio::test]
async fn vanished_directory_does_not_end_the_walk() -> TestResult {
    init_tracing();
    let mock = MockFileSystem::new();
    mock.add_file("/proj/lib/a/one.ts", "");
    mock.add_file("/proj/lib/b/two.ts", "");
    mock.add_file("/proj/lib/c/three.ts", "");
    let fs = VanishingDir {
        inner: mock,
        gone: PathBuf::from("/proj/lib/b"),
    };
    let options = FindOptions {
        cwd: Some(PathBuf::from("/proj")),
        ..FindOptions::default()
    };

    let found = with_timeout(FileFinder::new(Arc::new(fs)).find(&patterns(&["lib/**/*.ts"]), &options)).await?;
    assert_eq!(
        found,
        vec![PathBuf::from("lib/a/one.ts"), PathBuf::from("lib/c/three.ts")]
    );
    Ok(())
}
