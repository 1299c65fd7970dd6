// tests/vpath.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tsc_util::errors::TscUtilError;
use tsc_util::vpath::{VirtualPath, normalize_path, relative_path};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn normalize_folds_dots_and_separators() -> TestResult {
    init_tracing();
    assert_eq!(VirtualPath::normalize("a/./b/../c")?.to_virtual_path(), "a/c");
    assert_eq!(VirtualPath::normalize("a//b/")?.to_virtual_path(), "a/b");
    assert_eq!(VirtualPath::normalize("../x")?.to_virtual_path(), "../x");
    assert_eq!(VirtualPath::normalize("/..")?.to_virtual_path(), "/");
    assert_eq!(VirtualPath::normalize("./")?.to_virtual_path(), ".");
    Ok(())
}

#[test]
fn empty_path_is_rejected() {
    let err = VirtualPath::normalize("").unwrap_err();
    assert!(matches!(err, TscUtilError::InvalidPath));
}

#[test]
fn components_of_a_file_path() -> TestResult {
    let p = VirtualPath::normalize("/proj/lib/types.d.ts")?;
    assert_eq!(p.dirname().to_virtual_path(), "/proj/lib");
    assert_eq!(p.basename(), "types.d.ts");
    assert_eq!(p.extname(), ".ts");
    assert_eq!(p.segments(), vec!["proj", "lib", "types.d.ts"]);
    assert!(p.is_absolute());

    let dotfile = VirtualPath::normalize(".gitignore")?;
    assert_eq!(dotfile.extname(), "");
    assert!(dotfile.is_relative());
    assert_eq!(dotfile.dirname().to_virtual_path(), ".");
    Ok(())
}

#[test]
fn join_and_equality() -> TestResult {
    let base = VirtualPath::normalize("/proj")?;
    let joined = base.join(["lib", "../bin", "tsc.js"]);
    assert_eq!(joined, VirtualPath::normalize("/proj/bin/tsc.js")?);
    assert_eq!(joined.to_string(), "/proj/bin/tsc.js");
    Ok(())
}

#[test]
fn starts_with_is_segment_wise() -> TestResult {
    let file = VirtualPath::normalize("/proj/lib/a.ts")?;
    assert!(file.starts_with(&VirtualPath::normalize("/proj/lib")?));
    assert!(file.starts_with(&VirtualPath::normalize("/proj/lib/a.ts")?));
    assert!(!file.starts_with(&VirtualPath::normalize("/proj/li")?));
    assert!(!file.starts_with(&VirtualPath::normalize("proj/lib")?));
    Ok(())
}

#[test]
fn relative_between_siblings() -> TestResult {
    let target = VirtualPath::normalize("/proj/dist/lib/index")?;
    let from = VirtualPath::normalize("/proj/dist/bin")?;
    assert_eq!(target.relative_to(&from), "../lib/index");
    assert_eq!(target.relative_to(&target), "");

    assert_eq!(
        relative_path(Path::new("/proj/dist/bin"), Path::new("/proj/dist/lib/index")),
        PathBuf::from("../lib/index")
    );
    assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b")), PathBuf::new());
    assert_eq!(normalize_path(Path::new("")), PathBuf::from("."));
    Ok(())
}

fn raw_path() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        Just("a".to_string()),
        Just("lib".to_string()),
        Just(".".to_string()),
        Just("..".to_string()),
        Just(String::new()),
        Just("x.d.ts".to_string()),
    ];
    (any::<bool>(), proptest::collection::vec(segment, 1..8)).prop_map(|(abs, segs)| {
        let body = segs.join("/");
        if abs { format!("/{body}") } else { body }
    })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in raw_path()) {
        prop_assume!(!raw.is_empty());
        let once = VirtualPath::normalize(&raw).unwrap().to_virtual_path();
        let twice = VirtualPath::normalize(&once).unwrap().to_virtual_path();
        prop_assert_eq!(once, twice);
    }
}
