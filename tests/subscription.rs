// tests/subscription.rs

mod common;
use crate::common::builders::ProjectTree;
use crate::common::fakes::RecordingHandler;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use tsc_util::fs::RealFileSystem;
use tsc_util::vpath::to_virtual;
use tsc_util::watch::{FsEvent, FsSubscription, NotifySubscription, WatchEngine, WatcherMap, translate_event};

type TestResult = Result<(), Box<dyn Error>>;

fn paths(events: &[FsEvent]) -> Vec<(&'static str, PathBuf)> {
    events
        .iter()
        .filter_map(|e| {
            let name = match e {
                FsEvent::Add(_) => "add",
                FsEvent::Change(_) => "change",
                FsEvent::Unlink(_) => "unlink",
                FsEvent::AddDir(_) => "addDir",
                FsEvent::UnlinkDir(_) => "unlinkDir",
                FsEvent::Error(_) => return None,
            };
            e.path().map(|p| (name, p.to_path_buf()))
        })
        .collect()
}

#[test]
fn notify_events_map_to_file_lifecycle() {
    init_tracing();
    let file = PathBuf::from("/proj/lib/a.js");
    let other = PathBuf::from("/proj/lib/b.js");

    let created = translate_event(Event::new(EventKind::Create(CreateKind::File)).add_path(file.clone()));
    assert_eq!(paths(&created), vec![("add", file.clone())]);

    let modified = translate_event(
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(file.clone()),
    );
    assert_eq!(paths(&modified), vec![("change", file.clone())]);

    let removed = translate_event(Event::new(EventKind::Remove(RemoveKind::File)).add_path(file.clone()));
    assert_eq!(paths(&removed), vec![("unlink", file.clone())]);

    let dir = PathBuf::from("/proj/lib");
    let dir_removed = translate_event(Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(dir.clone()));
    assert_eq!(paths(&dir_removed), vec![("unlinkDir", dir)]);

    let renamed = translate_event(
        Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(file.clone())
            .add_path(other.clone()),
    );
    assert_eq!(paths(&renamed), vec![("unlink", file.clone()), ("add", other)]);

    let accessed = translate_event(Event::new(EventKind::Access(AccessKind::Any)).add_path(file));
    assert!(accessed.is_empty());
}

#[tokio::test]
async fn initial_scan_reports_existing_matches() -> TestResult {
    let tree = ProjectTree::new()
        .file("lib/a.js", "")
        .file("lib/sub/b.js", "")
        .file("lib/c.ts", "")
        .file("other/d.js", "");

    let (mut sub, mut rx) = NotifySubscription::new(Arc::new(RealFileSystem), true)?;
    sub.add(&format!("{}/lib/**/*.js", to_virtual(&tree.root())))?;

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        paths(&seen),
        vec![("add", tree.path("lib/a.js")), ("add", tree.path("lib/sub/b.js"))]
    );

    sub.close();
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn initial_scan_skips_linked_and_skipped_directories() -> TestResult {
    init_tracing();
    let tree = ProjectTree::new()
        .file("lib/a.js", "")
        .file("lib/dist/b.js", "");
    std::os::unix::fs::symlink(tree.path("lib"), tree.path("lib/loop"))?;

    let (sub, mut rx) = NotifySubscription::new(Arc::new(RealFileSystem), true)?;
    let mut sub = sub.with_skip_dirs([tree.path("lib/dist")]);
    sub.add(&format!("{}/lib/**/*.js", to_virtual(&tree.root())))?;

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert_eq!(paths(&seen), vec![("add", tree.path("lib/a.js"))]);

    sub.close();
    Ok(())
}

#[tokio::test]
async fn unwatch_keeps_no_entry_for_removed_paths() -> TestResult {
    init_tracing();
    let tree = ProjectTree::new().file("lib/a.js", "");
    let (mut sub, _rx) = NotifySubscription::new(Arc::new(RealFileSystem), false)?;
    sub.add(&format!("{}/lib/**/*.js", to_virtual(&tree.root())))?;

    sub.unwatch(&tree.path("lib/gone.js"));
    assert!(sub.unwatched_paths().is_empty());

    sub.unwatch(&tree.path("lib/a.js"));
    assert_eq!(sub.unwatched_paths(), vec![tree.path("lib/a.js")]);

    sub.close();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_existing_file_reaches_the_handler_at_startup() -> TestResult {
    init_tracing();
    let mut tree = ProjectTree::new();
    for i in 0..1000 {
        tree = tree.file(&format!("lib/f{i:04}.js"), "");
    }

    let (sub, events) = NotifySubscription::new(Arc::new(RealFileSystem), true)?;
    let engine = WatchEngine::new(Box::new(sub));
    engine.spawn(events);
    let handler = RecordingHandler::new();
    engine.watch(WatcherMap::new(
        format!("{}/lib/**/*.js", to_virtual(&tree.root())),
        Arc::new(handler.clone()),
    ))?;

    with_timeout(async {
        while handler.calls().len() < 1000 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert_eq!(handler.calls().len(), 1000);

    engine.close();
    Ok(())
}
