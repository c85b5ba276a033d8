// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use seedcrawl::config::crawler_config::ConfigHandle;
use seedcrawl::config::settings::Settings;
use seedcrawl::config::watcher::ConfigWatcher;
use seedcrawl::events::EventBus;
use seedcrawl::utils::errors::CrawlError;
use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

fn handle() -> ConfigHandle {
    ConfigHandle::new(Settings::default().crawler_config(), Arc::new(EventBus::new()))
}

fn config_file(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("crawler.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_reload_updates_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_file(&dir, "[scheduler]\nthread_number = 3\n");
    let handle = handle();
    let watcher = ConfigWatcher::new(&path, Duration::from_millis(20), handle.clone());

    assert!(watcher.reload().unwrap());
    assert_eq!(handle.current().thread_number, 3);
    // 内容未变时不产生新快照
    assert!(!watcher.reload().unwrap());
}

#[test]
fn test_invalid_reload_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_file(&dir, "[scheduler]\nthread_number = 0\n");
    let handle = handle();
    let watcher = ConfigWatcher::new(&path, Duration::from_millis(20), handle.clone());

    assert!(matches!(watcher.reload(), Err(CrawlError::Validation(_))));
    assert_eq!(handle.current().thread_number, 10);
}

#[tokio::test]
async fn test_watcher_picks_up_file_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_file(&dir, "[scheduler]\nthread_number = 2\n");
    let handle = handle();
    let mut updates = handle.subscribe();
    let token = CancellationToken::new();
    let task = ConfigWatcher::new(&path, Duration::from_millis(20), handle.clone()).start(token.clone());

    tokio::time::sleep(Duration::from_millis(50)).await;
    std::fs::write(&path, "[scheduler]\nthread_number = 6\n").unwrap();
    // 保证修改时间与首次观测不同
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(handle.current().thread_number, 6);

    token.cancel();
    task.await.unwrap();
}
