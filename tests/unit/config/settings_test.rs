// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use seedcrawl::config::settings::Settings;
use seedcrawl::net::proxy::ProxyStrategy;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use validator::Validate;

fn toml_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_from_file_overrides_defaults() {
    let file = toml_file(
        r#"
[scheduler]
thread_number = 4
slow_start = true
slow_start_duration_ms = 2000

[session_pool]
max_size = 8
core_size = 2
max_online_duration_ms = 60000

[proxy]
urls = ["http://127.0.0.1:8080"]
strategy = "session"
"#,
    );

    let settings = Settings::from_file(file.path()).unwrap();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.scheduler.thread_number, 4);
    // 未出现的键保留默认值
    assert_eq!(settings.scheduler.borrow_max_wait_ms, 1000);
    assert_eq!(settings.proxy.strategy, ProxyStrategy::Session);

    let crawler = settings.crawler_config();
    assert!(crawler.slow_start);
    assert_eq!(crawler.slow_start_duration, Duration::from_secs(2));

    let pool = settings.session_pool_config();
    assert_eq!(pool.max_size, 8);
    assert_eq!(pool.core_size, 2);
    assert_eq!(pool.max_online_duration, Some(Duration::from_secs(60)));
}

#[test]
fn test_empty_file_yields_defaults() {
    let file = toml_file("");
    let settings = Settings::from_file(file.path()).unwrap();

    assert_eq!(settings.scheduler.thread_number, 10);
    assert!(!settings.scheduler.exit_when_complete);
    assert_eq!(settings.session_pool.max_size, 10);
    assert_eq!(settings.proxy.strategy, ProxyStrategy::Direct);
    assert!(settings.proxy.urls.is_empty());
    assert_eq!(settings.session_pool_config().max_online_duration, None);
}

#[test]
fn test_unknown_proxy_strategy_rejected() {
    let file = toml_file("[proxy]\nstrategy = \"rotating\"\n");
    assert!(Settings::from_file(file.path()).is_err());
}

#[test]
fn test_zero_threads_fail_validation() {
    let file = toml_file("[scheduler]\nthread_number = 0\n");
    let settings = Settings::from_file(file.path()).unwrap();
    assert!(settings.validate().is_err());
}
