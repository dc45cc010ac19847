// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_settings_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(dir.path().to_path_buf()).unwrap();

    assert_eq!(config.socket_path, dir.path().join("daemon.sock"));
    assert_eq!(config.settings.broker.port, 5672);
    assert_eq!(config.settings.broker.queue, "drender.driver.frames");
    assert_eq!(config.settings.cloud.parallelism, 10);

    let runtime = config.settings.runtime_config();
    assert_eq!(runtime.heartbeat_interval, Duration::from_secs(15));
    assert_eq!(runtime.sweep_interval, Duration::from_secs(10));
    assert_eq!(runtime.spawn_timeout, Duration::from_secs(480));
    assert_eq!(runtime.restart_timeout, Duration::from_secs(300));
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
[broker]
port = 5673
username = "driver"

[cloud]
resource_url = "http://cloud.internal:9100"
parallelism = 4

[cloud.ami]
blender = "ami-0abc"
maya = "ami-0def"

[timers]
heartbeat_secs = 5
"#,
    )
    .unwrap();

    let config = Config::load_from(dir.path().to_path_buf()).unwrap();
    assert_eq!(config.settings.broker.port, 5673);
    assert_eq!(config.settings.broker.username.as_deref(), Some("driver"));
    assert_eq!(config.settings.cloud.resource_url, "http://cloud.internal:9100");

    let runtime = config.settings.runtime_config();
    assert_eq!(runtime.heartbeat_interval, Duration::from_secs(5));
    // Untouched values keep their defaults
    assert_eq!(runtime.probe_timeout, Duration::from_secs(30));
    assert_eq!(runtime.cloud_parallelism, 4);
    assert_eq!(runtime.ami_catalog["blender"], "ami-0abc");
}

#[test]
fn malformed_settings_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "broker = 5").unwrap();

    let err = Config::load_from(dir.path().to_path_buf()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
