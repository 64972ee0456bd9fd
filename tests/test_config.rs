use std::io::Write;

use ed300_bridge::prelude::*;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn load(contents: &str) -> Result<Config> {
    let file = write_config(contents);
    Config::new(file.path().to_string_lossy().into_owned())
}

#[test]
fn loads_a_minimal_config_with_defaults() {
    let config = load("devices:\n  - host: 192.168.1.20\n").unwrap();

    assert_eq!(config.loglevel(), "info");

    let device = config.enabled_devices().next().unwrap();
    assert_eq!(device.host(), "192.168.1.20");
    assert_eq!(device.port(), 502);
    assert_eq!(device.unit_id(), 3);
    assert_eq!(device.scan_interval(), 30);
    assert_eq!(device.model(), "ED300");
    assert!(device.empty_poll_warning());
    assert_eq!(device.identifier(), "192.168.1.20:3");
}

#[test]
fn explicit_values_override_defaults() {
    let config = load(
        "loglevel: debug\n\
         devices:\n  \
         - host: heatpump.local\n    \
         port: 1502\n    \
         unit_id: 5\n    \
         scan_interval: 60\n    \
         empty_poll_warning: false\n",
    )
    .unwrap();

    assert_eq!(config.loglevel(), "debug");

    let device = config.enabled_devices().next().unwrap();
    assert_eq!(device.port(), 1502);
    assert_eq!(device.unit_id(), 5);
    assert_eq!(device.scan_interval(), 60);
    assert!(!device.empty_poll_warning());
}

#[test]
fn scan_interval_outside_the_allowed_range_is_rejected() {
    assert!(load("devices:\n  - host: a\n    scan_interval: 4\n").is_err());
    assert!(load("devices:\n  - host: a\n    scan_interval: 601\n").is_err());
    assert!(load("devices:\n  - host: a\n    scan_interval: 5\n").is_ok());
    assert!(load("devices:\n  - host: a\n    scan_interval: 600\n").is_ok());
}

#[test]
fn a_config_without_devices_is_rejected() {
    assert!(load("devices: []\n").is_err());
}

#[test]
fn disabled_devices_are_filtered_out() {
    let config = load(
        "devices:\n  \
         - host: a\n    \
         enabled: false\n  \
         - host: b\n",
    )
    .unwrap();

    let hosts: Vec<_> = config
        .enabled_devices()
        .map(|device| device.host().to_string())
        .collect();
    assert_eq!(hosts, vec!["b"]);
}

#[test]
fn a_missing_file_is_an_error() {
    assert!(Config::new("/nonexistent/config.yaml".to_string()).is_err());
}
