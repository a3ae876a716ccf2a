use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cricwidget::config::{Config, DEFAULT_ENDPOINT};

fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_match_the_widget() {
    let config = config_from(&[]).expect("defaults are valid");
    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.poll_interval, Duration::from_secs(60));
    assert_eq!(config.news_topic, "cricket");
    assert!(!config.demo);
    assert!(config.log_file.is_none());
}

#[test]
fn values_are_read_and_clamped() {
    let config = config_from(&[
        ("CRICWIDGET_GRAPHQL_URL", "http://localhost:4000/"),
        ("CRICWIDGET_TIMEOUT_SECS", "999"),
        ("CRICWIDGET_POLL_SECS", "1"),
        ("CRICWIDGET_NEWS_TOPIC", " ipl "),
        ("CRICWIDGET_DEMO", "TRUE"),
        ("CRICWIDGET_FETCH_THREADS", "0"),
    ])
    .expect("valid config");
    assert_eq!(config.endpoint, "http://localhost:4000/");
    assert_eq!(config.request_timeout, Duration::from_secs(120));
    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.news_topic, "ipl");
    assert!(config.demo);
    assert_eq!(config.fetch_threads, 1);
}

#[test]
fn unparsable_numbers_fall_back_to_defaults() {
    let config = config_from(&[
        ("CRICWIDGET_TIMEOUT_SECS", "ten"),
        ("CRICWIDGET_POLL_SECS", ""),
    ])
    .expect("valid config");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.poll_interval, Duration::from_secs(60));
}

#[test]
fn bad_endpoint_is_rejected() {
    assert!(config_from(&[("CRICWIDGET_GRAPHQL_URL", "not a url")]).is_err());
    assert!(config_from(&[("CRICWIDGET_GRAPHQL_URL", "ftp://example.com/")]).is_err());
}

#[test]
fn log_file_location() {
    let config = config_from(&[("XDG_STATE_HOME", "/tmp/state")]).expect("valid config");
    assert_eq!(
        config.log_file,
        Some(PathBuf::from("/tmp/state/cricwidget/cricwidget.log"))
    );

    let config = config_from(&[("HOME", "/home/fan")]).expect("valid config");
    assert_eq!(
        config.log_file,
        Some(PathBuf::from("/home/fan/.local/state/cricwidget/cricwidget.log"))
    );

    let config = config_from(&[("HOME", "/home/fan"), ("CRICWIDGET_LOG_FILE", "/var/log/cw.log")])
        .expect("valid config");
    assert_eq!(config.log_file, Some(PathBuf::from("/var/log/cw.log")));
}
