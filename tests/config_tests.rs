use std::collections::HashMap;
use std::time::Duration;

use aws_actions::core::config::AppConfig;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_when_unset() {
    let config = AppConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.region, None);
    assert_eq!(config.endpoint_url, None);
    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.poll_max_attempts, 120);
    assert_eq!(config.support_language, "en");
    assert_eq!(config.cognito_client_secret_param, None);
}

#[test]
fn test_reads_all_settings() {
    let config = AppConfig::from_lookup(lookup(&[
        ("AWS_ACTIONS_REGION", "eu-central-1"),
        ("AWS_ACTIONS_ENDPOINT_URL", "http://localhost:4566"),
        ("AWS_ACTIONS_POLL_INTERVAL_SECS", "2"),
        ("AWS_ACTIONS_POLL_MAX_ATTEMPTS", "30"),
        ("AWS_ACTIONS_SUPPORT_LANGUAGE", "ja"),
        ("COGNITO_CLIENT_SECRET_PARAM", "/cognito/app/secret"),
    ]))
    .unwrap();
    assert_eq!(config.region.as_deref(), Some("eu-central-1"));
    assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
    assert_eq!(config.poll_interval, Duration::from_secs(2));
    assert_eq!(config.poll_max_attempts, 30);
    assert_eq!(config.support_language, "ja");
    assert_eq!(
        config.cognito_client_secret_param.as_deref(),
        Some("/cognito/app/secret")
    );
}

#[test]
fn test_empty_values_count_as_unset() {
    let config = AppConfig::from_lookup(lookup(&[
        ("AWS_ACTIONS_REGION", ""),
        ("AWS_ACTIONS_POLL_INTERVAL_SECS", "  "),
    ]))
    .unwrap();
    assert_eq!(config.region, None);
    assert_eq!(config.poll_interval, Duration::from_secs(5));
}

#[test]
fn test_malformed_numbers_are_errors() {
    let err = AppConfig::from_lookup(lookup(&[("AWS_ACTIONS_POLL_INTERVAL_SECS", "soon")]))
        .unwrap_err();
    assert!(err.contains("AWS_ACTIONS_POLL_INTERVAL_SECS"));

    let err = AppConfig::from_lookup(lookup(&[("AWS_ACTIONS_POLL_MAX_ATTEMPTS", "-1")]))
        .unwrap_err();
    assert!(err.contains("AWS_ACTIONS_POLL_MAX_ATTEMPTS"));
}

#[test]
fn test_zero_attempts_rejected() {
    assert!(AppConfig::from_lookup(lookup(&[("AWS_ACTIONS_POLL_MAX_ATTEMPTS", "0")])).is_err());
}

#[test]
fn test_cli_overrides_win() {
    let config = AppConfig::from_lookup(lookup(&[("AWS_ACTIONS_REGION", "us-west-2")]))
        .unwrap()
        .with_overrides(Some("ap-south-1".into()), None);
    assert_eq!(config.region.as_deref(), Some("ap-south-1"));
    assert_eq!(config.endpoint_url, None);

    let config = AppConfig::from_lookup(lookup(&[("AWS_ACTIONS_REGION", "us-west-2")]))
        .unwrap()
        .with_overrides(None, None);
    assert_eq!(config.region.as_deref(), Some("us-west-2"));
}
