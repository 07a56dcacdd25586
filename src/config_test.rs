use std::collections::HashMap;

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_to_local_backend() {
    let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.environment, ApiEnvironment::Local);
    assert_eq!(cfg.base_url, DEFAULT_LOCAL_API_URL);
    assert_eq!(
        cfg.timeouts,
        RequestTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg, ClientConfig::default());
}

#[test]
fn deployed_uses_explicit_url_and_overrides() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("PAYDRIFT_ENV", "deployed"),
        ("PAYDRIFT_API_URL", "https://paydrift.example.test/"),
        ("PAYDRIFT_REQUEST_TIMEOUT_SECS", "30"),
        ("PAYDRIFT_CONNECT_TIMEOUT_SECS", "3"),
    ]))
    .unwrap();
    assert_eq!(cfg.environment, ApiEnvironment::Deployed);
    assert_eq!(cfg.base_url, "https://paydrift.example.test");
    assert_eq!(cfg.timeouts, RequestTimeouts { request_secs: 30, connect_secs: 3 });
}

#[test]
fn deployed_without_url_errors() {
    let err = ClientConfig::from_lookup(lookup(&[("PAYDRIFT_ENV", "deployed")])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing { var: "PAYDRIFT_API_URL" }));
}

#[test]
fn unknown_environment_errors() {
    let err = ClientConfig::from_lookup(lookup(&[("PAYDRIFT_ENV", "staging")]))
        .unwrap_err()
        .to_string();
    assert!(err.contains("unknown PAYDRIFT_ENV"));
}

#[test]
fn unparsable_timeout_falls_back_to_default() {
    let cfg = ClientConfig::from_lookup(lookup(&[("PAYDRIFT_REQUEST_TIMEOUT_SECS", "soon")])).unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn with_base_url_trims_trailing_slash() {
    let cfg = ClientConfig::default().with_base_url("http://127.0.0.1:9000/");
    assert_eq!(cfg.base_url, "http://127.0.0.1:9000");
}
