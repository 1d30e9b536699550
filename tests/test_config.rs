use rotor::config::{BackendConfig, Config};

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
listen_addr: "0.0.0.0:3000"
backends:
  - url: "http://localhost:9001/"
    name: "app-1"
  - url: "http://localhost:9002/"
"#;

    let cfg = Config::from_yaml(yaml).unwrap();
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.backends.len(), 2);
    assert_eq!(cfg.backends[0].name.as_deref(), Some("app-1"));
    assert_eq!(cfg.backends[1].name, None);
    assert!(cfg.monitor.is_none());
}

#[test]
fn test_config_default_listen_addr() {
    let yaml = r#"
backends:
  - url: "http://localhost:9001/"
"#;

    let cfg = Config::from_yaml(yaml).unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
}

#[test]
fn test_config_empty_backends_rejected() {
    let yaml = r#"
listen_addr: "127.0.0.1:8080"
backends: []
"#;

    let cfg = Config::from_yaml(yaml).unwrap();
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("empty"));
}

#[test]
fn test_config_invalid_backend_url_rejected() {
    let cfg = Config::from_yaml(
        r#"
backends:
  - url: "not a url"
"#,
    )
    .unwrap();

    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_backend_url_without_host_rejected() {
    let cfg = Config::from_yaml(
        r#"
backends:
  - url: "file:///tmp/x"
"#,
    )
    .unwrap();

    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_valid_backends_accepted() {
    let cfg = Config::from_yaml(
        r#"
backends:
  - url: "http://localhost:9001/"
  - url: "https://10.0.0.2:8443/app/"
"#,
    )
    .unwrap();

    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_monitor_section() {
    let yaml = r#"
backends:
  - url: "http://localhost:9001/"
monitor:
  enabled: true
  interval_secs: 60
  log_path: "monitor.log"
"#;

    let cfg = Config::from_yaml(yaml).unwrap();
    let monitor = cfg.monitor.unwrap();
    assert!(monitor.enabled);
    assert_eq!(monitor.interval_secs, 60);
    assert_eq!(monitor.log_path, "monitor.log");
    // Defaulted
    assert_eq!(monitor.alert_rss_mb, 1024.0);
}

#[test]
fn test_config_monitor_defaults() {
    let yaml = r#"
backends:
  - url: "http://localhost:9001/"
monitor:
  enabled: false
"#;

    let cfg = Config::from_yaml(yaml).unwrap();
    let monitor = cfg.monitor.unwrap();
    assert!(!monitor.enabled);
    assert_eq!(monitor.interval_secs, 1800);
    assert_eq!(monitor.log_path, "loadbalancer_log.txt");
}

#[test]
fn test_config_url_check_section() {
    let yaml = r#"
backends:
  - url: "http://localhost:9001/"
url_check:
  enabled: true
  url: "http://localhost:9001/health"
  interval_secs: 300
"#;

    let cfg = Config::from_yaml(yaml).unwrap();
    let url_check = cfg.url_check.unwrap();
    assert!(url_check.enabled);
    assert_eq!(url_check.url, "http://localhost:9001/health");
    assert_eq!(url_check.interval_secs, 300);
    // Defaulted
    assert_eq!(url_check.log_path, "NetworkLoadBalancerLog.txt");
    assert_eq!(url_check.alert_size_bytes, 1_000_000);
}

#[test]
fn test_config_url_check_absent() {
    let cfg = Config::from_yaml(
        r#"
backends:
  - url: "http://localhost:9001/"
"#,
    )
    .unwrap();

    assert!(cfg.url_check.is_none());
}

#[test]
fn test_backend_config_equality() {
    let a = BackendConfig {
        url: "http://localhost:9001/".to_string(),
        name: None,
    };
    let b = a.clone();
    assert_eq!(a, b);
}
