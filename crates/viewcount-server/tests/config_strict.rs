#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use viewcount_server::config::{self, DedupMode, StoreBackend, ViewConfig, REDIS_URL_ENV};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
rate_limit:
  write: { limit: 10, windw_secs: 60 } # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\nstore:\n  backend: memory\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    assert_eq!(ViewConfig::default().store.backend, StoreBackend::Redis);
    assert_eq!(cfg.rate_limit.read.limit, 60);
    assert_eq!(cfg.rate_limit.write.limit, 10);
    assert_eq!(cfg.dedup.mode, DedupMode::CheckThenSet);
    assert_eq!(cfg.views.max_slug_len, 256);
}

#[test]
fn full_config_round_trips_values() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
store:
  backend: memory
  key_prefix: "blog:"
rate_limit:
  read: { enabled: false, limit: 100, window_secs: 30 }
  write: { limit: 5 }
dedup:
  mode: set_if_absent
views:
  max_slug_len: 64
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert_eq!(cfg.store.key_prefix, "blog:");
    assert!(!cfg.rate_limit.read.enabled);
    assert_eq!(cfg.rate_limit.read.window_secs, 30);
    assert_eq!(cfg.rate_limit.write.limit, 5);
    assert_eq!(cfg.rate_limit.write.window_secs, 60);
    assert_eq!(cfg.dedup.mode, DedupMode::SetIfAbsent);
    assert_eq!(cfg.views.max_slug_len, 64);
}

#[test]
fn out_of_range_values_fail_validation() {
    for bad in [
        "version: 2\n",
        "version: 1\nstore: { backend: memory }\nrate_limit:\n  write: { limit: 0 }\n",
        "version: 1\nstore: { backend: memory }\nrate_limit:\n  read: { limit: 10, window_secs: 0 }\n",
        "version: 1\nstore: { backend: memory }\nviews:\n  max_slug_len: 0\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.client_code().as_str(), "CONFIG", "{bad}");
    }
}

#[test]
fn explicit_store_url_wins() {
    let cfg = config::load_from_str("version: 1\nstore:\n  url: \"redis://cache:6379\"\n").unwrap();
    assert_eq!(cfg.store.redis_url().unwrap(), "redis://cache:6379");
}

#[test]
fn redis_backend_without_url_fails_at_load() {
    std::env::remove_var(REDIS_URL_ENV);
    let err = config::load_from_str("version: 1\nstore:\n  backend: redis\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIG");
    assert!(err.to_string().contains("store.url"), "{err}");

    // the memory backend needs no url
    config::load_from_str("version: 1\nstore:\n  backend: memory\n").expect("must parse");
}
