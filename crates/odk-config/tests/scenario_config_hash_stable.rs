//! The config hash must be stable: equal effective configs hash equal no
//! matter how their keys were ordered, and any value change moves the hash.

use odk_config::{config_hash, effective_json, AppConfig};

#[test]
fn hash_is_stable_across_key_order() {
    let a = serde_json::json!({
        "bind_addr": "127.0.0.1:8098",
        "session_ttl_minutes": 60,
        "db_max_connections": 5,
    });
    let b = serde_json::json!({
        "db_max_connections": 5,
        "session_ttl_minutes": 60,
        "bind_addr": "127.0.0.1:8098",
    });
    assert_eq!(config_hash(&a), config_hash(&b));
}

#[test]
fn hash_is_deterministic_across_calls() {
    let v = effective_json(&AppConfig::default()).unwrap();
    assert_eq!(config_hash(&v), config_hash(&v));
}

#[test]
fn hash_moves_when_a_value_changes() {
    let mut cfg = AppConfig::default();
    let before = config_hash(&effective_json(&cfg).unwrap());
    cfg.session_ttl_minutes += 1;
    let after = config_hash(&effective_json(&cfg).unwrap());
    assert_ne!(before, after);
}
