#![allow(dead_code)]

pub mod architecture;
pub mod fake_pubsub;

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write `contents` to `name` inside a fresh temp dir.
///
/// The dir is removed when the returned guard drops.
pub fn write_config(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write temp config");
    (dir, path)
}

/// JSON document for the order fan-out against `endpoint`, with fast retries.
pub fn order_document(endpoint: &str) -> String {
    format!(
        r#"{{
    "project_id": "local-project",
    "emulator_host": "{endpoint}",
    "topics": ["order-created"],
    "subscriptions": [
        {{"name": "audit-sub", "topic": "order-created", "pushEndpoint": "audit:3000"}},
        {{"name": "notify-sub", "topic": "order-created", "pushEndpoint": "notify:3000"}}
    ],
    "retry": {{"max_attempts": 2, "delay_ms": 1}},
    "http": {{"timeout_ms": 1000, "connect_timeout_ms": 500}}
}}"#
    )
}
