#![allow(dead_code)]

use serde_json::{Value, json};

/// The settings object the app stores alongside exported files.
pub fn settings() -> Value {
    json!({
        "lool": "ff",
        "hahah": "cool",
        "version": {
            "app": "1.1.0",
            "lib": "1.0.5"
        }
    })
}

/// A payload whose strings avoid every character the notation rewrites.
pub fn safe_payload() -> Value {
    json!({
        "request": {
            "filename": "example",
            "language": "rust",
            "options": {
                "opt_level": 2,
                "features": ["serde", "tokio"]
            }
        },
        "entities": [
            {"type": "function", "name": "main"},
            {"type": "macro", "name": "println!"}
        ],
        "matrix": [[1, -2], []],
        "empty": {},
        "flags": [true, false, null]
    })
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
