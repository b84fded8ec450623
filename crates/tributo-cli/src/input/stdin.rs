use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Expected stdin shape for `compare`, `simples`, `presumido` and `real`.
pub const SCENARIO_SHAPE: &str = r#"{"revenue": {"<category>": amount}, "expenses": {...}}"#;

/// Expected stdin shape for `quick`.
pub const QUICK_SHAPE: &str =
    r#"{"annual_revenue": amount, "activity": "<category>", "total_expense": amount, "purchases": amount}"#;

/// Expected stdin shape for `sensitivity`.
pub const SENSITIVITY_SHAPE: &str =
    r#"{"revenue": {...}, "expenses": {...}, "factors": [0.5, 1, 2]}"#;

/// Deserialize piped stdin into `T`. `None` when stdin is a terminal or
/// blank; a parse failure names the `shape` the command expects.
pub fn read_stdin<T: DeserializeOwned>(shape: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer, shape)
}

fn parse_piped<T: DeserializeOwned>(
    buffer: &str,
    shape: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    tracing::debug!(bytes = trimmed.len(), "read input from stdin");
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("Failed to parse stdin: {e}; expected {shape}").into())
}
