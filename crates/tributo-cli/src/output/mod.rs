pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted `(key, value)` rows, e.g.
/// `lucro_real.breakdown.pis`. Arrays of scalars are kept as leaves.
pub(crate) fn flatten_rows(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut rows = Vec::new();
    flatten_into("", map, &mut rows);
    rows
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&path, inner, rows),
            _ => rows.push((path, val.clone())),
        }
    }
}

/// Render a leaf for tabular output. Decimals arrive as JSON strings.
pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) if arr.iter().all(|v| !v.is_object()) => {
            arr.iter().map(format_scalar).collect::<Vec<_>>().join(", ")
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The first array of objects directly under `result`, e.g. sensitivity points.
pub(crate) fn row_array(result: &Map<String, Value>) -> Option<(&str, &[Value])> {
    result.iter().find_map(|(key, val)| match val {
        Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
            Some((key.as_str(), arr.as_slice()))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_rows_uses_dotted_paths() {
        let value = json!({
            "best": {"regime": "simples_nacional", "total_tax": "84500"},
            "total_revenue": "1000000"
        });
        let rows = flatten_rows(value.as_object().unwrap());
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["best.regime", "best.total_tax", "total_revenue"]);
    }

    #[test]
    fn test_row_array_finds_points() {
        let value = json!({"points": [{"factor": "1"}], "regime_changes": ["2"]});
        let (key, rows) = row_array(value.as_object().unwrap()).unwrap();
        assert_eq!(key, "points");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_scalar_arrays_join() {
        assert_eq!(format_scalar(&json!(["0.5", "2"])), "0.5, 2");
        assert_eq!(format_scalar(&Value::Null), "");
    }
}
