use serde_json::Value;

use super::format_scalar;

/// Fields tried in order; the first non-null one is printed alone.
const PRIORITY_KEYS: [&str; 5] = ["best", "tax", "total_tax", "breakdown", "regime_changes"];

/// Print just the headline answer.
///
/// For a comparison that is the winning regime and its tax, for a single
/// regime its total, for a sensitivity sweep the factors where the winner
/// changes. Otherwise the first field of the result.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            match map.get(key) {
                Some(Value::Null) | None => continue,
                Some(val) => {
                    println!("{}", headline(key, val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{key}: {}", format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}

fn headline(key: &str, value: &Value) -> String {
    match (key, value) {
        ("best", Value::Object(best)) => format!(
            "{} {}",
            best.get("regime").map(format_scalar).unwrap_or_default(),
            best.get("total_tax").map(format_scalar).unwrap_or_default()
        ),
        ("breakdown", Value::Object(b)) => b.get("total").map(format_scalar).unwrap_or_default(),
        _ => format_scalar(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_for_best_regime() {
        let best = json!({"regime": "simples_nacional", "total_tax": "84500"});
        assert_eq!(headline("best", &best), "simples_nacional 84500");
    }

    #[test]
    fn test_headline_for_breakdown_total() {
        let breakdown = json!({"pis": "6500", "total": "279300"});
        assert_eq!(headline("breakdown", &breakdown), "279300");
    }
}
