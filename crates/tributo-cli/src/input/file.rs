use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON scenario or rate table file into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let file = resolve_file(path)?;
    let contents = fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
    tracing::debug!(path = %file.display(), bytes = contents.len(), "read input file");
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e).into())
}

/// Anchor relative paths at the working directory and require a regular file.
fn resolve_file(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let file = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    if !file.is_file() {
        return Err(format!("Not a file: {}", file.display()).into());
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tributo_core::regimes::RegimeInput;

    #[test]
    fn test_missing_file_is_reported() {
        let err = read_json::<RegimeInput>("definitely/not/here.json").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn test_reads_scenario_file() {
        let path = std::env::temp_dir().join(format!("tributo-scenario-{}.json", std::process::id()));
        fs::write(&path, r#"{"revenue": {"comercio": "250000"}, "expenses": {"purchases": 1000}}"#)
            .unwrap();
        let input: RegimeInput = read_json(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(input.revenue.len(), 1);
        assert_eq!(input.expenses.len(), 1);
    }
}
