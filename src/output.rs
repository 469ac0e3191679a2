//! JSON persistence for pipeline results.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Logs a result as pretty-printed JSON at debug level.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    debug!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `value` to `path` as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(path = %path.display(), "Output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&json!({"total_surveys": 4})).unwrap();
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("survey_risk_test_create.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &json!({"total_surveys": 4})).unwrap();

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["total_surveys"], 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_overwrites() {
        let path = temp_path("survey_risk_test_overwrite.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &json!({"run": 1, "extra": "first"})).unwrap();
        write_json(&path, &json!({"run": 2})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"run\": 2"));
        assert!(!content.contains("first"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_missing_directory_fails() {
        let path = temp_path("survey_risk_no_such_dir/out.json");
        assert!(write_json(&path, &json!({})).is_err());
    }
}
