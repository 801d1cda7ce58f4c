//! Run configuration and schema validation
//!
//! The configuration shape is described by an external JSON Schema
//! (`config/input_schema.json`). Validation is a soft capability: when the
//! schema cannot be loaded the run proceeds unvalidated with a warning, but a
//! configuration that violates a loadable schema is fatal.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

pub const DEFAULT_URLS_FILE: &str = "data/urls.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "data/example_output.json";
pub const DEFAULT_SCHEMA_FILE: &str = "config/input_schema.json";

/// Resolved run parameters. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the URL list file
    pub urls_file: PathBuf,
    /// Path to the JSON output file
    pub output_file: PathBuf,
    /// Multiplies the URL list by this factor before enqueuing
    pub sessions: u32,
    /// Interaction budget per URL visit (0 still performs the navigation)
    pub max_interactions: u32,
    /// Number of concurrent workers (coerced up to at least 1)
    pub concurrency: usize,
    /// Run browsers without a visible window
    pub headless: bool,
    /// Per-worker delay in seconds after each visit
    pub delay_between_sessions: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls_file: PathBuf::from(DEFAULT_URLS_FILE),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            sessions: 1,
            max_interactions: 10,
            concurrency: 3,
            headless: true,
            delay_between_sessions: 0.0,
        }
    }
}

/// Validate the configuration against the JSON Schema at `schema_path`.
///
/// A missing or unreadable schema downgrades to a warning (the validation
/// capability is optional); a schema violation is an error.
pub fn validate_config(config: &Config, schema_path: &Path) -> anyhow::Result<()> {
    let schema_text = match std::fs::read_to_string(schema_path) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Config schema not available at {} ({}). Skipping config validation.",
                schema_path.display(),
                e
            );
            return Ok(());
        }
    };

    let schema: Value = match serde_json::from_str(&schema_text) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Config schema at {} is not valid JSON ({}). Skipping config validation.",
                schema_path.display(),
                e
            );
            return Ok(());
        }
    };

    let instance = serde_json::to_value(config).context("Failed to serialize configuration")?;
    check_against_schema(&instance, &schema)
        .map_err(|violation| anyhow!("Configuration validation failed: {violation}"))?;

    info!("Configuration validated against {}", schema_path.display());
    Ok(())
}

/// Check an instance against the JSON Schema subset the config schema uses:
/// `required`, per-property `type`, and `minimum`.
fn check_against_schema(instance: &Value, schema: &Value) -> Result<(), String> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if instance.get(key).is_none() {
                return Err(format!("missing required field '{key}'"));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, rules) in properties {
            let Some(value) = instance.get(name) else {
                continue;
            };

            if let Some(expected) = rules.get("type").and_then(Value::as_str) {
                if !type_matches(expected, value) {
                    return Err(format!("field '{name}' is not of type {expected}"));
                }
            }

            if let Some(minimum) = rules.get("minimum").and_then(Value::as_f64) {
                let actual = value.as_f64().unwrap_or(f64::NEG_INFINITY);
                if actual < minimum {
                    return Err(format!("field '{name}' is below the minimum of {minimum}"));
                }
            }
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCHEMA: &str = r#"{
        "type": "object",
        "required": ["urls_file", "output_file", "sessions", "concurrency"],
        "properties": {
            "urls_file": {"type": "string"},
            "output_file": {"type": "string"},
            "sessions": {"type": "integer", "minimum": 1},
            "max_interactions": {"type": "integer", "minimum": 0},
            "concurrency": {"type": "integer", "minimum": 1},
            "headless": {"type": "boolean"},
            "delay_between_sessions": {"type": "number", "minimum": 0}
        }
    }"#;

    fn schema_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_config_passes_validation() {
        let schema = schema_file(SCHEMA);
        assert!(validate_config(&Config::default(), schema.path()).is_ok());
    }

    #[test]
    fn zero_sessions_violates_minimum() {
        let schema = schema_file(SCHEMA);
        let config = Config {
            sessions: 0,
            ..Config::default()
        };
        let err = validate_config(&config, schema.path()).unwrap_err();
        assert!(err.to_string().contains("sessions"));
    }

    #[test]
    fn zero_concurrency_violates_minimum() {
        let schema = schema_file(SCHEMA);
        let config = Config {
            concurrency: 0,
            ..Config::default()
        };
        assert!(validate_config(&config, schema.path()).is_err());
    }

    #[test]
    fn negative_delay_violates_minimum() {
        let schema = schema_file(SCHEMA);
        let config = Config {
            delay_between_sessions: -1.0,
            ..Config::default()
        };
        assert!(validate_config(&config, schema.path()).is_err());
    }

    #[test]
    fn missing_schema_is_soft_skipped() {
        let config = Config::default();
        assert!(validate_config(&config, Path::new("/nonexistent/schema.json")).is_ok());
    }

    #[test]
    fn malformed_schema_is_soft_skipped() {
        let schema = schema_file("not json at all {");
        assert!(validate_config(&Config::default(), schema.path()).is_ok());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let instance = serde_json::json!({"output_file": "x"});
        let schema: Value = serde_json::from_str(SCHEMA).unwrap();
        let err = check_against_schema(&instance, &schema).unwrap_err();
        assert!(err.contains("urls_file"));
    }
}
