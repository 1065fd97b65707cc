use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_PASSES: usize = 16;

/// Settings for an optimizer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Upper bound on bottom-up passes before giving up on a fixpoint.
    pub max_passes: usize,
    /// Keep a `ChangeRecord` for every rewrite, not just the counts.
    pub record_changes: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            max_passes: DEFAULT_MAX_PASSES,
            record_changes: true,
        }
    }
}

impl OptimizerConfig {
    /// Loads a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read optimizer config {}", path.display()))?;
        let config: OptimizerConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid optimizer config {}", path.display()))?;
        if config.max_passes == 0 {
            anyhow::bail!("{}: max_passes must be at least 1", path.display());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_config(r#"{"max_passes": 3}"#);
        let config = OptimizerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_passes, 3);
        assert!(config.record_changes);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config(r#"{"max_pass": 3}"#);
        let err = OptimizerConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid optimizer config"));
    }

    #[test]
    fn test_zero_passes_rejected() {
        let file = write_config(r#"{"max_passes": 0}"#);
        assert!(OptimizerConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = OptimizerConfig::from_file(Path::new("/nonexistent/attrfold.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read optimizer config"));
    }
}
