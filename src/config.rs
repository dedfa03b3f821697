//! # Project Configuration
//!
//! `samconfig.toml` holds the deploy-time identity of a project: stack
//! name, stage and region. Only the subset this tool writes is read back;
//! missing fields fall back to defaults and the file is rewritten so every
//! option stays visible.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::project::Project;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SamConfig {
    pub stack_name: String,
    pub stage: String,
    pub region: String,
}

impl Default for SamConfig {
    fn default() -> Self {
        Self {
            stack_name: "samforge-app".to_string(),
            stage: "dev".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

impl SamConfig {
    pub fn new(stack_name: &str, stage: &str) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            stage: stage.to_string(),
            ..Self::default()
        }
    }
}

/// Writes the config for a freshly scaffolded project.
pub fn write(project: &Project, config: &SamConfig) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)?;
    fs::write(project.samconfig_path(), toml_string).with_context(|| {
        format!("failed to write '{}'", project.samconfig_path().display())
    })
}

/// Reads the config, filling in defaults for missing fields. When anything
/// was missing the completed config is written back.
pub fn load_or_create(project: &Project) -> Result<SamConfig> {
    let path = project.samconfig_path();
    if !path.exists() {
        let config = SamConfig::default();
        write(project, &config)?;
        return Ok(config);
    }

    let config_string = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let mut config: SamConfig = toml::from_str(&config_string)?;

    let defaults = SamConfig::default();
    if config.stack_name.is_empty() {
        config.stack_name = defaults.stack_name;
    }
    if config.stage.is_empty() {
        config.stage = defaults.stage;
    }
    if config.region.is_empty() {
        config.region = defaults.region;
    }

    let final_toml = toml::to_string_pretty(&config)?;
    if final_toml != config_string {
        fs::write(&path, final_toml)?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_load_or_create_writes_defaults() {
        let tmp_dir = Builder::new().prefix("test-config-").tempdir().unwrap();
        let project = Project::at(tmp_dir.path());

        let config = load_or_create(&project).unwrap();
        assert_eq!(config, SamConfig::default());
        assert!(project.samconfig_path().is_file());
    }

    #[test]
    fn test_partial_config_is_completed_and_rewritten() {
        let tmp_dir = Builder::new().prefix("test-config-").tempdir().unwrap();
        let project = Project::at(tmp_dir.path());
        fs::write(project.samconfig_path(), "stack_name = \"demo\"\n").unwrap();

        let config = load_or_create(&project).unwrap();
        assert_eq!(config.stack_name, "demo");
        assert_eq!(config.stage, "dev");

        let rewritten = fs::read_to_string(project.samconfig_path()).unwrap();
        assert!(rewritten.contains("stage"));
        assert!(rewritten.contains("region"));
    }
}
