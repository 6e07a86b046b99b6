//! Configuration management with layered hierarchy
//!
//! Built-in defaults, then the global `config.yaml`, then the project
//! `.srcc/config.yaml`, then `SRCC_*` environment variables. Later layers
//! override earlier ones key by key.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analysis::stage_parser::parse_stage;
use crate::analysis::survival::SurvivalMethod;
use crate::core::error::StageParseError;
use crate::core::project::Project;
use crate::entities::staging::TnmStaging;

/// SRCC configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Staging substituted when a record's staging cannot be parsed.
    /// Unset means unparsable staging is an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_stage: Option<String>,

    /// Survival estimator, `simplified` or `kaplan-meier`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survival_method: Option<String>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        Self::load_from(None)
    }

    /// Load configuration, discovering the project from `project_dir` when
    /// given instead of the working directory
    pub fn load_from(project_dir: Option<&Path>) -> Self {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        if let Some(project_path) = Self::project_config_path(project_dir) {
            if let Some(project) = Self::read_file(&project_path) {
                config.merge(project);
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "srcc").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path to the project config file, if a project is found
    pub fn project_config_path(project_dir: Option<&Path>) -> Option<PathBuf> {
        let project = match project_dir {
            Some(dir) => Project::discover_from(dir),
            None => Project::discover(),
        };
        project.ok().map(|p| p.config_path())
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Overlay environment variables read through `lookup`
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(stage) = lookup("SRCC_DEFAULT_STAGE") {
            self.default_stage = Some(stage);
        }
        if let Some(method) = lookup("SRCC_SURVIVAL_METHOD") {
            self.survival_method = Some(method);
        }
        if let Some(format) = lookup("SRCC_FORMAT") {
            self.default_format = Some(format);
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_stage.is_some() {
            self.default_stage = other.default_stage;
        }
        if other.survival_method.is_some() {
            self.survival_method = other.survival_method;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Parsed fallback staging, `None` when unset
    pub fn default_stage(&self) -> Result<Option<TnmStaging>, StageParseError> {
        self.default_stage.as_deref().map(parse_stage).transpose()
    }

    /// Configured survival estimator; unknown values fall back to the default
    pub fn survival_method(&self) -> SurvivalMethod {
        match self.survival_method.as_deref().map(str::parse::<SurvivalMethod>) {
            Some(Ok(method)) => method,
            Some(Err(err)) => {
                warn!(error = %err, "using default survival method");
                SurvivalMethod::default()
            }
            None => SurvivalMethod::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_merge_overrides_only_set_keys() {
        let mut base = Config {
            default_stage: Some("T1N0M0".into()),
            survival_method: Some("simplified".into()),
            default_format: None,
        };
        base.merge(Config {
            survival_method: Some("kaplan-meier".into()),
            ..Default::default()
        });
        assert_eq!(base.default_stage.as_deref(), Some("T1N0M0"));
        assert_eq!(base.survival_method(), SurvivalMethod::KaplanMeier);
    }

    #[test]
    fn test_env_layer_wins() {
        let env: HashMap<&str, &str> = [("SRCC_DEFAULT_STAGE", "T2N0M0"), ("SRCC_FORMAT", "json")]
            .into_iter()
            .collect();
        let mut config = Config {
            default_stage: Some("T1N0M0".into()),
            ..Default::default()
        };
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.default_stage.as_deref(), Some("T2N0M0"));
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert_eq!(config.survival_method, None);
    }

    #[test]
    fn test_default_stage_is_parsed() {
        let config = Config {
            default_stage: Some("t1 n0 m0".into()),
            ..Default::default()
        };
        assert_eq!(config.default_stage().unwrap().unwrap().to_string(), "T1N0M0");

        let bad = Config {
            default_stage: Some("Q9".into()),
            ..Default::default()
        };
        assert!(bad.default_stage().is_err());
        assert_eq!(Config::default().default_stage().unwrap(), None);
    }

    #[test]
    fn test_unknown_survival_method_falls_back() {
        let config = Config {
            survival_method: Some("cox".into()),
            ..Default::default()
        };
        assert_eq!(config.survival_method(), SurvivalMethod::Simplified);
    }

    #[test]
    fn test_project_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".srcc")).unwrap();
        std::fs::write(
            dir.path().join(".srcc/config.yaml"),
            "survival_method: kaplan-meier\n",
        )
        .unwrap();
        let path = Config::project_config_path(Some(dir.path())).unwrap();
        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.survival_method(), SurvivalMethod::KaplanMeier);
    }
}
