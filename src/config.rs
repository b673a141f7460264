use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coverage::{ReportFormat, ThresholdPolicy, DEFAULT_THRESHOLD};

pub const CONFIG_FILE: &str = "shroud.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub git: GitSection,
    #[serde(default)]
    pub github: GithubSection,
}

/// Report location and threshold policy. Unset values fall back to the defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    pub module: Option<String>,
    pub file: Option<PathBuf>,
    pub format: Option<String>,
    pub total_project_threshold: Option<f64>,
    pub modified_file_threshold: Option<f64>,
    pub fail_if_under_project_threshold: Option<bool>,
    /// Follows `fail_if_under_project_threshold` when unset
    pub fail_if_under_file_threshold: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitSection {
    /// Reference the review branches from, e.g. `origin/main`
    pub base: Option<String>,
    #[serde(default)]
    pub include_uncommitted: bool,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubSection {
    pub api_url: Option<String>,
    pub repository: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` if given, otherwise `shroud.toml` in `dir` when present
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = dir.join(CONFIG_FILE);
                if default_path.exists() {
                    log::debug!("Loading config from {}", default_path.display());
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(ref format) = self.report.format {
            format.parse::<ReportFormat>()?;
        }
        self.report.policy().validate()?;
        Ok(())
    }
}

impl ReportSection {
    /// Overlay `other` on top of `self`; set values in `other` win
    pub fn merge(&self, other: &ReportSection) -> ReportSection {
        ReportSection {
            module: other.module.clone().or_else(|| self.module.clone()),
            file: other.file.clone().or_else(|| self.file.clone()),
            format: other.format.clone().or_else(|| self.format.clone()),
            total_project_threshold: other
                .total_project_threshold
                .or(self.total_project_threshold),
            modified_file_threshold: other
                .modified_file_threshold
                .or(self.modified_file_threshold),
            fail_if_under_project_threshold: other
                .fail_if_under_project_threshold
                .or(self.fail_if_under_project_threshold),
            fail_if_under_file_threshold: other
                .fail_if_under_file_threshold
                .or(self.fail_if_under_file_threshold),
        }
    }

    pub fn policy(&self) -> ThresholdPolicy {
        ThresholdPolicy::new(
            self.total_project_threshold.unwrap_or(DEFAULT_THRESHOLD),
            self.modified_file_threshold.unwrap_or(DEFAULT_THRESHOLD),
            self.fail_if_under_project_threshold.unwrap_or(true),
            self.fail_if_under_file_threshold,
        )
    }

    pub fn format(&self) -> Result<ReportFormat> {
        match self.format {
            Some(ref format) => Ok(format.parse()?),
            None => Ok(ReportFormat::default()),
        }
    }
}
