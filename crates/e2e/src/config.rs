//! Runner configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};
use crate::form::FormLayout;
use crate::playwright::PlaywrightConfig;
use crate::scenario::Scenario;
use crate::target::ProbeConfig;

/// Public demo site hosting the registration form
pub const DEFAULT_BASE_URL: &str = "https://qa-practice.netlify.app";

/// Configuration for the scenario runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Site root; the form path is appended
    pub base_url: String,

    /// JSON fixture with the valid user
    pub fixture_path: PathBuf,

    /// YAML scenario directory; bundled scenarios when unset
    pub scenarios_dir: Option<PathBuf>,

    /// Where results and the artifact manifest go
    pub output_dir: PathBuf,

    /// Where screenshots go
    pub screenshot_dir: PathBuf,

    /// Scenarios allowed to run at once
    pub workers: usize,

    /// Probe the target before running
    pub preflight: bool,

    pub form: FormLayout,
    pub playwright: PlaywrightConfig,
    pub probe: ProbeConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fixture_path: PathBuf::from("data/data-test.json"),
            scenarios_dir: None,
            output_dir: PathBuf::from("test-results"),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            workers: 1,
            preflight: false,
            form: FormLayout::default(),
            playwright: PlaywrightConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| E2eError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Scenarios from `scenarios_dir`, or the bundled ones when unset
    pub fn load_scenarios(&self) -> E2eResult<Vec<Scenario>> {
        match &self.scenarios_dir {
            Some(dir) => Scenario::load_all(dir),
            None => Scenario::builtin(),
        }
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "base_url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.workers == 0 {
            return Err(E2eError::Config("workers must be at least 1".to_string()));
        }
        if self.playwright.action_timeout_ms == 0 || self.playwright.scenario_timeout_ms == 0 {
            return Err(E2eError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playwright::Browser;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig::load(&dir.path().join("formprobe.toml")).unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formprobe.toml");
        std::fs::write(
            &path,
            r#"
base_url = "http://127.0.0.1:4173"
workers = 3

[playwright]
browser = "webkit"
action_timeout_ms = 2500
"#,
        )
        .unwrap();

        let config = RunnerConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:4173");
        assert_eq!(config.workers, 3);
        assert_eq!(config.playwright.browser, Browser::Webkit);
        assert_eq!(config.playwright.action_timeout_ms, 2500);
        assert_eq!(config.playwright.scenario_timeout_ms, 60_000);
        assert_eq!(config.form, FormLayout::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/formprobe.toml");
        let config = RunnerConfig {
            scenarios_dir: Some(PathBuf::from("scenarios")),
            preflight: true,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RunnerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formprobe.toml");

        std::fs::write(&path, "workers = 0\n").unwrap();
        assert!(matches!(RunnerConfig::load(&path), Err(E2eError::Config(_))));

        std::fs::write(&path, "base_url = \"ftp://example.com\"\n").unwrap();
        assert!(matches!(RunnerConfig::load(&path), Err(E2eError::Config(_))));

        std::fs::write(&path, "workers = \"many\"\n").unwrap();
        let err = RunnerConfig::load(&path).unwrap_err();
        assert!(matches!(err, E2eError::Toml(_)));
        assert!(err.is_setup());
    }
}
