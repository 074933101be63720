//! Error types for E2E testing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Fixture not found: {}", .0.display())]
    FixtureNotFound(PathBuf),

    #[error("Fixture parse error: {0}")]
    FixtureParse(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: expected feedback containing {expected:?}, got {actual:?}")]
    AssertionFailed { expected: String, actual: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Errors that abort the whole run before any scenario executes
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            E2eError::FixtureNotFound(_)
                | E2eError::FixtureParse(_)
                | E2eError::ScenarioParse(_)
                | E2eError::Config(_)
                | E2eError::PlaywrightNotFound
                | E2eError::TargetUnreachable { .. }
                | E2eError::Toml(_)
        )
    }

    /// Process exit status for a run that ended with this error
    pub fn exit_code(&self) -> i32 {
        if self.is_setup() {
            2
        } else {
            1
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_classification() {
        assert!(E2eError::FixtureNotFound(PathBuf::from("data.json")).is_setup());
        assert!(E2eError::PlaywrightNotFound.is_setup());
        assert!(!E2eError::Timeout("#message".into()).is_setup());
        assert!(!E2eError::AssertionFailed {
            expected: "6".into(),
            actual: String::new(),
        }
        .is_setup());
    }

    #[test]
    fn test_exit_code_follows_classification() {
        assert_eq!(E2eError::Config("workers must be at least 1".into()).exit_code(), 2);
        assert_eq!(
            E2eError::TargetUnreachable {
                url: "https://qa-practice.netlify.app/bugs-form".into(),
                attempts: 5,
            }
            .exit_code(),
            2
        );
        assert_eq!(E2eError::Playwright("browser crashed".into()).exit_code(), 1);
        assert_eq!(E2eError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).exit_code(), 1);
    }

    #[test]
    fn test_assertion_message_reports_both_texts() {
        let err = E2eError::AssertionFailed {
            expected: "10".into(),
            actual: "Phone must be 9 digits".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"10\""));
        assert!(msg.contains("Phone must be 9 digits"));
    }
}
