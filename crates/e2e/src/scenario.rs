//! Declarative YAML scenarios
//!
//! A scenario names the form fields to populate, where each value comes
//! from (the fixture or a literal override) and what the feedback element
//! must say after a single submit. Fields a scenario does not list are left
//! as the page renders them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::artifacts::screenshot_file_name;
use crate::error::{E2eError, E2eResult};
use crate::fixture::UserFixture;
use crate::form::FormField;

const BUILTIN: [(&str, &str); 5] = [
    ("01-empty-fields.yaml", include_str!("../scenarios/01-empty-fields.yaml")),
    ("02-invalid-email.yaml", include_str!("../scenarios/02-invalid-email.yaml")),
    ("03-valid-registration.yaml", include_str!("../scenarios/03-valid-registration.yaml")),
    ("04-short-password.yaml", include_str!("../scenarios/04-short-password.yaml")),
    ("05-short-phone.yaml", include_str!("../scenarios/05-short-phone.yaml")),
];

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Screenshot file stem; defaults to the scenario name
    #[serde(default)]
    pub screenshot: Option<String>,

    /// Fields to populate, in form order
    #[serde(default)]
    pub fields: BTreeMap<FormField, FieldSource>,

    /// What the feedback text must satisfy
    pub expect: Expectation,
}

/// Where a field's value comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSource {
    /// `fixture`: the valid user's value for this field
    Fixture(FixtureRef),
    /// `{ value: ... }`: a literal override
    Override { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureRef {
    Fixture,
}

/// Outcome check applied to the feedback element's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    /// `{ contains: ... }`: substring containment
    Contains { contains: String },
    /// `log_only`: read and log, never fail
    Mode(ExpectMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectMode {
    LogOnly,
}

impl Expectation {
    pub fn contains(text: impl Into<String>) -> Self {
        Expectation::Contains { contains: text.into() }
    }

    pub fn log_only() -> Self {
        Expectation::Mode(ExpectMode::LogOnly)
    }

    /// The substring being asserted, if any
    pub fn expected(&self) -> Option<&str> {
        match self {
            Expectation::Contains { contains } => Some(contains),
            Expectation::Mode(ExpectMode::LogOnly) => None,
        }
    }

    /// Check feedback text against this expectation
    pub fn check(&self, feedback: &str) -> E2eResult<()> {
        match self {
            Expectation::Contains { contains } if !feedback.contains(contains.as_str()) => {
                Err(E2eError::AssertionFailed {
                    expected: contains.clone(),
                    actual: feedback.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// One resolved field to populate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInput {
    pub field: FormField,
    pub value: String,
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        if scenario.name.trim().is_empty() {
            return Err(E2eError::ScenarioParse("scenario name is empty".to_string()));
        }
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, ordered by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario directory not found: {}",
                dir.display()
            )));
        }

        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        ensure_unique(&scenarios)?;
        Ok(scenarios)
    }

    /// The scenarios bundled with the crate
    pub fn builtin() -> E2eResult<Vec<Self>> {
        let scenarios = BUILTIN
            .iter()
            .map(|(file, yaml)| {
                Self::from_yaml(yaml).map_err(|e| E2eError::ScenarioParse(format!("{file}: {e}")))
            })
            .collect::<E2eResult<Vec<_>>>()?;
        ensure_unique(&scenarios)?;
        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// File stem for this scenario's screenshot
    pub fn screenshot_name(&self) -> String {
        screenshot_file_name(self.screenshot.as_deref().unwrap_or(&self.name))
    }

    /// Resolve the listed fields against a fixture, in form order
    pub fn resolve(&self, user: &UserFixture) -> Vec<FieldInput> {
        self.fields
            .iter()
            .map(|(field, source)| FieldInput {
                field: *field,
                value: match source {
                    FieldSource::Fixture(_) => user.value_of(*field).to_string(),
                    FieldSource::Override { value } => value.clone(),
                },
            })
            .collect()
    }
}

fn ensure_unique(scenarios: &[Scenario]) -> E2eResult<()> {
    let mut seen = HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(E2eError::ScenarioParse(format!(
                "duplicate scenario name: {}",
                scenario.name
            )));
        }
    }
    Ok(())
}
