//! Interaction plans: the browser steps one scenario expands into, and the
//! driver seam that executes them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::E2eResult;
use crate::fixture::UserFixture;
use crate::form::{ControlKind, FormLayout};
use crate::scenario::Scenario;

/// A single browser step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a page and wait for an element to become visible
    Navigate { url: String, wait_for: String },

    /// Fill a text input
    Fill { selector: String, value: String },

    /// Choose a dropdown option by value
    Select { selector: String, value: String },

    /// Click the submit control
    Submit { selector: String },

    /// Wait for text to appear in an element, then read it
    ReadText { selector: String },

    /// Capture the page
    Screenshot { path: PathBuf },
}

impl Step {
    /// Short label used in logs and error reports
    pub fn label(&self) -> String {
        match self {
            Step::Navigate { url, .. } => format!("navigate:{}", url),
            Step::Fill { selector, .. } => format!("fill:{}", selector),
            Step::Select { selector, .. } => format!("select:{}", selector),
            Step::Submit { selector } => format!("submit:{}", selector),
            Step::ReadText { selector } => format!("read:{}", selector),
            Step::Screenshot { path } => format!("screenshot:{}", path.display()),
        }
    }
}

/// Everything a driver needs to run one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPlan {
    pub scenario: String,
    pub steps: Vec<Step>,
}

impl InteractionPlan {
    /// Expand a scenario into steps: navigate, populate, submit once, read, capture
    pub fn for_scenario(
        scenario: &Scenario,
        user: &UserFixture,
        layout: &FormLayout,
        base_url: &str,
        screenshot_dir: &Path,
    ) -> Self {
        let mut steps = vec![Step::Navigate {
            url: layout.url(base_url),
            wait_for: layout.ready.clone(),
        }];

        for input in scenario.resolve(user) {
            let selector = layout.selector(input.field).to_string();
            steps.push(match input.field.control() {
                ControlKind::Input => Step::Fill { selector, value: input.value },
                ControlKind::Select => Step::Select { selector, value: input.value },
            });
        }

        steps.push(Step::Submit { selector: layout.submit.clone() });
        steps.push(Step::ReadText { selector: layout.feedback.clone() });
        steps.push(Step::Screenshot {
            path: screenshot_dir.join(format!("{}.png", scenario.screenshot_name())),
        });

        Self {
            scenario: scenario.name.clone(),
            steps,
        }
    }

    /// Number of submit steps in the plan
    pub fn submissions(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, Step::Submit { .. })).count()
    }

    pub fn screenshot_path(&self) -> Option<&Path> {
        self.steps.iter().find_map(|s| match s {
            Step::Screenshot { path } => Some(path.as_path()),
            _ => None,
        })
    }
}

/// What the browser reported after running a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Text of the feedback element, empty if never read
    pub feedback: String,

    /// Submit clicks that actually happened
    pub submissions: usize,

    /// Screenshot written by the browser, if any
    pub screenshot: Option<PathBuf>,
}

/// Executes interaction plans against a browser
#[async_trait]
pub trait FormDriver: Send + Sync {
    async fn run(&self, plan: &InteractionPlan) -> E2eResult<Observation>;
}
