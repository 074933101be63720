//! Scenario runner: loads the fixture, expands scenarios into plans, drives
//! them through a browser and judges the feedback text

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::artifacts::ScreenshotArtifact;
use crate::config::RunnerConfig;
use crate::error::{E2eError, E2eResult};
use crate::fixture::{TestData, UserFixture};
use crate::plan::{FormDriver, InteractionPlan};
use crate::scenario::Scenario;
use crate::target::TargetProbe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// Feedback did not satisfy the expectation
    Failed,
    /// The browser could not complete the interaction
    Errored,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub feedback: Option<String>,
    pub expected: Option<String>,
    pub error: Option<String>,
    pub screenshot: Option<ScreenshotArtifact>,
}

impl ScenarioResult {
    pub fn success(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    fn errored(name: &str, duration_ms: u64, err: String) -> Self {
        Self {
            name: name.to_string(),
            outcome: Outcome::Errored,
            duration_ms,
            feedback: None,
            expected: None,
            error: Some(err),
            screenshot: None,
        }
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    fn from_results(started_at: DateTime<Utc>, duration_ms: u64, results: Vec<ScenarioResult>) -> Self {
        let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            errored: count(Outcome::Errored),
            started_at,
            duration_ms,
            results,
        }
    }

    /// True when every scenario passed
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn artifacts(&self) -> Vec<&ScreenshotArtifact> {
        self.results.iter().filter_map(|r| r.screenshot.as_ref()).collect()
    }
}

/// Main scenario runner
pub struct ScenarioRunner<D> {
    config: Arc<RunnerConfig>,
    driver: Arc<D>,

    /// Loaded once per run, then handed out as per-scenario copies
    data: Option<Arc<TestData>>,
}

impl<D: FormDriver + 'static> ScenarioRunner<D> {
    pub fn new(config: RunnerConfig, driver: D) -> Self {
        Self {
            config: Arc::new(config),
            driver: Arc::new(driver),
            data: None,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Load the fixture; any failure here aborts the run
    pub fn load_fixture(&mut self) -> E2eResult<&TestData> {
        let data = match self.data.take() {
            Some(data) => data,
            None => Arc::new(TestData::from_file(&self.config.fixture_path)?),
        };
        let data: &TestData = self.data.insert(data);
        Ok(data)
    }

    /// Use already-loaded fixture data
    pub fn with_fixture(mut self, data: TestData) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Scenarios from the configured directory, or the bundled ones
    pub fn scenarios(&self) -> E2eResult<Vec<Scenario>> {
        self.config.load_scenarios()
    }

    /// Check the form page answers before spending browser time on it
    pub async fn preflight(&self) -> E2eResult<()> {
        let probe = TargetProbe::new(self.config.probe.clone())?;
        probe
            .wait_until_reachable(&self.config.form.url(&self.config.base_url))
            .await
    }

    /// Run every scenario
    pub async fn run_all(&mut self) -> E2eResult<SuiteResult> {
        let scenarios = self.scenarios()?;
        self.run_scenarios(&scenarios).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios = self.scenarios()?;
        let filtered: Vec<Scenario> = Scenario::filter_by_tag(&scenarios, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_scenarios(&filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&mut self, name: &str) -> E2eResult<SuiteResult> {
        let scenario = self
            .scenarios()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioParse(format!("Scenario not found: {}", name)))?;
        self.run_scenarios(std::slice::from_ref(&scenario)).await
    }

    /// Run a list of scenarios, at most `workers` at a time
    ///
    /// Results come back in input order. A scenario that fails or errors
    /// never stops its siblings.
    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        let data = Arc::clone(self.data_or_load()?);
        let started_at = Utc::now();
        let start = Instant::now();
        let permits = Arc::new(Semaphore::new(self.config.workers.max(1)));

        info!("Running {} scenario(s)...", scenarios.len());

        let mut handles = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let scenario = scenario.clone();
            let user = data.fork_user();
            let driver = Arc::clone(&self.driver);
            let config = Arc::clone(&self.config);
            let permits = Arc::clone(&permits);

            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await;
                run_scenario(driver.as_ref(), &config, &scenario, user).await
            }));
        }

        let mut results = Vec::with_capacity(scenarios.len());
        for (scenario, handle) in scenarios.iter().zip(handles) {
            let result = handle.await.unwrap_or_else(|e| {
                ScenarioResult::errored(&scenario.name, 0, format!("scenario task failed: {}", e))
            });

            if result.success() {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite = SuiteResult::from_results(started_at, start.elapsed().as_millis() as u64, results);

        info!("");
        info!(
            "Scenario results: {} passed, {} failed, {} errored ({} ms)",
            suite.passed, suite.failed, suite.errored, suite.duration_ms
        );

        Ok(suite)
    }

    fn data_or_load(&mut self) -> E2eResult<&Arc<TestData>> {
        if self.data.is_none() {
            self.load_fixture()?;
        }
        self.data
            .as_ref()
            .ok_or_else(|| E2eError::FixtureParse("fixture not loaded".to_string()))
    }

    /// Write scenario results and the screenshot manifest as JSON
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("results.json");
        std::fs::write(&path, serde_json::to_string_pretty(results)?)?;

        let manifest = self.config.output_dir.join("artifacts.json");
        std::fs::write(&manifest, serde_json::to_string_pretty(&results.artifacts())?)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Drive one scenario and judge its feedback
pub async fn run_scenario<D: FormDriver + ?Sized>(
    driver: &D,
    config: &RunnerConfig,
    scenario: &Scenario,
    user: UserFixture,
) -> ScenarioResult {
    let start = Instant::now();
    debug!("Running scenario: {}", scenario.name);

    let plan = InteractionPlan::for_scenario(
        scenario,
        &user,
        &config.form,
        &config.base_url,
        &config.screenshot_dir,
    );
    let screenshot_path = plan.screenshot_path().map(|p| p.to_path_buf());

    let observed = driver.run(&plan).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let observation = match observed {
        Ok(observation) => observation,
        Err(e) => {
            let mut result = ScenarioResult::errored(&scenario.name, duration_ms, e.to_string());
            result.screenshot = screenshot_path
                .filter(|p| p.exists())
                .and_then(|p| ScreenshotArtifact::record(&scenario.name, &p));
            return result;
        }
    };

    info!("[{}] feedback message: {}", scenario.name, observation.feedback);

    let verdict = if observation.submissions != 1 {
        Err(format!(
            "expected exactly one submission, observed {}",
            observation.submissions
        ))
    } else {
        scenario.expect.check(&observation.feedback).map_err(|e| e.to_string())
    };

    let screenshot = observation
        .screenshot
        .or(screenshot_path)
        .and_then(|p| ScreenshotArtifact::record(&scenario.name, &p));

    ScenarioResult {
        name: scenario.name.clone(),
        outcome: if verdict.is_ok() { Outcome::Passed } else { Outcome::Failed },
        duration_ms,
        feedback: Some(observation.feedback),
        expected: scenario.expect.expected().map(String::from),
        error: verdict.err(),
        screenshot,
    }
}
