//! Scenario runner behaviour against an in-process form model
//!
//! `SimulatedForm` stands in for the browser: it applies the demo page's
//! validation rules to whatever a plan fills in and answers with the same
//! messages the page shows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use formprobe_e2e::plan::Step;
use formprobe_e2e::runner::Outcome;
use formprobe_e2e::{
    E2eError, E2eResult, FormDriver, InteractionPlan, Observation, RunnerConfig, Scenario,
    ScenarioRunner, TestData,
};

const PASSWORD_MSG: &str = "The password should contain between [6,20] characters!";
const PHONE_MSG: &str = "The phone number should contain at least 10 characters!";
const SUCCESS_MSG: &str = "Successfully registered the following information";

#[derive(Default)]
struct SimulatedForm {
    /// Plans received, in call order
    calls: Mutex<Vec<InteractionPlan>>,
    /// Scenarios whose browser run fails outright
    broken: HashMap<String, String>,
    /// Scenarios that click submit twice
    double_submit: Vec<String>,
    /// Artificial per-scenario latency
    delays: HashMap<String, u64>,
    /// Write a screenshot file when the plan asks for one
    write_screenshots: bool,
}

impl SimulatedForm {
    fn respond(values: &HashMap<String, String>) -> String {
        let get = |sel: &str| values.get(sel).map(String::as_str).unwrap_or("");
        if get("#password").len() < 6 {
            PASSWORD_MSG.to_string()
        } else if get("#phone").len() < 10 {
            PHONE_MSG.to_string()
        } else {
            format!("{}: {}", SUCCESS_MSG, get("#emailAddress"))
        }
    }

    fn plans_for(&self, name: &str) -> Vec<InteractionPlan> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.scenario == name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FormDriver for SimulatedForm {
    async fn run(&self, plan: &InteractionPlan) -> E2eResult<Observation> {
        self.calls.lock().unwrap().push(plan.clone());

        if let Some(ms) = self.delays.get(&plan.scenario) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if let Some(reason) = self.broken.get(&plan.scenario) {
            return Err(E2eError::Timeout(reason.clone()));
        }

        let mut values = HashMap::new();
        let mut observation = Observation::default();
        for step in &plan.steps {
            match step {
                Step::Fill { selector, value } | Step::Select { selector, value } => {
                    values.insert(selector.clone(), value.clone());
                }
                Step::Submit { .. } => {
                    observation.submissions += 1;
                    if self.double_submit.contains(&plan.scenario) {
                        observation.submissions += 1;
                    }
                }
                Step::ReadText { .. } => observation.feedback = Self::respond(&values),
                Step::Screenshot { path } if self.write_screenshots => {
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(path, plan.scenario.as_bytes()).unwrap();
                    observation.screenshot = Some(path.clone());
                }
                _ => {}
            }
        }
        Ok(observation)
    }
}

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/data-test.json")
}

fn config(out: &Path) -> RunnerConfig {
    RunnerConfig {
        fixture_path: fixture_path(),
        output_dir: out.to_path_buf(),
        screenshot_dir: out.join("screenshots"),
        ..Default::default()
    }
}

fn outcomes(suite: &formprobe_e2e::SuiteResult) -> Vec<(String, Outcome)> {
    suite
        .results
        .iter()
        .map(|r| (r.name.clone(), r.outcome))
        .collect()
}

#[tokio::test]
async fn builtin_scenarios_pass_against_the_form() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = ScenarioRunner::new(config(out.path()), SimulatedForm::default());

    let suite = runner.run_all().await.unwrap();

    assert!(suite.success(), "{:#?}", suite.results);
    assert_eq!(suite.total, 5);
    assert_eq!(suite.passed, 5);
    let names: Vec<&str> = suite.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["empty-fields", "invalid-email", "valid-registration", "short-password", "short-phone"]
    );

    let by_name = |n: &str| suite.results.iter().find(|r| r.name == n).unwrap();
    assert_eq!(by_name("empty-fields").feedback.as_deref(), Some(PASSWORD_MSG));
    assert_eq!(by_name("short-password").expected.as_deref(), Some("6"));
    assert_eq!(by_name("short-phone").feedback.as_deref(), Some(PHONE_MSG));
    assert!(by_name("invalid-email")
        .feedback
        .as_deref()
        .unwrap()
        .contains("Successfully registered"));

    let smoke = by_name("valid-registration");
    assert_eq!(smoke.expected, None);
    assert!(smoke.feedback.as_deref().unwrap().starts_with(SUCCESS_MSG));
}

#[tokio::test]
async fn each_scenario_gets_its_own_fixture_copy() {
    let out = tempfile::tempdir().unwrap();
    let data = TestData::from_file(&fixture_path()).unwrap();
    let valid_email = data.valid_user.email.clone();

    let mut runner = ScenarioRunner::new(config(out.path()), SimulatedForm::default())
        .with_fixture(data.clone());
    runner.run_all().await.unwrap();
    let form = runner_driver(&runner);

    let email_in = |plan: &InteractionPlan| {
        plan.steps.iter().find_map(|s| match s {
            Step::Fill { selector, value } if selector == "#emailAddress" => Some(value.clone()),
            _ => None,
        })
    };

    assert_eq!(
        email_in(&form.plans_for("invalid-email")[0]).as_deref(),
        Some("invalidEmail")
    );
    for name in ["valid-registration", "short-password", "short-phone"] {
        assert_eq!(email_in(&form.plans_for(name)[0]), Some(valid_email.clone()), "{name}");
    }
    assert_eq!(email_in(&form.plans_for("empty-fields")[0]), None);
}

#[tokio::test]
async fn assertion_failure_reports_expected_and_actual() {
    let dir = tempfile::tempdir().unwrap();
    let scenarios = dir.path().join("scenarios");
    std::fs::create_dir_all(&scenarios).unwrap();
    std::fs::write(
        scenarios.join("01-strict-phone.yaml"),
        "name: strict-phone\nfields:\n  phone:\n    value: \"12345\"\n  password: fixture\nexpect:\n  contains: \"11\"\n",
    )
    .unwrap();
    std::fs::write(
        scenarios.join("02-smoke.yaml"),
        "name: smoke\nfields:\n  password: fixture\n  phone: fixture\nexpect: log_only\n",
    )
    .unwrap();

    let mut cfg = config(&dir.path().join("out"));
    cfg.scenarios_dir = Some(scenarios);
    let mut runner = ScenarioRunner::new(cfg, SimulatedForm::default());

    let suite = runner.run_all().await.unwrap();

    assert!(!suite.success());
    assert_eq!(
        outcomes(&suite),
        vec![
            ("strict-phone".to_string(), Outcome::Failed),
            ("smoke".to_string(), Outcome::Passed)
        ]
    );
    let failed = &suite.results[0];
    assert_eq!(failed.expected.as_deref(), Some("11"));
    assert_eq!(failed.feedback.as_deref(), Some(PHONE_MSG));
    let error = failed.error.as_deref().unwrap();
    assert!(error.contains("\"11\""), "{error}");
    assert!(error.contains(PHONE_MSG), "{error}");
}

#[tokio::test]
async fn driver_error_fails_only_that_scenario() {
    let out = tempfile::tempdir().unwrap();
    let form = SimulatedForm {
        broken: HashMap::from([(
            "short-password".to_string(),
            "fill:#password: Timeout 10000ms exceeded.".to_string(),
        )]),
        ..Default::default()
    };
    let mut runner = ScenarioRunner::new(config(out.path()), form);

    let suite = runner.run_all().await.unwrap();

    assert_eq!(suite.passed, 4);
    assert_eq!(suite.errored, 1);
    assert_eq!(suite.failed, 0);
    assert!(!suite.success());
    let errored = suite.results.iter().find(|r| r.name == "short-password").unwrap();
    assert_eq!(errored.outcome, Outcome::Errored);
    assert!(errored.error.as_deref().unwrap().contains("Timeout"));
    assert_eq!(runner_driver(&runner).calls.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn double_submission_is_a_failure() {
    let out = tempfile::tempdir().unwrap();
    let form = SimulatedForm {
        double_submit: vec!["invalid-email".to_string()],
        ..Default::default()
    };
    let mut runner = ScenarioRunner::new(config(out.path()), form);

    let suite = runner.run_all().await.unwrap();
    let result = suite.results.iter().find(|r| r.name == "invalid-email").unwrap();
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.error.as_deref().unwrap().contains("exactly one submission"));
    assert_eq!(suite.passed, 4);
}

#[tokio::test]
async fn missing_fixture_aborts_before_any_scenario() {
    let out = tempfile::tempdir().unwrap();
    let mut cfg = config(out.path());
    cfg.fixture_path = out.path().join("missing.json");
    let mut runner = ScenarioRunner::new(cfg, SimulatedForm::default());

    let err = runner.run_all().await.unwrap_err();

    assert!(matches!(err, E2eError::FixtureNotFound(_)));
    assert!(err.is_setup());
    assert!(runner_driver(&runner).calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_fixture_aborts_before_any_scenario() {
    let out = tempfile::tempdir().unwrap();
    let fixture = out.path().join("data-test.json");
    std::fs::write(&fixture, "{ \"validUser\": ").unwrap();
    let mut cfg = config(out.path());
    cfg.fixture_path = fixture;
    let mut runner = ScenarioRunner::new(cfg, SimulatedForm::default());

    assert!(matches!(runner.load_fixture(), Err(E2eError::FixtureParse(_))));
    assert!(runner.run_all().await.is_err());
    assert!(runner_driver(&runner).calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn single_scenario_matches_suite_outcome() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = ScenarioRunner::new(config(out.path()), SimulatedForm::default());
    let suite = runner.run_all().await.unwrap();

    for scenario in Scenario::builtin().unwrap() {
        let mut alone = ScenarioRunner::new(config(out.path()), SimulatedForm::default());
        let single = alone.run_named(&scenario.name).await.unwrap();
        assert_eq!(single.total, 1);

        let in_suite = suite.results.iter().find(|r| r.name == scenario.name).unwrap();
        assert_eq!(single.results[0].outcome, in_suite.outcome, "{}", scenario.name);
        assert_eq!(single.results[0].feedback, in_suite.feedback, "{}", scenario.name);
    }
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = ScenarioRunner::new(config(out.path()), SimulatedForm::default());

    let first = runner.run_all().await.unwrap();
    let second = runner.run_all().await.unwrap();
    let third = runner.run_tagged("validation").await.unwrap();

    assert_eq!(outcomes(&first), outcomes(&second));
    let validation: Vec<_> = outcomes(&first)
        .into_iter()
        .filter(|(n, _)| n != "valid-registration")
        .collect();
    assert_eq!(outcomes(&third), validation);
}

#[tokio::test]
async fn concurrent_workers_keep_catalogue_order() {
    let out = tempfile::tempdir().unwrap();
    let form = SimulatedForm {
        delays: HashMap::from([
            ("empty-fields".to_string(), 60),
            ("invalid-email".to_string(), 30),
            ("valid-registration".to_string(), 1),
        ]),
        ..Default::default()
    };
    let mut cfg = config(out.path());
    cfg.workers = 5;
    let mut runner = ScenarioRunner::new(cfg, form);

    let suite = runner.run_all().await.unwrap();

    assert!(suite.success());
    let names: Vec<&str> = suite.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["empty-fields", "invalid-email", "valid-registration", "short-password", "short-phone"]
    );
}

#[tokio::test]
async fn unknown_scenario_name_is_an_error() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = ScenarioRunner::new(config(out.path()), SimulatedForm::default());
    let err = runner.run_named("no-such-scenario").await.unwrap_err();
    assert!(matches!(err, E2eError::ScenarioParse(msg) if msg.contains("no-such-scenario")));
}

#[tokio::test]
async fn results_and_screenshot_manifest_are_written() {
    let out = tempfile::tempdir().unwrap();
    let form = SimulatedForm {
        write_screenshots: true,
        ..Default::default()
    };
    let mut runner = ScenarioRunner::new(config(out.path()), form);

    let suite = runner.run_all().await.unwrap();
    let path = runner.write_results(&suite).unwrap();

    assert_eq!(path, out.path().join("results.json"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["total"], 5);
    assert_eq!(written["results"][0]["outcome"], "passed");

    let manifest: Vec<serde_json::Value> = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("artifacts.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest.len(), 5);
    assert_eq!(manifest[4]["name"], "short-phone");
    assert!(out.path().join("screenshots/short-phone.png").exists());
    assert_eq!(manifest[4]["bytes"], "short-phone".len());
}

#[tokio::test]
async fn missing_screenshot_keeps_the_verdict() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = ScenarioRunner::new(config(out.path()), SimulatedForm::default());

    let suite = runner.run_named("short-password").await.unwrap();

    let result = &suite.results[0];
    assert_eq!(result.outcome, Outcome::Passed);
    assert_eq!(result.feedback.as_deref(), Some(PASSWORD_MSG));
    assert!(result.screenshot.is_none());
    assert!(suite.artifacts().is_empty());
}

fn runner_driver(runner: &ScenarioRunner<SimulatedForm>) -> &SimulatedForm {
    runner.driver()
}
