//! formprobe E2E scenario runner
//!
//! This crate drives a registration form through Playwright from Rust:
//! - Loads a known-valid user fixture (JSON) once per run
//! - Parses declarative YAML scenarios that override or omit fields
//! - Expands each scenario into a single-submit interaction plan
//! - Runs each plan as its own Playwright script and browser context
//! - Asserts the feedback element's text and records screenshots
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 E2E Scenario Runner (Rust)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner<D: FormDriver>                              │
//! │    ├── load_fixture() -> TestData          (fail-closed)    │
//! │    ├── preflight()                         (optional)       │
//! │    ├── run_scenarios([Scenario]) -> SuiteResult             │
//! │    └── write_results(SuiteResult)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags, screenshot                  │
//! │    ├── fields: { field: fixture | { value } }               │
//! │    └── expect: { contains } | log_only                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  InteractionPlan                                            │
//! │    navigate → fill/select → submit → read → screenshot      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifacts;
pub mod config;
pub mod error;
pub mod fixture;
pub mod form;
pub mod plan;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod target;

pub use config::RunnerConfig;
pub use error::{E2eError, E2eResult};
pub use fixture::{TestData, UserFixture};
pub use plan::{FormDriver, InteractionPlan, Observation};
pub use runner::{ScenarioRunner, SuiteResult};
pub use scenario::{Expectation, Scenario};
