//! Playwright browser automation
//!
//! Each plan becomes one Node script that owns a fresh browser and context.
//! The script reports back through `FORMPROBE_EVENT {json}` lines on stdout.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};
use crate::plan::{FormDriver, InteractionPlan, Observation, Step};

const EVENT_MARKER: &str = "FORMPROBE_EVENT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Default timeout for every page action
    pub action_timeout_ms: u64,

    /// Upper bound for a whole scenario process
    pub scenario_timeout_ms: u64,

    /// Node executable
    pub node_binary: PathBuf,

    /// npx executable, used to check that Playwright is installed
    pub npx_binary: PathBuf,

    /// Directory holding the `playwright` package, exported as NODE_PATH
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 10_000,
            scenario_timeout_ms: 60_000,
            node_binary: PathBuf::from("node"),
            npx_binary: PathBuf::from("npx"),
            node_path: None,
        }
    }
}

/// Structured line emitted by a generated script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Submitted,
    Feedback { text: String },
    Screenshot { path: PathBuf },
    /// Capture failed; diagnostic only
    ScreenshotFailed { path: PathBuf, message: String },
    Error {
        step: String,
        message: String,
        #[serde(default)]
        timeout: bool,
    },
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle, verifying the toolchain first
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config)?;
        Ok(Self::without_check(config))
    }

    /// Like `new`, but a missing Playwright yields `None` when skipping is allowed
    pub fn connect(config: PlaywrightConfig, skip_without_browser: bool) -> E2eResult<Option<Self>> {
        match Self::new(config) {
            Ok(handle) => Ok(Some(handle)),
            Err(E2eError::PlaywrightNotFound) if skip_without_browser => {
                warn!("Playwright not found; skipping browser scenarios");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a handle without probing for Playwright
    pub fn without_check(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    /// Check if Playwright is installed
    fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let output = Command::new(&config.npx_binary)
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a plan
    pub fn build_script(&self, plan: &InteractionPlan) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');

const emit = (event, data) =>
  console.log('{marker} ' + JSON.stringify(Object.assign({{ event }}, data)));

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  let step = 'launch';

  try {{
"#,
            marker = EVENT_MARKER,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            timeout = self.config.action_timeout_ms,
        ));

        for (i, step) in plan.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.label()));
            script.push_str(&format!("    step = {};\n", js_str(&step.label())));
            script.push_str(&self.step_to_js(step, i));
            script.push('\n');
        }

        // Best-effort capture of the failing page
        let failure_shot = plan
            .screenshot_path()
            .map(|p| {
                format!(
                    "\n    await page.screenshot({{ path: {}, fullPage: true }}).catch(() => {{}});",
                    js_str(&p.to_string_lossy())
                )
            })
            .unwrap_or_default();

        script.push_str(&format!(
            r#"
  }} catch (error) {{
    emit('error', {{ step, message: error.message, timeout: error.name === 'TimeoutError' }});{failure_shot}
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#
        ));

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &Step, step_index: usize) -> String {
        match step {
            Step::Navigate { url, wait_for } => format!(
                "    await page.goto({});\n    await page.waitForSelector({}, {{ state: 'visible' }});",
                js_str(url),
                js_str(wait_for)
            ),
            Step::Fill { selector, value } => {
                format!("    await page.fill({}, {});", js_str(selector), js_str(value))
            }
            Step::Select { selector, value } => format!(
                "    await page.selectOption({}, {});",
                js_str(selector),
                js_str(value)
            ),
            Step::Submit { selector } => format!(
                "    await page.click({});\n    emit('submitted', {{}});",
                js_str(selector)
            ),
            Step::ReadText { selector } => {
                let sel = js_str(selector);
                format!(
                    r#"    await page.waitForFunction(
      (sel) => {{ const el = document.querySelector(sel); return !!el && el.innerText.trim().length > 0; }},
      {sel},
      {{ timeout: {timeout} }}
    ).catch(() => {{}});
    const text_{i} = await page.locator({sel}).innerText();
    emit('feedback', {{ text: text_{i} }});"#,
                    sel = sel,
                    timeout = self.config.action_timeout_ms,
                    i = step_index,
                )
            }
            Step::Screenshot { path } => {
                let path = js_str(&path.to_string_lossy());
                format!(
                    r#"    await page.screenshot({{ path: {path}, fullPage: true }}).then(
      () => emit('screenshot', {{ path: {path} }}),
      (e) => emit('screenshot_failed', {{ path: {path}, message: e.message }})
    );"#
                )
            }
        }
    }

    /// Execute a script via node and collect its events
    pub async fn run_script(&self, script: &str) -> E2eResult<Vec<ScriptEvent>> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut cmd = TokioCommand::new(&self.config.node_binary);
        cmd.arg(&script_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let child = cmd.spawn().map_err(|e| {
            E2eError::Playwright(format!(
                "failed to spawn {}: {}",
                self.config.node_binary.display(),
                e
            ))
        })?;

        let limit = Duration::from_millis(self.config.scenario_timeout_ms);
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(E2eError::Timeout(format!(
                    "scenario process after {} ms",
                    self.config.scenario_timeout_ms
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let events = parse_events(&stdout);

        if let Some(err) = events.iter().find_map(script_error) {
            return Err(err);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(events)
    }
}

#[async_trait]
impl FormDriver for PlaywrightHandle {
    async fn run(&self, plan: &InteractionPlan) -> E2eResult<Observation> {
        if let Some(path) = plan.screenshot_path().and_then(|p| p.parent()) {
            std::fs::create_dir_all(path)?;
        }

        let script = self.build_script(plan);
        let events = self.run_script(&script).await?;
        debug!("[{}] {} event(s) from browser", plan.scenario, events.len());
        Ok(observe(&events))
    }
}

/// Fold script events into an observation
pub fn observe(events: &[ScriptEvent]) -> Observation {
    let mut observation = Observation::default();
    for event in events {
        match event {
            ScriptEvent::Submitted => observation.submissions += 1,
            ScriptEvent::Feedback { text } => observation.feedback = text.clone(),
            ScriptEvent::Screenshot { path } => observation.screenshot = Some(path.clone()),
            ScriptEvent::ScreenshotFailed { path, message } => {
                warn!("Screenshot {} not captured: {}", path.display(), message)
            }
            ScriptEvent::Error { .. } => {}
        }
    }
    observation
}

fn script_error(event: &ScriptEvent) -> Option<E2eError> {
    match event {
        ScriptEvent::Error { step, message, timeout: true } => {
            Some(E2eError::Timeout(format!("{}: {}", step, message)))
        }
        ScriptEvent::Error { step, message, .. } => Some(E2eError::StepFailed {
            step: step.clone(),
            reason: message.clone(),
        }),
        _ => None,
    }
}

static EVENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{}\s+(\{{.*\}})\s*$", EVENT_MARKER)).expect("event regex is valid")
});

/// Extract structured events from script stdout
pub fn parse_events(stdout: &str) -> Vec<ScriptEvent> {
    let mut events = Vec::new();
    for line in stdout.lines() {
        match EVENT_LINE.captures(line) {
            Some(caps) => match serde_json::from_str::<ScriptEvent>(&caps[1]) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Unparseable script event {:?}: {}", line, e),
            },
            None if !line.trim().is_empty() => debug!("[node] {}", line),
            None => {}
        }
    }
    events
}

/// Render a string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
