//! Diagnostic screenshot artifacts
//!
//! Screenshots are never compared or asserted on. The runner only records
//! where each one landed, how big it is and its SHA-256, so a report can be
//! matched to the files a CI job uploaded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::E2eResult;

/// A screenshot captured for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotArtifact {
    /// Scenario the screenshot belongs to
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

impl ScreenshotArtifact {
    /// Hash a screenshot on disk
    pub fn from_file(name: &str, path: &Path) -> E2eResult<Self> {
        let content = std::fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&content);

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            sha256: hex::encode(hasher.finalize()),
            bytes: content.len() as u64,
        })
    }

    /// Record a screenshot if it exists; a missing or unreadable file only warns
    pub fn record(name: &str, path: &Path) -> Option<Self> {
        match Self::from_file(name, path) {
            Ok(artifact) => {
                debug!("Screenshot for '{}': {} ({} bytes)", name, path.display(), artifact.bytes);
                Some(artifact)
            }
            Err(e) => {
                warn!("No screenshot for '{}' at {}: {}", name, path.display(), e);
                None
            }
        }
    }
}

/// Turn a scenario name into a safe file stem
pub fn screenshot_file_name(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "screenshot".to_string()
    } else {
        stem.to_string()
    }
}
