//! Fixture data: the known-valid user record scenarios start from

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::form::FormField;

/// A user the form accepts as a valid registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserFixture {
    pub first_name: String,
    pub last_name: String,
    /// Digit string
    pub phone: String,
    /// Option value of the country dropdown
    pub country: String,
    pub email: String,
    pub password: String,
}

impl UserFixture {
    pub fn value_of(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Phone => &self.phone,
            FormField::Country => &self.country,
            FormField::Email => &self.email,
            FormField::Password => &self.password,
        }
    }

    fn validate(&self) -> E2eResult<()> {
        for field in FormField::ALL {
            if self.value_of(field).trim().is_empty() {
                return Err(E2eError::FixtureParse(format!("validUser.{field} is empty")));
            }
        }
        if !self.phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(E2eError::FixtureParse(format!(
                "validUser.phone must be digits only, got {:?}",
                self.phone
            )));
        }
        Ok(())
    }
}

/// The fixture document as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestData {
    pub valid_user: UserFixture,
}

impl TestData {
    /// Parse fixture data from a JSON string
    pub fn from_json(json: &str) -> E2eResult<Self> {
        let data: Self =
            serde_json::from_str(json).map_err(|e| E2eError::FixtureParse(e.to_string()))?;
        data.valid_user.validate()?;
        Ok(data)
    }

    /// Load fixture data from a JSON file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        if !path.is_file() {
            return Err(E2eError::FixtureNotFound(path.to_path_buf()));
        }
        debug!("Loading fixture data from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// An independent copy of the valid user for one scenario
    pub fn fork_user(&self) -> UserFixture {
        self.valid_user.clone()
    }
}
