//! Registration form model: the fields a scenario can populate and the
//! selectors used to reach them on the page

use serde::{Deserialize, Serialize};
use std::fmt;

/// A field of the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    FirstName,
    LastName,
    Phone,
    Country,
    Email,
    Password,
}

/// How a field is populated in the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Text input, populated with `fill`
    Input,
    /// Dropdown, populated with `selectOption`
    Select,
}

impl FormField {
    /// Every field in the order it appears on the form
    pub const ALL: [FormField; 6] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Phone,
        FormField::Country,
        FormField::Email,
        FormField::Password,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::FirstName => "first_name",
            FormField::LastName => "last_name",
            FormField::Phone => "phone",
            FormField::Country => "country",
            FormField::Email => "email",
            FormField::Password => "password",
        }
    }

    pub fn control(&self) -> ControlKind {
        match self {
            FormField::Country => ControlKind::Select,
            _ => ControlKind::Input,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectors for one field per control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: String,
    pub email: String,
    pub password: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            first_name: "#firstName".to_string(),
            last_name: "#lastName".to_string(),
            phone: "#phone".to_string(),
            country: "#countries_dropdown_menu".to_string(),
            email: "#emailAddress".to_string(),
            password: "#password".to_string(),
        }
    }
}

/// Page layout of the form under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormLayout {
    /// Path of the form page, relative to the base URL
    pub path: String,

    /// Per-field selectors
    pub fields: FieldSelectors,

    /// Submit control
    pub submit: String,

    /// Element whose text carries validation or success feedback
    pub feedback: String,

    /// Element that must be visible before the form is touched
    pub ready: String,
}

impl Default for FormLayout {
    fn default() -> Self {
        Self {
            path: "/bugs-form".to_string(),
            fields: FieldSelectors::default(),
            submit: "#registerBtn".to_string(),
            feedback: "#message".to_string(),
            ready: "#registerBtn".to_string(),
        }
    }
}

impl FormLayout {
    pub fn selector(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.fields.first_name,
            FormField::LastName => &self.fields.last_name,
            FormField::Phone => &self.fields.phone,
            FormField::Country => &self.fields.country,
            FormField::Email => &self.fields.email,
            FormField::Password => &self.fields.password,
        }
    }

    /// Full URL of the form for a given base
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}
