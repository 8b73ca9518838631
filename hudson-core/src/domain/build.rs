//! Build domain types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One build as shown in the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Display name assigned by the server, e.g. "myjob #42"
    pub full_name: String,
    /// `full_name` without the trailing build number
    pub module: String,
    pub url: String,
    /// Who triggered the build; may be empty
    pub author: String,
    pub result: BuildResult,
    pub message: String,
    pub started: DateTime<Utc>,
    /// Approximated with the extraction time while the build is running
    pub completed: DateTime<Utc>,
    pub kind: BuildKind,
}

/// Build result as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildResult {
    Success,
    Unstable,
    Aborted,
    InProgress,
    /// Anything else, including `FAILURE` itself. Keeps the raw text.
    Failure(String),
}

impl BuildResult {
    /// Interpret the text of a `result` element
    ///
    /// Never yields `InProgress`: a running build is recognized by its
    /// `building` flag, not by its result text.
    pub fn parse(text: &str) -> Self {
        match text {
            "SUCCESS" => Self::Success,
            "UNSTABLE" => Self::Unstable,
            "ABORTED" => Self::Aborted,
            other => Self::Failure(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unstable => "UNSTABLE",
            Self::Aborted => "ABORTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Failure(raw) => raw,
        }
    }

    /// Canned timeline message and presentation tag for this result
    pub fn classify(&self, alternate_success_icon: bool) -> (&'static str, BuildKind) {
        match self {
            Self::Success if alternate_success_icon => {
                ("Build finished successfully", BuildKind::SuccessfulAlt)
            }
            Self::Success => ("Build finished successfully", BuildKind::Successful),
            Self::Unstable => ("Build unstable", BuildKind::Unstable),
            Self::Aborted => ("Build aborted", BuildKind::Aborted),
            Self::InProgress => ("Build in progress", BuildKind::InProgress),
            Self::Failure(_) => ("Build failed", BuildKind::Failed),
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for BuildResult {
    fn from(text: String) -> Self {
        match text.as_str() {
            "IN_PROGRESS" => Self::InProgress,
            other => Self::parse(other),
        }
    }
}

impl From<BuildResult> for String {
    fn from(result: BuildResult) -> Self {
        result.as_str().to_string()
    }
}

/// Presentation tag the host uses to pick an icon or CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildKind {
    #[serde(rename = "build-successful")]
    Successful,
    #[serde(rename = "build-successful-alt")]
    SuccessfulAlt,
    #[serde(rename = "build-unstable")]
    Unstable,
    #[serde(rename = "build-aborted")]
    Aborted,
    #[serde(rename = "build-inprogress")]
    InProgress,
    #[serde(rename = "build-failed")]
    Failed,
}

impl BuildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "build-successful",
            Self::SuccessfulAlt => "build-successful-alt",
            Self::Unstable => "build-unstable",
            Self::Aborted => "build-aborted",
            Self::InProgress => "build-inprogress",
            Self::Failed => "build-failed",
        }
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip the trailing "#<number>" from a display name
///
/// Everything from the last `#` onward is removed; a name without `#` is
/// returned unchanged.
pub fn module_name(full_name: &str) -> &str {
    match full_name.rfind('#') {
        Some(idx) => &full_name[..idx],
        None => full_name,
    }
}
