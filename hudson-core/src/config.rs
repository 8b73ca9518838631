//! Hudson configuration
//!
//! The options a host supplies once per extraction: where the server lives,
//! how to authenticate, and which builds and texts to show.

use serde::Deserialize;

use crate::extract::ExtractOptions;
use crate::query::{QueryTemplate, build_query_template};

/// Hudson integration settings
///
/// Deserializable with defaults for every field, so a host can load it
/// straight from its own configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HudsonConfig {
    /// Show builds of modules too (may slow down the timeline noticeably)
    pub display_modules: bool,

    /// Absolute url of the server's top-level page, or of a single job
    /// (e.g. "http://localhost/hudson/job/build_foo/")
    pub job_url: String,

    pub username: String,
    pub password: String,

    /// Target of the navigation entry; empty means `job_url`
    pub main_page: String,

    /// Open the navigation target in a new tab/window
    pub display_in_new_tab: bool,

    /// Use the alternate success icon (green ball instead of blue)
    pub alternate_success_icon: bool,

    /// Show each build's description instead of the canned message
    pub display_build_descriptions: bool,

    /// Show builds that are still running
    pub display_building: bool,
}

impl HudsonConfig {
    /// Creates a new configuration with defaults for the given server or job
    pub fn new(job_url: impl Into<String>) -> Self {
        Self {
            job_url: job_url.into(),
            ..Self::default()
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - HUDSON_JOB_URL (required)
    /// - HUDSON_USERNAME, HUDSON_PASSWORD (optional, default: empty)
    /// - HUDSON_MAIN_PAGE (optional, default: empty)
    /// - HUDSON_DISPLAY_MODULES (optional, default: false)
    /// - HUDSON_DISPLAY_IN_NEW_TAB (optional, default: false)
    /// - HUDSON_ALTERNATE_SUCCESS_ICON (optional, default: false)
    /// - HUDSON_DISPLAY_BUILD_DESCRIPTIONS (optional, default: true)
    /// - HUDSON_DISPLAY_BUILDING (optional, default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        let job_url = std::env::var("HUDSON_JOB_URL")
            .map_err(|_| anyhow::anyhow!("HUDSON_JOB_URL environment variable not set"))?;

        let defaults = Self::default();

        Ok(Self {
            display_modules: env_flag("HUDSON_DISPLAY_MODULES", defaults.display_modules),
            job_url,
            username: std::env::var("HUDSON_USERNAME").unwrap_or_default(),
            password: std::env::var("HUDSON_PASSWORD").unwrap_or_default(),
            main_page: std::env::var("HUDSON_MAIN_PAGE").unwrap_or_default(),
            display_in_new_tab: env_flag("HUDSON_DISPLAY_IN_NEW_TAB", defaults.display_in_new_tab),
            alternate_success_icon: env_flag(
                "HUDSON_ALTERNATE_SUCCESS_ICON",
                defaults.alternate_success_icon,
            ),
            display_build_descriptions: env_flag(
                "HUDSON_DISPLAY_BUILD_DESCRIPTIONS",
                defaults.display_build_descriptions,
            ),
            display_building: env_flag("HUDSON_DISPLAY_BUILDING", defaults.display_building),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.job_url.is_empty() {
            anyhow::bail!("job_url cannot be empty");
        }

        if !self.job_url.starts_with("http://") && !self.job_url.starts_with("https://") {
            anyhow::bail!("job_url must be an absolute http:// or https:// url");
        }

        Ok(())
    }

    /// Whether requests should carry credentials
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }

    /// Query template for this server or job
    pub fn query_template(&self) -> QueryTemplate {
        build_query_template(&self.job_url, self.display_modules)
    }

    /// Extraction flags taken from this configuration
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            display_building: self.display_building,
            use_description: self.display_build_descriptions,
            alternate_success_icon: self.alternate_success_icon,
        }
    }

    /// Link target of the navigation entry
    pub fn main_page_url(&self) -> &str {
        if self.main_page.is_empty() {
            &self.job_url
        } else {
            &self.main_page
        }
    }
}

impl Default for HudsonConfig {
    fn default() -> Self {
        Self {
            display_modules: false,
            job_url: "http://localhost/hudson/".to_string(),
            username: String::new(),
            password: String::new(),
            main_page: String::new(),
            display_in_new_tab: false,
            alternate_success_icon: false,
            display_build_descriptions: true,
            display_building: false,
        }
    }
}

/// Reads a boolean environment variable, falling back to `default` when unset
/// or unrecognized
fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}
