//! Timeline integration helpers
//!
//! Everything the host needs besides the records themselves: the permission
//! that guards them, the timeline filter and navigation entry to offer, and
//! the strings shown for each record.

use std::time::Duration;

use serde::Serialize;

use crate::domain::build::BuildRecord;

/// Permission required to see builds
pub const BUILD_VIEW: &str = "BUILD_VIEW";

/// Timeline filter name under which builds are listed
pub const BUILD_FILTER: &str = "build";

/// Browser target used when the main page opens in a new tab
pub const NEW_TAB_TARGET: &str = "hudson";

/// Navigation bar the entry belongs to
pub const NAV_CATEGORY: &str = "mainnav";

/// Id of the navigation entry; also the item to mark active on build pages
pub const NAV_NAME: &str = "builds";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Permission actions this integration defines
pub fn permission_actions() -> &'static [&'static str] {
    &[BUILD_VIEW]
}

/// A timeline filter the host can offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineFilter {
    pub name: &'static str,
    pub label: &'static str,
}

/// Filters available to a caller
pub fn timeline_filters(can_view: bool) -> Vec<TimelineFilter> {
    if !can_view {
        return Vec::new();
    }
    vec![TimelineFilter {
        name: BUILD_FILTER,
        label: "Hudson Builds",
    }]
}

/// Entry for the host's main navigation bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub category: &'static str,
    pub name: &'static str,
    pub label: &'static str,
    pub href: String,
    /// Browser target, set when the page should open in a new tab
    pub target: Option<&'static str>,
}

impl NavItem {
    pub fn new(href: impl Into<String>, new_tab: bool) -> Self {
        Self {
            category: NAV_CATEGORY,
            name: NAV_NAME,
            label: "Build",
            href: href.into(),
            target: new_tab.then_some(NEW_TAB_TARGET),
        }
    }
}

/// Navigation entry the host should highlight on build pages
pub fn active_navigation_item() -> &'static str {
    NAV_NAME
}

/// Field of a record the host asks to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineField {
    Title,
    Description,
    Url,
}

/// Render one field of a record as plain text
pub fn render_field(record: &BuildRecord, field: TimelineField) -> String {
    match field {
        TimelineField::Title => format!(
            "Build \"{}\" ({})",
            record.full_name,
            record.result.as_str().to_lowercase()
        ),
        TimelineField::Description => format!(
            "{} at {}, duration {}",
            record.message,
            record.completed.format(DATETIME_FORMAT),
            pretty_duration(record.completed.timestamp() - record.started.timestamp())
        ),
        TimelineField::Url => record.url.clone(),
    }
}

/// Coarse human-readable length of a build, e.g. "5 minutes"
pub fn pretty_duration(seconds: i64) -> String {
    let mut formatter = timeago::Formatter::new();
    formatter.too_low("0 seconds").num_items(1);
    let text = formatter.convert(Duration::from_secs(seconds.unsigned_abs()));
    // The formatter speaks in relative time; only the length is wanted here.
    text.strip_suffix(" ago").unwrap_or(&text).trim().to_string()
}

/// Hover details for one build, keyed by url on the page
#[derive(Debug, Serialize)]
struct CalloutEntry<'a> {
    url: &'a str,
    message: &'a str,
    name: &'a str,
    author: &'a str,
}

/// JSON list of build details for the timeline's hover callout
pub fn builds_json(records: &[BuildRecord]) -> serde_json::Result<String> {
    let entries: Vec<CalloutEntry<'_>> = records
        .iter()
        .map(|record| CalloutEntry {
            url: &record.url,
            message: &record.message,
            name: &record.full_name,
            author: &record.author,
        })
        .collect();
    serde_json::to_string(&entries)
}
