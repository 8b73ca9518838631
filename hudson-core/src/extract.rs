//! Build extraction
//!
//! Turns the XML answer of a build-info query into [`BuildRecord`]s. The
//! document is parsed fully up front; records are then produced lazily, in
//! document order, as the host consumes them.

use chrono::{DateTime, Utc};
use roxmltree::{Descendants, Document, Node};

use crate::domain::build::{BuildRecord, BuildResult, module_name};
use crate::error::{BuildInfoError, Result};

/// Name of the wrapper element the query asks the server for
const ROOT_ELEMENT: &str = "builds";

/// Flags controlling which builds are emitted and how they read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Emit running builds instead of skipping them
    pub display_building: bool,
    /// Prefer a build's description over the canned message
    pub use_description: bool,
    /// Tag successful builds with the alternate icon
    pub alternate_success_icon: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            display_building: false,
            use_description: true,
            alternate_success_icon: false,
        }
    }
}

/// A parsed build-info document whose root has been checked
pub struct BuildDocument<'input> {
    doc: Document<'input>,
}

impl<'input> BuildDocument<'input> {
    /// Parse a build-info answer fetched from `source_url`
    ///
    /// Fails with [`BuildInfoError::Fetch`] when the text is not well-formed
    /// XML and with [`BuildInfoError::MalformedResponse`] when the root
    /// element is not `builds`.
    pub fn parse(xml: &'input str, source_url: &str) -> Result<Self> {
        let doc = Document::parse(xml)
            .map_err(|e| BuildInfoError::fetch(source_url, "XmlError", e))?;

        let root = doc.root_element().tag_name().name();
        if root != ROOT_ELEMENT {
            return Err(BuildInfoError::MalformedResponse {
                url: source_url.to_string(),
                root: root.to_string(),
            });
        }

        Ok(Self { doc })
    }

    /// Records for every build in the document, stamping running builds with
    /// the current time
    pub fn builds(&self, options: &ExtractOptions) -> Builds<'_, 'input> {
        self.builds_at(options, Utc::now())
    }

    /// Records for every build in the document, stamping running builds with
    /// `now`
    pub fn builds_at(&self, options: &ExtractOptions, now: DateTime<Utc>) -> Builds<'_, 'input> {
        Builds {
            nodes: self.doc.root_element().descendants(),
            options: *options,
            now,
        }
    }
}

/// Lazy, one-shot sequence of build records
pub struct Builds<'a, 'input> {
    nodes: Descendants<'a, 'input>,
    options: ExtractOptions,
    now: DateTime<Utc>,
}

impl Iterator for Builds<'_, '_> {
    type Item = BuildRecord;

    fn next(&mut self) -> Option<BuildRecord> {
        for node in self.nodes.by_ref() {
            if !node.has_tag_name("build") {
                continue;
            }
            if let Some(record) = build_record(node, &self.options, self.now) {
                return Some(record);
            }
        }
        None
    }
}

/// Parse `xml` and collect all its records
///
/// Extraction is all-or-nothing: on error no record is returned.
pub fn extract_builds(
    xml: &str,
    source_url: &str,
    options: &ExtractOptions,
) -> Result<Vec<BuildRecord>> {
    let document = BuildDocument::parse(xml, source_url)?;
    let records: Vec<BuildRecord> = document.builds(options).collect();

    tracing::debug!("Extracted {} build(s) from '{}'", records.len(), source_url);

    Ok(records)
}

/// Map one `build` element; `None` when the build is skipped
fn build_record(entry: Node, options: &ExtractOptions, now: DateTime<Utc>) -> Option<BuildRecord> {
    let building = child_text(entry, "building") == "true";
    let result = if building {
        if !options.display_building {
            return None;
        }
        BuildResult::InProgress
    } else {
        BuildResult::parse(&child_text(entry, "result"))
    };

    let started_ms = child_number(entry, "timestamp");
    let completed = if building {
        now
    } else {
        let completed_ms = started_ms.saturating_add(child_number(entry, "duration"));
        from_millis(completed_ms)
    };
    let started = from_millis(started_ms);

    let (canned, kind) = result.classify(options.alternate_success_icon);
    let description = if options.use_description {
        child_text(entry, "description")
    } else {
        String::new()
    };
    let message = if description.is_empty() {
        canned.to_string()
    } else {
        description
    };

    let full_name = child_text(entry, "fullDisplayName");
    let module = module_name(&full_name).to_string();

    Some(BuildRecord {
        module,
        full_name,
        url: child_text(entry, "url"),
        author: child_text(entry, "fullName"),
        result,
        message,
        started,
        completed,
        kind,
    })
}

/// Whole seconds since epoch, flooring like integer division on the server
///
/// Out-of-range values fall back to the epoch.
fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ms.div_euclid(1000), 0).unwrap_or_else(|| {
        tracing::warn!("Build timestamp {}ms is out of range, using the epoch", ms);
        DateTime::default()
    })
}

/// Trimmed direct text of the first descendant named `name`; empty if absent
fn child_text(parent: Node, name: &str) -> String {
    parent
        .descendants()
        .skip(1)
        .find(|node| node.has_tag_name(name))
        .map(|node| {
            node.children()
                .filter(|child| child.is_text())
                .filter_map(|child| child.text())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

/// Integer value of [`child_text`]; 0 when empty or not a number
fn child_number(parent: Node, name: &str) -> i64 {
    child_text(parent, name).parse().unwrap_or(0)
}
