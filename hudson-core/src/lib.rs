//! Hudson Core
//!
//! Core types and logic for surfacing Hudson/Jenkins build results in an
//! issue tracker's timeline.
//!
//! This crate contains:
//! - Domain types: the normalized build record and its classification
//! - Query construction: the XPath-filtered XML API url for a time window
//! - Extraction: turning the server's XML answer into build records
//! - Timeline helpers: permissions, navigation and field rendering
//!
//! Note: All network I/O lives in `hudson-client`; nothing here blocks.

pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod query;
pub mod timeline;

pub use config::HudsonConfig;
pub use domain::build::{BuildKind, BuildRecord, BuildResult};
pub use error::{BuildInfoError, Result};
pub use extract::{BuildDocument, Builds, ExtractOptions, extract_builds};
pub use query::{QueryTemplate, build_query_template};
