//! Build-info query construction
//!
//! The server's XML API can filter builds by timestamp with an XPath
//! expression, so only the builds of the requested window travel over the
//! wire. The url is computed once from configuration and filled per request.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is when normalizing the configured url
const URL_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/')
    .remove(b'%')
    .remove(b':')
    .remove(b'@');

/// Subtrees the server should leave out of each build
const EXCLUDE: &str = "//action|//artifact|//changeSet|//culprit";

const START_SLOT: &str = "{start}";
const STOP_SLOT: &str = "{stop}";

/// Parameterized build-info url with `{start}`/`{stop}` slots in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    api_url: String,
    template: String,
    depth: u32,
}

impl QueryTemplate {
    /// Normalized `.../api/xml` url the query is sent to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Url with the window slots still in place
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Tree depth the server must expand to reach every selected build
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Substitute the window bounds (inclusive, milliseconds since epoch)
    pub fn fill(&self, start_ms: i64, stop_ms: i64) -> String {
        self.template
            .replace(START_SLOT, &start_ms.to_string())
            .replace(STOP_SLOT, &stop_ms.to_string())
    }
}

/// Build the query template for a server or job url
///
/// A url containing a `/job/` segment designates a single job whose builds
/// sit directly below the root; otherwise builds are looked up below each
/// job. With `include_modules` the builds of modules are selected as well,
/// one level deeper.
pub fn build_query_template(base_url: &str, include_modules: bool) -> QueryTemplate {
    let mut api_url = utf8_percent_encode(base_url, URL_SAFE).to_string();
    if !api_url.ends_with('/') {
        api_url.push('/');
    }
    api_url.push_str("api/xml");

    let prefix = if api_url.contains("/job/") { "/*" } else { "/*/job" };
    let filter = format!("[timestamp>={START_SLOT}][timestamp<={STOP_SLOT}]");

    let mut path = format!("{prefix}/build{filter}");
    let mut depth = if prefix == "/*" { 1 } else { 2 };
    if include_modules {
        path.push_str(&format!("|{prefix}/module/build{filter}"));
        depth += 1;
    }

    let template = format!("{api_url}?xpath={path}&depth={depth}&exclude={EXCLUDE}&wrapper=builds");

    QueryTemplate {
        api_url,
        template,
        depth,
    }
}
