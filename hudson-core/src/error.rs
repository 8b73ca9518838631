//! Error types for build-info retrieval

use thiserror::Error;

/// Result type alias for build-info operations
pub type Result<T> = std::result::Result<T, BuildInfoError>;

/// Errors that can occur while getting build info from the CI server
///
/// Both variants point at a misconfigured `job_url` in practice, so their
/// messages say so. Neither is retried.
#[derive(Debug, Error)]
pub enum BuildInfoError {
    /// The request failed, the server answered with an error status, or the
    /// body was not well-formed XML
    #[error(
        "Error getting build info from '{url}': {kind}: {message}. \
         This most likely means you configured a wrong job_url."
    )]
    Fetch {
        /// Request url
        url: String,
        /// Short name of the underlying failure (e.g. "HttpError")
        kind: String,
        /// Message of the underlying failure
        message: String,
    },

    /// The returned document is XML but its root is not `builds`
    #[error(
        "Error getting build info from '{url}': returned document has unexpected node '{root}'. \
         This most likely means you configured a wrong job_url"
    )]
    MalformedResponse {
        /// Request url
        url: String,
        /// Name of the root element that was found instead
        root: String,
    },
}

impl BuildInfoError {
    /// Create a fetch error from its parts
    pub fn fetch(url: impl Into<String>, kind: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            kind: kind.into(),
            message: message.to_string(),
        }
    }

    /// Request url the error refers to
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. } | Self::MalformedResponse { url, .. } => url,
        }
    }

    /// Check if the server answered with a document of the wrong shape
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}
