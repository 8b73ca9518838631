//! Conversion of HTTP failures into build-info errors

use hudson_core::error::BuildInfoError;

pub use hudson_core::error::Result;

/// Failure to reach the server or to read its answer
pub(crate) fn request_error(url: &str, err: &reqwest::Error) -> BuildInfoError {
    BuildInfoError::fetch(url, "RequestError", err)
}

/// Server answered with a non-success status
pub(crate) fn status_error(url: &str, status: reqwest::StatusCode) -> BuildInfoError {
    BuildInfoError::fetch(url, "HttpError", status)
}

/// Server's authentication challenge could not be answered
pub(crate) fn auth_error(url: &str, message: impl ToString) -> BuildInfoError {
    BuildInfoError::fetch(url, "AuthError", message)
}
