//! Answering the server's authentication challenge
//!
//! Requests go out without credentials. When the server asks for them, the
//! challenge is answered once: Digest when offered, Basic otherwise.

use digest_auth::AuthContext;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Response, Url};

use crate::error::{Result, auth_error, request_error};

/// Username and password sent to the server
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Repeat a request that was answered with `401`, this time authenticated
///
/// The authenticated request goes to the url that issued the challenge,
/// which differs from `url` after a redirect. Returns the original response
/// when the server offers no scheme we speak.
pub(crate) async fn answer_challenge(
    client: &Client,
    url: &str,
    response: Response,
    credentials: &Credentials,
) -> Result<Response> {
    let challenges: Vec<String> = response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect();
    let target = response.url().clone();

    if let Some(digest) = challenges.iter().find(|c| has_scheme(c, "digest")) {
        tracing::debug!("Answering digest challenge for '{}'", url);
        let header =
            digest_response(digest, &target, credentials).map_err(|e| auth_error(url, e))?;

        return client
            .get(target)
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| request_error(url, &e));
    }

    if challenges.iter().any(|c| has_scheme(c, "basic")) {
        tracing::debug!("Answering basic challenge for '{}'", url);
        return client
            .get(target)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| request_error(url, &e));
    }

    tracing::warn!(
        "Server at '{}' asked for credentials without a supported scheme: {:?}",
        url,
        challenges
    );
    Ok(response)
}

fn has_scheme(challenge: &str, scheme: &str) -> bool {
    challenge
        .split_whitespace()
        .next()
        .is_some_and(|s| s.eq_ignore_ascii_case(scheme))
}

/// Authorization header value for a digest challenge
fn digest_response(
    challenge: &str,
    request_url: &Url,
    credentials: &Credentials,
) -> std::result::Result<String, digest_auth::Error> {
    let context = AuthContext::new(
        credentials.username.as_str(),
        credentials.password.as_str(),
        request_uri(request_url),
    );
    let mut prompt = digest_auth::parse(challenge)?;
    let answer = prompt.respond(&context)?;
    Ok(answer.to_header_string())
}

/// Path and query as they appear on the request line
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
