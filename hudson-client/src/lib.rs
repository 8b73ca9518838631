//! Hudson HTTP Client
//!
//! Fetches build results from a Hudson/Jenkins server and hands them to an
//! issue tracker's timeline as [`BuildRecord`]s.
//!
//! [`BuildTimeline`] is the single entry point for the host: it offers the
//! timeline filter and navigation entry, answers timeline queries for a time
//! window and renders the text of each record.
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use hudson_client::BuildTimeline;
//! use hudson_core::HudsonConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let timeline = BuildTimeline::new(HudsonConfig::new("http://localhost/hudson/"));
//!
//!     let stop = Utc::now();
//!     let builds = timeline.events(stop - Duration::days(1), stop, true).await?;
//!
//!     for build in &builds {
//!         println!("{} {}", build.kind, build.full_name);
//!     }
//!     Ok(())
//! }
//! ```

mod auth;
pub mod error;
mod source;

// Re-export commonly used types
pub use auth::Credentials;
pub use error::Result;
pub use hudson_core::timeline::{NavItem, TimelineField, TimelineFilter};
pub use hudson_core::{BuildInfoError, BuildKind, BuildRecord, BuildResult, HudsonConfig};
pub use source::{BuildInfoSource, HttpBuildSource};

use chrono::{DateTime, Utc};
use hudson_core::extract::extract_builds;
use hudson_core::query::QueryTemplate;
use hudson_core::timeline;

/// Build results of one Hudson server or job, as seen by a timeline host
///
/// Configuration is fixed at construction; every call to
/// [`events`](Self::events) performs exactly one request and keeps nothing
/// afterwards.
pub struct BuildTimeline<S = HttpBuildSource> {
    config: HudsonConfig,
    query: QueryTemplate,
    source: S,
}

impl BuildTimeline<HttpBuildSource> {
    /// Create a timeline that talks HTTP to the configured server
    pub fn new(config: HudsonConfig) -> Self {
        let source = HttpBuildSource::from_config(&config);
        Self::with_source(config, source)
    }

    /// Create a timeline from `HUDSON_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let config = HudsonConfig::from_env()?;
        config.validate()?;
        Ok(Self::new(config))
    }
}

impl<S: BuildInfoSource> BuildTimeline<S> {
    /// Create a timeline that reads build info from a custom source
    pub fn with_source(config: HudsonConfig, source: S) -> Self {
        let query = config.query_template();

        tracing::debug!(
            "Credentials for '{}': username='{}'",
            query.api_url(),
            config.username
        );
        tracing::debug!("Build-info url: '{}'", query.template());

        Self {
            config,
            query,
            source,
        }
    }

    pub fn config(&self) -> &HudsonConfig {
        &self.config
    }

    pub fn query(&self) -> &QueryTemplate {
        &self.query
    }

    /// Permission actions the host should register
    pub fn permission_actions(&self) -> &'static [&'static str] {
        timeline::permission_actions()
    }

    /// Id of the navigation entry to mark active
    pub fn active_navigation_item(&self) -> &'static str {
        timeline::active_navigation_item()
    }

    /// Timeline filters to offer a caller
    pub fn filters(&self, can_view: bool) -> Vec<TimelineFilter> {
        timeline::timeline_filters(can_view)
    }

    /// Entry for the main navigation bar, if the caller may see builds
    pub fn navigation_item(&self, can_view: bool) -> Option<NavItem> {
        can_view.then(|| {
            NavItem::new(
                self.config.main_page_url(),
                self.config.display_in_new_tab,
            )
        })
    }

    /// Builds whose start lies in the window, in the order the server lists them
    ///
    /// Returns nothing, without contacting the server, when the caller may
    /// not see builds. Failures are logged and returned unchanged; there is no
    /// partial result.
    ///
    /// # Arguments
    /// * `start` - Beginning of the window
    /// * `stop` - End of the window
    /// * `can_view` - Whether the caller holds `BUILD_VIEW`
    pub async fn events(
        &self,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        can_view: bool,
    ) -> Result<Vec<BuildRecord>> {
        if !can_view {
            return Ok(Vec::new());
        }

        let url = self
            .query
            .fill(start.timestamp() * 1000, stop.timestamp() * 1000);

        let body = self.source.fetch(&url).await.inspect_err(|e| {
            tracing::error!("{}", e);
        })?;

        extract_builds(&body, &url, &self.config.extract_options()).inspect_err(|e| {
            tracing::error!("{}", e);
        })
    }

    /// Plain-text rendering of one field of a record
    pub fn render(&self, record: &BuildRecord, field: TimelineField) -> String {
        timeline::render_field(record, field)
    }

    /// JSON build details for the timeline's hover callout
    pub fn callout_json(&self, records: &[BuildRecord]) -> serde_json::Result<String> {
        timeline::builds_json(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BUILDS_XML: &str = "<builds>\
        <build><building>false</building><result>SUCCESS</result>\
        <timestamp>1000000</timestamp><duration>5000</duration>\
        <fullDisplayName>demo #3</fullDisplayName><url>http://x/3</url>\
        <fullName>alice</fullName></build>\
        <build><building>true</building><timestamp>1500000</timestamp>\
        <fullDisplayName>demo #4</fullDisplayName></build>\
        </builds>";

    /// Serves a canned body, or fails, and remembers the requested urls
    struct StaticSource {
        body: Option<String>,
        requests: Mutex<Vec<String>>,
    }

    impl StaticSource {
        fn new(body: &str) -> Self {
            Self {
                body: Some(body.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                body: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuildInfoSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.body
                .clone()
                .ok_or_else(|| BuildInfoError::fetch(url, "RequestError", "connection refused"))
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            DateTime::from_timestamp(1_000, 0).unwrap(),
            DateTime::from_timestamp(2_000, 0).unwrap(),
        )
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn challenge(scheme: &'static str) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, scheme)],
            "",
        )
            .into_response()
    }

    #[tokio::test]
    async fn test_events_fill_window_in_milliseconds() {
        let config = HudsonConfig::new("http://ci/job/demo/");
        let timeline = BuildTimeline::with_source(config, StaticSource::new(BUILDS_XML));
        let (start, stop) = window();

        let builds = timeline.events(start, stop, true).await.unwrap();

        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].module, "demo ");
        assert_eq!(builds[0].kind, BuildKind::Successful);

        let requests = timeline.source.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("[timestamp>=1000000][timestamp<=2000000]"));
        assert!(requests[0].starts_with("http://ci/job/demo/api/xml?xpath=/*/build["));
    }

    #[tokio::test]
    async fn test_events_include_running_builds_when_configured() {
        let config = HudsonConfig {
            display_building: true,
            ..HudsonConfig::new("http://ci/job/demo/")
        };
        let timeline = BuildTimeline::with_source(config, StaticSource::new(BUILDS_XML));
        let (start, stop) = window();

        let builds = timeline.events(start, stop, true).await.unwrap();

        assert_eq!(builds.len(), 2);
        assert_eq!(builds[1].result, BuildResult::InProgress);
        assert_eq!(builds[1].started.timestamp(), 1500);
    }

    #[tokio::test]
    async fn test_events_without_permission_skip_fetch() {
        let timeline = BuildTimeline::with_source(
            HudsonConfig::default(),
            StaticSource::new(BUILDS_XML),
        );
        let (start, stop) = window();

        let builds = timeline.events(start, stop, false).await.unwrap();

        assert!(builds.is_empty());
        assert!(timeline.source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_events_wrong_root() {
        let timeline = BuildTimeline::with_source(
            HudsonConfig::default(),
            StaticSource::new("<hudson><job/></hudson>"),
        );
        let (start, stop) = window();

        let err = timeline.events(start, stop, true).await.unwrap_err();

        assert!(err.is_malformed_response());
        assert!(err.url().contains("api/xml?xpath=/*/job/build["));
    }

    #[tokio::test]
    async fn test_events_propagate_fetch_errors() {
        let timeline =
            BuildTimeline::with_source(HudsonConfig::default(), StaticSource::failing());
        let (start, stop) = window();

        let err = timeline.events(start, stop, true).await.unwrap_err();

        assert!(matches!(err, BuildInfoError::Fetch { ref kind, .. } if kind == "RequestError"));
    }

    #[test]
    fn test_navigation_item() {
        let config = HudsonConfig {
            main_page: "/hudson/".to_string(),
            display_in_new_tab: true,
            ..HudsonConfig::default()
        };
        let timeline = BuildTimeline::new(config);

        assert_eq!(timeline.navigation_item(false), None);
        let item = timeline.navigation_item(true).unwrap();
        assert_eq!(item.href, "/hudson/");
        assert_eq!(item.target, Some("hudson"));
        assert_eq!(item.name, timeline.active_navigation_item());
        assert_eq!(timeline.filters(true).len(), 1);
        assert_eq!(timeline.permission_actions(), ["BUILD_VIEW"]);
    }

    #[test]
    fn test_new_uses_configured_credentials() {
        let config = HudsonConfig {
            username: "alice".to_string(),
            password: "secret".to_string(),
            ..HudsonConfig::default()
        };
        assert!(BuildTimeline::new(config).source.has_credentials());
        assert!(!BuildTimeline::new(HudsonConfig::default()).source.has_credentials());
    }

    #[tokio::test]
    async fn test_http_fetch_sends_query() {
        async fn handler(Query(params): Query<HashMap<String, String>>) -> Response {
            let expected = [
                ("xpath", "/*/build[timestamp>=1000000][timestamp<=2000000]"),
                ("depth", "1"),
                ("exclude", "//action|//artifact|//changeSet|//culprit"),
                ("wrapper", "builds"),
            ];
            for (key, value) in expected {
                if params.get(key).map(String::as_str) != Some(value) {
                    return (StatusCode::BAD_REQUEST, format!("bad {key}")).into_response();
                }
            }
            BUILDS_XML.into_response()
        }

        let base = serve(Router::new().route("/job/demo/api/xml", get(handler))).await;
        let timeline = BuildTimeline::new(HudsonConfig::new(format!("{base}/job/demo")));
        let (start, stop) = window();

        let builds = timeline.events(start, stop, true).await.unwrap();

        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].full_name, "demo #3");
    }

    #[tokio::test]
    async fn test_http_basic_challenge() {
        async fn handler(headers: HeaderMap) -> Response {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            // alice:secret
            if authorization == Some("Basic YWxpY2U6c2VjcmV0") {
                BUILDS_XML.into_response()
            } else {
                challenge("Basic realm=\"hudson\"")
            }
        }

        let base = serve(Router::new().route("/job/demo/api/xml", get(handler))).await;
        let source = HttpBuildSource::with_credentials("alice", "secret");
        let body = source
            .fetch(&format!("{base}/job/demo/api/xml?depth=1"))
            .await
            .unwrap();
        assert_eq!(body, BUILDS_XML);

        let anonymous = HttpBuildSource::new();
        let err = anonymous
            .fetch(&format!("{base}/job/demo/api/xml?depth=1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildInfoError::Fetch { ref kind, .. } if kind == "HttpError"));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_http_digest_challenge() {
        async fn handler(headers: HeaderMap) -> Response {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if authorization.starts_with("Digest ")
                && authorization.contains("username=\"alice\"")
                && authorization.contains("uri=\"/api/xml?depth=2\"")
            {
                BUILDS_XML.into_response()
            } else {
                challenge("Digest realm=\"hudson\", nonce=\"abc123\", qop=\"auth\", algorithm=MD5")
            }
        }

        let base = serve(Router::new().route("/api/xml", get(handler))).await;
        let source = HttpBuildSource::with_credentials("alice", "secret");

        let body = source.fetch(&format!("{base}/api/xml?depth=2")).await.unwrap();

        assert_eq!(body, BUILDS_XML);
    }

    #[tokio::test]
    async fn test_http_digest_challenge_after_redirect() {
        async fn moved() -> axum::response::Redirect {
            axum::response::Redirect::temporary("/api/xml?depth=2")
        }

        async fn handler(headers: HeaderMap) -> Response {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if authorization.contains("uri=\"/api/xml?depth=2\"") {
                BUILDS_XML.into_response()
            } else {
                challenge("Digest realm=\"hudson\", nonce=\"abc123\", qop=\"auth\", algorithm=MD5")
            }
        }

        let app = Router::new()
            .route("/old/api/xml", get(moved))
            .route("/api/xml", get(handler));
        let base = serve(app).await;
        let source = HttpBuildSource::with_credentials("alice", "secret");

        let body = source.fetch(&format!("{base}/old/api/xml")).await.unwrap();

        assert_eq!(body, BUILDS_XML);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        async fn handler() -> StatusCode {
            StatusCode::INTERNAL_SERVER_ERROR
        }

        let base = serve(Router::new().route("/api/xml", get(handler))).await;
        let url = format!("{base}/api/xml");

        let err = HttpBuildSource::new().fetch(&url).await.unwrap_err();

        assert_eq!(err.url(), url);
        assert!(err.to_string().contains("HttpError: 500 Internal Server Error"));
        assert!(err.to_string().contains("wrong job_url"));
    }

    #[tokio::test]
    async fn test_http_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpBuildSource::new()
            .fetch(&format!("http://{addr}/api/xml"))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildInfoError::Fetch { ref kind, .. } if kind == "RequestError"));
    }
}
