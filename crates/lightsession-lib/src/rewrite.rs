//! Rewriting of conversation-history responses.
//!
//! The rewriter sits between a fetched response and its consumer. It only
//! touches JSON responses whose request path looks like a conversation
//! endpoint, and it only ever produces a replacement body: status and all
//! headers other than `content-length`/`content-type` are left to the caller.
//! Any response it cannot trim is reported as `None` (pass through as-is).

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{LightSessionError, Result};
use crate::graph::{trim_with_report, TrimReport};
use crate::model::payload::ConversationPayload;
use crate::settings::LightSessionSettings;

/// Default request-path pattern for conversation-history endpoints.
pub const DEFAULT_PATH_PATTERN: &str = r"/backend-api/conversation";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

static DEFAULT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_PATH_PATTERN).expect("default path pattern is valid"));

/// A response as seen by the interceptor: request path, headers and the
/// fully-read body.
#[derive(Debug, Clone, Copy)]
pub struct InterceptedResponse<'a> {
    pub path: &'a str,
    pub headers: &'a [(String, String)],
    pub body: &'a [u8],
}

/// Replacement body and headers for a trimmed response.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenResponse {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub report: TrimReport,
}

/// Look up a header value by case-insensitive name.
pub fn header_value<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Clone)]
pub struct ResponseRewriter {
    settings: LightSessionSettings,
    path_pattern: Regex,
}

impl ResponseRewriter {
    /// Rewriter matching [`DEFAULT_PATH_PATTERN`].
    pub fn new(settings: LightSessionSettings) -> Self {
        Self {
            settings,
            path_pattern: DEFAULT_PATH_RE.clone(),
        }
    }

    /// Rewriter matching a custom request-path regex.
    pub fn with_path_pattern(settings: LightSessionSettings, pattern: &str) -> Result<Self> {
        let path_pattern =
            Regex::new(pattern).map_err(|source| LightSessionError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            settings,
            path_pattern,
        })
    }

    pub fn settings(&self) -> &LightSessionSettings {
        &self.settings
    }

    /// Whether a response with this path and content type should be parsed
    /// at all. Disabled settings make every response ineligible.
    pub fn is_eligible(&self, path: &str, content_type: Option<&str>) -> bool {
        self.settings.enabled
            && self.path_pattern.is_match(path)
            && content_type.is_some_and(|ct| ct.contains("application/json"))
    }

    /// Trim an intercepted response body, or `None` to pass it through.
    pub fn rewrite(&self, response: &InterceptedResponse<'_>) -> Option<RewrittenResponse> {
        let content_type = header_value(response.headers, "content-type");
        if !self.is_eligible(response.path, content_type) {
            return None;
        }
        let window = self.settings.fetch_window()?;

        let payload = match ConversationPayload::from_slice(response.body) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(path = response.path, error = %err, "response body is not a conversation payload");
                return None;
            }
        };
        let (trimmed, report) = trim_with_report(&payload, window)?;
        let body = match trimmed.to_vec() {
            Ok(body) => body,
            Err(err) => {
                debug!(path = response.path, error = %err, "failed to serialise trimmed payload");
                return None;
            }
        };

        debug!(
            path = response.path,
            keep_last_n = self.settings.keep_last_n,
            original = report.original_nodes,
            retained = report.retained_nodes,
            "rewrote conversation response"
        );

        Some(RewrittenResponse {
            headers: rewrite_headers(response.headers),
            body,
            report,
        })
    }
}

/// Drop `content-length` (the body changed size) and make sure a JSON
/// content type is present.
fn rewrite_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = headers
        .iter()
        .filter(|(key, _)| !key.eq_ignore_ascii_case("content-length"))
        .cloned()
        .collect();
    if header_value(&out, "content-type").is_none() {
        out.push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
    }
    out
}
