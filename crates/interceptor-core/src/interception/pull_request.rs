//! Pull-request interception.
//!
//! [`PullRequestInterceptor`] accepts `pull_request` deliveries whose action
//! and repository match the trigger configuration:
//!
//! - `X-Github-Event` - set by GitHub, must be `pull_request`
//! - `Pullrequest-Action` - comma-separated list of accepted actions,
//!   e.g. `opened,synchronize`
//! - `Pullrequest-Repo` - full name of the repository, e.g. `tektoncd/triggers`
//!
//! A matching body is returned with `intercepted.short_sha` set from the
//! pull request's head commit.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::{
    enrich, payload::{decode_object, PullRequestPayload}, short_sha_field, EventInterceptor, EventKind,
    InterceptionError, InterceptionHeaders, PULL_REQUEST_ACTION_HEADER, PULL_REQUEST_REPO_HEADER,
};

/// Identity of a pull-request hook, as read from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestKey {
    pub event_type: String,
    pub action: String,
    pub repo: String,
}

impl PullRequestKey {
    /// Build the hook identity from a decoded payload.
    pub fn from_payload(event_type: &str, payload: &PullRequestPayload) -> Self {
        Self {
            event_type: event_type.to_string(),
            action: payload.action().to_string(),
            repo: payload.repo_full_name().to_string(),
        }
    }
}

impl fmt::Display for PullRequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.event_type, self.repo, self.action)
    }
}

/// Pull-request matching rules supplied through request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestCriteria {
    /// Accepted actions; any one of them matches.
    pub actions: Vec<String>,
    pub repo: String,
}

impl PullRequestCriteria {
    /// Read the criteria from the request headers.
    ///
    /// Returns `None` when the request is not a `pull_request` delivery.
    pub fn from_headers(headers: &InterceptionHeaders) -> Option<Self> {
        if EventKind::from_header(headers.event_type()) != Some(EventKind::PullRequest) {
            return None;
        }

        Some(Self {
            actions: parse_actions(headers.get(PULL_REQUEST_ACTION_HEADER).unwrap_or("")),
            repo: headers
                .get(PULL_REQUEST_REPO_HEADER)
                .unwrap_or("")
                .to_string(),
        })
    }

    /// Whether any matching rule was supplied at all.
    pub fn is_configured(&self) -> bool {
        !self.actions.is_empty() || !self.repo.is_empty()
    }

    /// Compare a hook identity against these criteria.
    ///
    /// Unconfigured criteria never match.
    pub fn matches(&self, hook: &PullRequestKey) -> bool {
        if !self.is_configured() {
            return false;
        }
        if hook.event_type != EventKind::PullRequest.as_str() {
            return false;
        }
        if hook.repo != self.repo {
            return false;
        }
        self.actions.iter().any(|action| *action == hook.action)
    }
}

impl fmt::Display for PullRequestCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            EventKind::PullRequest,
            self.repo,
            self.actions.join(",")
        )
    }
}

/// Split a `Pullrequest-Action` value into trimmed, non-empty actions.
fn parse_actions(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .map(String::from)
        .collect()
}

/// Interceptor for `pull_request` deliveries.
#[derive(Debug, Clone, Default)]
pub struct PullRequestInterceptor;

impl PullRequestInterceptor {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `body` matches the pull-request criteria in `headers`.
    ///
    /// Non-`pull_request` deliveries never match.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptionError::Decode`] if `body` is not a valid
    /// pull-request payload.
    pub fn matches(
        &self,
        headers: &InterceptionHeaders,
        body: &[u8],
    ) -> Result<bool, InterceptionError> {
        if !is_pull_request_event(headers) {
            debug!("dropping request because not a pull request event");
            return Ok(false);
        }

        let payload = decode(body)?;
        Ok(self.matches_payload(headers, &payload))
    }

    fn matches_payload(&self, headers: &InterceptionHeaders, payload: &PullRequestPayload) -> bool {
        let Some(wanted) = PullRequestCriteria::from_headers(headers) else {
            return false;
        };
        let hook = PullRequestKey::from_payload(headers.event_type(), payload);

        debug!(hook = %hook, wanted = %wanted, "comparing pull request");
        wanted.matches(&hook)
    }
}

impl EventInterceptor for PullRequestInterceptor {
    fn event_kind(&self) -> EventKind {
        EventKind::PullRequest
    }

    fn intercept(
        &self,
        headers: &InterceptionHeaders,
        body: &[u8],
    ) -> Result<Option<Bytes>, InterceptionError> {
        if !is_pull_request_event(headers) {
            debug!("dropping request because not a pull request event");
            return Ok(None);
        }

        let payload = decode(body)?;
        if !self.matches_payload(headers, &payload) {
            return Ok(None);
        }

        let fields = BTreeMap::from([(
            "short_sha".to_string(),
            short_sha_field(payload.head_sha())?,
        )]);
        Ok(Some(enrich(body, &fields)?))
    }
}

fn is_pull_request_event(headers: &InterceptionHeaders) -> bool {
    EventKind::from_header(headers.event_type()) == Some(EventKind::PullRequest)
}

fn decode(body: &[u8]) -> Result<PullRequestPayload, InterceptionError> {
    decode_object(body).map_err(InterceptionError::Decode)
}

#[cfg(test)]
#[path = "pull_request_tests.rs"]
mod tests;
