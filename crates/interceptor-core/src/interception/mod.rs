//! # Interception Module
//!
//! Decides whether a GitHub hook delivery should continue down a trigger
//! pipeline, based on matching rules supplied as request headers.
//!
//! The flow for a single request is:
//!
//! 1. The transport builds an [`InterceptionHeaders`] view and hands it, with
//!    the raw body, to [`EventRouter::route`].
//! 2. The router classifies the `X-Github-Event` value as an [`EventKind`].
//!    Unknown kinds pass through unchanged.
//! 3. The interceptor registered for the kind decodes the body once, compares
//!    the hook identity with the requested criteria and, on a match, patches
//!    the body with an `"intercepted"` object.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

pub mod enrich;
pub mod payload;
pub mod pull_request;
pub mod push;
pub mod router;

pub use enrich::{enrich, EnrichError, INTERCEPTED_KEY};
pub use pull_request::{PullRequestCriteria, PullRequestInterceptor, PullRequestKey};
pub use push::{select_commit_id, CommitFallback, PushCriteria, PushInterceptor, PushKey};
pub use router::{EventRouter, EventRouterBuilder, InterceptionOptions};

use crate::git::{short_sha, ShaError};

// ============================================================================
// Header names
// ============================================================================

/// Event discriminator set by GitHub on every hook delivery.
pub const GITHUB_EVENT_HEADER: &str = "X-Github-Event";

/// Comma-separated list of pull-request actions to accept.
pub const PULL_REQUEST_ACTION_HEADER: &str = "Pullrequest-Action";

/// Full name of the repository pull-request events must come from.
pub const PULL_REQUEST_REPO_HEADER: &str = "Pullrequest-Repo";

/// Bare branch name push events must target.
pub const PUSH_REF_HEADER: &str = "Push-Ref";

/// Bare branch name to ignore when no `Push-Ref` is configured.
pub const PUSH_EXCLUDE_REF_HEADER: &str = "PushExclude-Ref";

/// Full name of the repository push events must come from.
pub const PUSH_REPO_HEADER: &str = "Push-Repo";

/// Content type of the delivery, echoed back on success.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

// ============================================================================
// Core Types
// ============================================================================

/// Case-insensitive, read-only view of the request headers.
///
/// Names are lower-cased on construction. When a name appears more than once
/// the first value is kept.
#[derive(Debug, Clone, Default)]
pub struct InterceptionHeaders {
    values: HashMap<String, String>,
}

impl InterceptionHeaders {
    /// Build a header view from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (name, value) in pairs {
            values
                .entry(name.as_ref().to_ascii_lowercase())
                .or_insert_with(|| value.into());
        }
        Self { values }
    }

    /// Look up a header value by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a header value, treating an empty value the same as a missing one.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.is_empty())
    }

    /// The raw `X-Github-Event` value, or `""` when absent.
    pub fn event_type(&self) -> &str {
        self.get(GITHUB_EVENT_HEADER).unwrap_or("")
    }

    /// The request `Content-Type`, if supplied.
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE_HEADER)
    }
}

/// The hook event kinds this filter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PullRequest,
    Push,
}

impl EventKind {
    /// Classify an `X-Github-Event` value.
    ///
    /// Returns `None` for anything other than `pull_request` or `push`.
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "pull_request" => Some(Self::PullRequest),
            "push" => Some(Self::Push),
            _ => None,
        }
    }

    /// The GitHub event name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull_request",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of routing a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptionOutcome {
    /// The event matched its criteria; `body` carries the `"intercepted"` fields.
    Intercepted { body: Bytes },

    /// No interceptor handles this event kind; `body` is the original payload.
    PassedThrough { body: Bytes },

    /// The event did not match the configured criteria.
    Rejected,
}

impl InterceptionOutcome {
    /// Whether downstream processing should continue.
    pub fn is_matched(&self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// The body to forward, or `None` when the event was rejected.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Intercepted { body } | Self::PassedThrough { body } => Some(body),
            Self::Rejected => None,
        }
    }

    /// Consume the outcome, returning the body to forward.
    pub fn into_body(self) -> Option<Bytes> {
        match self {
            Self::Intercepted { body } | Self::PassedThrough { body } => Some(body),
            Self::Rejected => None,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failure while intercepting a delivery.
///
/// A non-matching event is not an error; it is reported as
/// [`InterceptionOutcome::Rejected`].
#[derive(Debug, thiserror::Error)]
pub enum InterceptionError {
    #[error("failed to unmarshal request body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("error setting the intercepted values: {0}")]
    Enrichment(#[from] EnrichError),

    #[error("invalid commit id: {0}")]
    InvalidCommitId(#[from] ShaError),
}

// ============================================================================
// Core Operations (Traits)
// ============================================================================

/// Matches and enriches deliveries of a single [`EventKind`].
pub trait EventInterceptor: Send + Sync {
    /// The event kind this interceptor is registered under.
    fn event_kind(&self) -> EventKind;

    /// Decide whether the delivery matches the criteria in `headers`.
    ///
    /// Returns `Ok(Some(body))` with the enriched body on a match and
    /// `Ok(None)` when the delivery should be dropped.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptionError::Decode`] when `body` is not a valid
    /// payload for this event kind.
    fn intercept(
        &self,
        headers: &InterceptionHeaders,
        body: &[u8],
    ) -> Result<Option<Bytes>, InterceptionError>;
}

/// Value of the `short_sha` field for an optional commit id.
///
/// A missing or empty id yields an empty string.
pub(crate) fn short_sha_field(commit_id: Option<&str>) -> Result<String, ShaError> {
    match commit_id.filter(|id| !id.is_empty()) {
        Some(id) => Ok(short_sha(id)?.to_string()),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
