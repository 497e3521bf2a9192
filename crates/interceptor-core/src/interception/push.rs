//! Push interception.
//!
//! [`PushInterceptor`] accepts `push` deliveries for a configured repository
//! and branch:
//!
//! - `X-Github-Event` - set by GitHub, must be `push`
//! - `Push-Repo` - full name of the repository, e.g. `tektoncd/triggers`
//! - `Push-Ref` - bare branch name, e.g. `main`
//! - `PushExclude-Ref` - bare branch name to skip when no `Push-Ref` is set
//!
//! With only `Push-Repo` configured every branch of the repository matches.
//! With `Push-Repo` and `PushExclude-Ref` every branch except the excluded
//! one matches. An empty header value counts as absent.
//!
//! A matching body is returned with `intercepted.ref` (the bare branch) and
//! `intercepted.short_sha` added.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::{
    enrich, payload::{decode_object, PushPayload}, short_sha_field, EventInterceptor, EventKind,
    InterceptionError, InterceptionHeaders, PUSH_EXCLUDE_REF_HEADER, PUSH_REF_HEADER,
    PUSH_REPO_HEADER,
};
use crate::git::ref_to_branch;

/// Identity of a push hook, as read from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushKey {
    pub event_type: String,
    pub repo: String,
    /// Branch with the `refs/heads/` prefix removed.
    pub branch: String,
}

impl PushKey {
    pub fn from_payload(event_type: &str, payload: &PushPayload) -> Self {
        Self {
            event_type: event_type.to_string(),
            repo: payload.repo_full_name().to_string(),
            branch: ref_to_branch(payload.reference()).to_string(),
        }
    }
}

impl fmt::Display for PushKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.event_type, self.repo, self.branch)
    }
}

/// Push matching rules supplied through request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCriteria {
    pub repo: String,
    pub branch: Option<String>,
    pub excluded_branch: Option<String>,
}

impl PushCriteria {
    /// Read the criteria from the request headers.
    pub fn from_headers(headers: &InterceptionHeaders) -> Self {
        Self {
            repo: headers.get(PUSH_REPO_HEADER).unwrap_or("").to_string(),
            branch: headers.get_non_empty(PUSH_REF_HEADER).map(String::from),
            excluded_branch: headers
                .get_non_empty(PUSH_EXCLUDE_REF_HEADER)
                .map(String::from),
        }
    }

    /// Compare a hook identity against these criteria.
    ///
    /// Rules, in order:
    ///
    /// 1. repository and branch both equal
    /// 2. no branch and no exclusion: any branch of the repository
    /// 3. no branch, exclusion set: any branch of the repository but the excluded one
    ///
    /// A missing repository never matches.
    pub fn matches(&self, hook: &PushKey) -> bool {
        if self.repo.is_empty() || hook.event_type != EventKind::Push.as_str() {
            return false;
        }
        if hook.repo != self.repo {
            return false;
        }

        match (&self.branch, &self.excluded_branch) {
            (Some(branch), _) => *branch == hook.branch,
            (None, None) => true,
            (None, Some(excluded)) => *excluded != hook.branch,
        }
    }
}

impl fmt::Display for PushCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            EventKind::Push,
            self.repo,
            self.branch.as_deref().unwrap_or("")
        )?;
        if let Some(excluded) = &self.excluded_branch {
            write!(f, " (excluding {excluded})")?;
        }
        Ok(())
    }
}

/// Which commit to report when a push payload has no head commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitFallback {
    /// The last commit in the `commits` list.
    #[default]
    Last,

    /// The second-to-last commit, or the only commit when there is just one.
    ///
    /// Matches the behaviour existing triggers were configured against.
    SecondToLast,
}

impl CommitFallback {
    /// Pick a commit id from an ordered list.
    pub fn select<'a>(&self, commit_ids: &[&'a str]) -> Option<&'a str> {
        match self {
            Self::Last => commit_ids.last().copied(),
            Self::SecondToLast => match commit_ids.len() {
                0 => None,
                1 => Some(commit_ids[0]),
                n => Some(commit_ids[n - 2]),
            },
        }
    }
}

/// The commit id reported for a push: the head commit when present,
/// otherwise one picked from the commit list by `fallback`.
pub fn select_commit_id(payload: &PushPayload, fallback: CommitFallback) -> Option<&str> {
    payload
        .head_commit_id()
        .filter(|id| !id.is_empty())
        .or_else(|| fallback.select(&payload.commit_ids()))
}

/// Interceptor for `push` deliveries.
#[derive(Debug, Clone, Default)]
pub struct PushInterceptor {
    fallback: CommitFallback,
}

impl PushInterceptor {
    pub fn new(fallback: CommitFallback) -> Self {
        Self { fallback }
    }

    pub fn commit_fallback(&self) -> CommitFallback {
        self.fallback
    }

    /// Decide whether `body` matches the push criteria in `headers`.
    ///
    /// Non-`push` deliveries never match.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptionError::Decode`] if `body` is not a valid push
    /// payload.
    pub fn matches(
        &self,
        headers: &InterceptionHeaders,
        body: &[u8],
    ) -> Result<bool, InterceptionError> {
        if !is_push_event(headers) {
            debug!("dropping request because not a push event");
            return Ok(false);
        }

        let payload = decode(body)?;
        Ok(self.matches_payload(headers, &payload))
    }

    fn matches_payload(&self, headers: &InterceptionHeaders, payload: &PushPayload) -> bool {
        let wanted = PushCriteria::from_headers(headers);
        let hook = PushKey::from_payload(headers.event_type(), payload);

        debug!(hook = %hook, wanted = %wanted, "comparing push");
        wanted.matches(&hook)
    }
}

impl EventInterceptor for PushInterceptor {
    fn event_kind(&self) -> EventKind {
        EventKind::Push
    }

    fn intercept(
        &self,
        headers: &InterceptionHeaders,
        body: &[u8],
    ) -> Result<Option<Bytes>, InterceptionError> {
        if !is_push_event(headers) {
            debug!("dropping request because not a push event");
            return Ok(None);
        }

        let payload = decode(body)?;
        if !self.matches_payload(headers, &payload) {
            return Ok(None);
        }

        let fields = BTreeMap::from([
            (
                "ref".to_string(),
                ref_to_branch(payload.reference()).to_string(),
            ),
            (
                "short_sha".to_string(),
                short_sha_field(select_commit_id(&payload, self.fallback))?,
            ),
        ]);
        Ok(Some(enrich(body, &fields)?))
    }
}

fn is_push_event(headers: &InterceptionHeaders) -> bool {
    EventKind::from_header(headers.event_type()) == Some(EventKind::Push)
}

fn decode(body: &[u8]) -> Result<PushPayload, InterceptionError> {
    decode_object(body).map_err(InterceptionError::Decode)
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
