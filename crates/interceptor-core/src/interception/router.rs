//! Event-kind dispatch.
//!
//! [`EventRouter`] maps each [`EventKind`] to the [`EventInterceptor`]
//! responsible for it. The table is built once at startup and shared
//! read-only between requests; cloning a router only clones `Arc`s.
//!
//! Deliveries whose `X-Github-Event` has no registered interceptor are
//! passed through unchanged and allowed.

use bytes::Bytes;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::debug;

use super::{
    CommitFallback, EventInterceptor, EventKind, InterceptionError, InterceptionHeaders,
    InterceptionOutcome, PullRequestInterceptor, PushInterceptor,
};

/// Tunables applied when building the standard GitHub router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptionOptions {
    pub push_commit_fallback: CommitFallback,
}

/// Immutable event-kind to interceptor table.
#[derive(Clone)]
pub struct EventRouter {
    interceptors: HashMap<EventKind, Arc<dyn EventInterceptor>>,
}

impl EventRouter {
    /// Start building a router with no interceptors registered.
    pub fn builder() -> EventRouterBuilder {
        EventRouterBuilder::default()
    }

    /// Router with the pull-request and push interceptors registered.
    ///
    /// ```rust
    /// use interceptor_core::interception::{EventRouter, InterceptionOptions};
    ///
    /// let router = EventRouter::github(&InterceptionOptions::default());
    /// assert!(router.handles("pull_request"));
    /// assert!(router.handles("push"));
    /// assert!(!router.handles("issues"));
    /// ```
    pub fn github(options: &InterceptionOptions) -> Self {
        Self::builder()
            .register(Arc::new(PullRequestInterceptor::new()))
            .register(Arc::new(PushInterceptor::new(options.push_commit_fallback)))
            .build()
    }

    /// Whether an interceptor is registered for `event_type`.
    pub fn handles(&self, event_type: &str) -> bool {
        EventKind::from_header(event_type).is_some_and(|kind| self.interceptors.contains_key(&kind))
    }

    /// Route a delivery to the interceptor registered for `event_type`.
    ///
    /// # Errors
    ///
    /// Propagates the interceptor's [`InterceptionError`] unchanged.
    pub fn route(
        &self,
        event_type: &str,
        headers: &InterceptionHeaders,
        body: Bytes,
    ) -> Result<InterceptionOutcome, InterceptionError> {
        let interceptor = EventKind::from_header(event_type)
            .and_then(|kind| self.interceptors.get(&kind));

        let Some(interceptor) = interceptor else {
            debug!(event_type = %event_type, "no interceptor registered, passing through");
            return Ok(InterceptionOutcome::PassedThrough { body });
        };

        match interceptor.intercept(headers, &body)? {
            Some(body) => Ok(InterceptionOutcome::Intercepted { body }),
            None => Ok(InterceptionOutcome::Rejected),
        }
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&'static str> = self.interceptors.keys().map(EventKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("EventRouter")
            .field("event_kinds", &kinds)
            .finish()
    }
}

/// Builder for [`EventRouter`].
#[derive(Default)]
pub struct EventRouterBuilder {
    interceptors: HashMap<EventKind, Arc<dyn EventInterceptor>>,
}

impl EventRouterBuilder {
    /// Register an interceptor under its own event kind.
    ///
    /// A later registration for the same kind replaces the earlier one.
    pub fn register(mut self, interceptor: Arc<dyn EventInterceptor>) -> Self {
        self.interceptors.insert(interceptor.event_kind(), interceptor);
        self
    }

    pub fn build(self) -> EventRouter {
        EventRouter {
            interceptors: self.interceptors,
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
