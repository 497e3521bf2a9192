//! # Interceptor Core
//!
//! Event classification, matching and enrichment for a GitHub hook
//! pre-filter. A trigger pipeline sends each delivery through the filter
//! together with matching rules in request headers; the filter decides
//! whether the pipeline should continue and, if so, hands back the payload
//! with a few derived fields added.
//!
//! This crate has no transport dependencies. The HTTP layer lives in
//! `interceptor-api`.
//!
//! ## Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use interceptor_core::interception::{EventRouter, InterceptionHeaders, InterceptionOptions};
//!
//! let router = EventRouter::github(&InterceptionOptions::default());
//! let headers = InterceptionHeaders::from_pairs([
//!     ("X-Github-Event", "push"),
//!     ("Push-Repo", "org/repo"),
//!     ("Push-Ref", "main"),
//! ]);
//! let body = Bytes::from_static(
//!     br#"{"ref":"refs/heads/main","repository":{"full_name":"org/repo"},"head_commit":{"id":"abc123456789"}}"#,
//! );
//!
//! let outcome = router.route("push", &headers, body).unwrap();
//! assert!(outcome.is_matched());
//! ```

pub mod git;
pub mod interception;

pub use interception::{
    EventInterceptor, EventKind, EventRouter, InterceptionError, InterceptionHeaders,
    InterceptionOptions, InterceptionOutcome,
};
