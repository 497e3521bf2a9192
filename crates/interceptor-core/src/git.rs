//! Git naming helpers shared by the event interceptors.

/// Number of characters kept by [`short_sha`].
pub const SHORT_SHA_LENGTH: usize = 6;

/// Prefix GitHub puts on branch refs in push payloads.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Error returned when a commit identifier cannot be shortened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaError {
    /// The identifier has fewer than [`SHORT_SHA_LENGTH`] characters.
    #[error("commit id '{sha}' is shorter than {SHORT_SHA_LENGTH} characters")]
    TooShort { sha: String },
}

/// Trim a commit SHA to its first six characters.
///
/// # Errors
///
/// Returns [`ShaError::TooShort`] when `sha` has fewer than six characters.
///
/// # Examples
///
/// ```rust
/// use interceptor_core::git::short_sha;
///
/// assert_eq!(short_sha("6a6bcddc365ca3a38c9055a603c9590a7fae7ca6").unwrap(), "6a6bcd");
/// assert!(short_sha("abc").is_err());
/// ```
pub fn short_sha(sha: &str) -> Result<&str, ShaError> {
    match sha.char_indices().nth(SHORT_SHA_LENGTH) {
        Some((end, _)) => Ok(&sha[..end]),
        None if sha.chars().count() == SHORT_SHA_LENGTH => Ok(sha),
        None => Err(ShaError::TooShort {
            sha: sha.to_string(),
        }),
    }
}

/// Strip the `refs/heads/` prefix from a ref, leaving the bare branch name.
///
/// Refs without the prefix (tags, already-bare names) are returned unchanged.
///
/// ```rust
/// use interceptor_core::git::ref_to_branch;
///
/// assert_eq!(ref_to_branch("refs/heads/main"), "main");
/// assert_eq!(ref_to_branch("refs/tags/v1.0.0"), "refs/tags/v1.0.0");
/// ```
pub fn ref_to_branch(reference: &str) -> &str {
    reference
        .strip_prefix(BRANCH_REF_PREFIX)
        .unwrap_or(reference)
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
