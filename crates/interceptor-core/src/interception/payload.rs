//! Minimal typed views of the GitHub hook payloads.
//!
//! Only the fields the interceptors read are modelled; everything else in the
//! body is ignored here and left untouched by [`enrich`](super::enrich).
//! Every field is optional so that partial payloads decode, with absent
//! values read back as empty strings.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

/// Decode a hook body into one of the payload views.
///
/// The body must be a JSON object; arrays and scalars are rejected rather
/// than read positionally. A repeated top-level key keeps its last value.
///
/// ```rust
/// use interceptor_core::interception::payload::{decode_object, PushPayload};
///
/// assert!(decode_object::<PushPayload>(b"[]").is_err());
/// let payload: PushPayload = decode_object(br#"{"ref":"a","ref":"refs/heads/b"}"#).unwrap();
/// assert_eq!(payload.reference(), "refs/heads/b");
/// ```
pub fn decode_object<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_slice(body)?;
    serde_json::from_value(Value::Object(object))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryPayload {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitRef {
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestDetails {
    #[serde(default)]
    pub head: Option<CommitRef>,
}

/// A `pull_request` event body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestPayload {
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub repository: Option<RepositoryPayload>,

    #[serde(default)]
    pub pull_request: Option<PullRequestDetails>,
}

impl PullRequestPayload {
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or("")
    }

    pub fn repo_full_name(&self) -> &str {
        repo_full_name(self.repository.as_ref())
    }

    /// SHA of the pull request's head commit, if present.
    pub fn head_sha(&self) -> Option<&str> {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.head.as_ref())
            .and_then(|head| head.sha.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushCommit {
    #[serde(default)]
    pub id: Option<String>,
}

/// A `push` event body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,

    #[serde(default)]
    pub repository: Option<RepositoryPayload>,

    #[serde(default)]
    pub commits: Option<Vec<PushCommit>>,

    #[serde(default)]
    pub head_commit: Option<PushCommit>,
}

impl PushPayload {
    pub fn reference(&self) -> &str {
        self.reference.as_deref().unwrap_or("")
    }

    pub fn repo_full_name(&self) -> &str {
        repo_full_name(self.repository.as_ref())
    }

    pub fn head_commit_id(&self) -> Option<&str> {
        self.head_commit.as_ref().and_then(|c| c.id.as_deref())
    }

    /// Commit ids in payload order; commits without an id are skipped.
    pub fn commit_ids(&self) -> Vec<&str> {
        self.commits
            .iter()
            .flatten()
            .filter_map(|c| c.id.as_deref())
            .collect()
    }
}

fn repo_full_name(repository: Option<&RepositoryPayload>) -> &str {
    repository
        .and_then(|r| r.full_name.as_deref())
        .unwrap_or("")
}
