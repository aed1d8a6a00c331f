//! Git mirror models.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Username sent with an HTTPS token when none is configured.
pub const DEFAULT_HTTPS_USERNAME: &str = "git";

/// A commit as shown in file history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    pub author_email: String,
    pub commit_date: DateTime<Utc>,
    /// Subject line of the commit message.
    pub message: String,
    pub parent_hashes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiffLineType {
    Added,
    Deleted,
    Modified,
    Unchanged,
}

/// One line of a rendered diff.
///
/// `old_line_number` is set for unchanged, deleted and modified lines;
/// `new_line_number` for unchanged, added and modified lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
    /// Replaced text for `Modified` lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_content: Option<String>,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitDiffResult {
    pub old_content: String,
    pub new_content: String,
    pub lines: Vec<DiffLine>,
    pub added_lines: usize,
    pub deleted_lines: usize,
}

/// Working-tree status grouped by change kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub modified_files: Vec<String>,
    pub untracked_files: Vec<String>,
    pub deleted_files: Vec<String>,
    pub staged_files: Vec<String>,
}

/// Progress report emitted while cloning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProgress {
    pub percentage: u8,
    pub stage: String,
    pub details: String,
}

pub type ProgressCallback = Arc<dyn Fn(CloneProgress) + Send + Sync>;

/// Authentication for a remote.
///
/// SSH support is degraded: without a running agent the operation proceeds
/// anonymously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GitCredentials {
    #[default]
    None,
    HttpsToken {
        username: Option<String>,
        token: String,
    },
    SshKey {
        private_key: String,
        passphrase: Option<String>,
    },
}

/// Result of a mutating Git operation. Failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitOutcome {
    pub success: bool,
    pub error_message: Option<String>,
}

impl GitOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }
}
