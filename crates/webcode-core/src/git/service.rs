//! Git mirror service trait.

use std::path::Path;

use async_trait::async_trait;

use super::model::{
    GitCommit, GitCredentials, GitDiffResult, GitOutcome, GitStatus, ProgressCallback,
};

/// Default number of commits returned by [`GitService::file_history`].
pub const DEFAULT_FILE_HISTORY_LIMIT: usize = 50;

/// Default number of commits returned by [`GitService::all_commits`].
pub const DEFAULT_ALL_COMMITS_LIMIT: usize = 100;

/// Clone, pull, history and diff operations against a single remote.
///
/// No method returns an error: failures become a [`GitOutcome`] failure or an
/// empty result and are logged by the implementation.
#[async_trait]
pub trait GitService: Send + Sync {
    fn is_repository(&self, path: &Path) -> bool;

    /// Clones `url` into `local_path`, replacing anything already there.
    ///
    /// On failure the target directory is removed.
    async fn clone_repository(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        credentials: &GitCredentials,
        progress: Option<ProgressCallback>,
    ) -> GitOutcome;

    async fn pull(&self, local_path: &Path, credentials: &GitCredentials) -> GitOutcome;

    async fn file_history(&self, path: &Path, file: &str, max_count: usize) -> Vec<GitCommit>;

    async fn all_commits(&self, path: &Path, max_count: usize) -> Vec<GitCommit>;

    async fn file_content_at_commit(&self, path: &Path, file: &str, commit: &str) -> String;

    async fn file_diff(
        &self,
        path: &Path,
        file: &str,
        from_commit: &str,
        to_commit: &str,
    ) -> GitDiffResult;

    async fn workspace_status(&self, path: &Path) -> GitStatus;

    /// Branch names of the remote, or an error message.
    async fn list_remote_branches(
        &self,
        url: &str,
        credentials: &GitCredentials,
    ) -> (Vec<String>, Option<String>);

    async fn current_branch(&self, path: &Path) -> Option<String>;
}
