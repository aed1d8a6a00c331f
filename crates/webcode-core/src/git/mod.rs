pub mod diff;
pub mod model;
pub mod service;

pub use diff::diff_lines;
pub use model::{
    CloneProgress, DEFAULT_HTTPS_USERNAME, DiffLine, DiffLineType, GitCommit, GitCredentials,
    GitDiffResult, GitOutcome, GitStatus, ProgressCallback,
};
pub use service::{DEFAULT_ALL_COMMITS_LIMIT, DEFAULT_FILE_HISTORY_LIMIT, GitService};
