//! [`GitService`] implemented on top of the `git` executable.
//!
//! Every command runs on the blocking pool with `GIT_TERMINAL_PROMPT=0` so a
//! missing credential fails fast instead of waiting on a prompt.

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

use webcode_core::git::{
    CloneProgress, DEFAULT_HTTPS_USERNAME, GitCommit, GitCredentials, GitDiffResult, GitOutcome,
    GitService, GitStatus, ProgressCallback, diff_lines,
};

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%aI%x1f%s%x1f%P%x1e";

/// Git operations backed by the system `git` binary.
#[derive(Debug, Clone)]
pub struct GitCliService {
    program: PathBuf,
}

impl Default for GitCliService {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCliService {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Uses a specific `git` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, cwd: Option<&Path>, credentials: &GitCredentials) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.args(credential_args(credentials));
        cmd
    }

    /// Runs a prepared command on the blocking pool, returning `fallback` if
    /// the task itself fails.
    async fn run_blocking<T, F>(&self, fallback: T, f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(GitCliService) -> T + Send + 'static,
    {
        let service = self.clone();
        match tokio::task::spawn_blocking(move || f(service)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("[Git] Blocking task failed: {}", e);
                fallback
            }
        }
    }

    fn is_repository_sync(&self, path: &Path) -> bool {
        if !path.join(".git").exists() {
            return false;
        }
        let mut cmd = self.command(Some(path), &GitCredentials::None);
        cmd.args(["rev-parse", "--is-inside-work-tree"]);
        run(&mut cmd).is_ok_and(|out| out.trim() == "true")
    }

    fn clone_sync(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        credentials: &GitCredentials,
        progress: Option<ProgressCallback>,
    ) -> GitOutcome {
        tracing::info!(
            "[Git] Cloning {} -> {} (branch: {})",
            url,
            local_path.display(),
            branch
        );

        if let Err(e) = prepare_clone_target(local_path) {
            tracing::error!("[Git] Failed to prepare {}: {}", local_path.display(), e);
            return GitOutcome::failure(format!("failed to prepare target directory: {e}"));
        }

        let mut cmd = self.command(None, credentials);
        cmd.args(["clone", "--progress"]);
        if !branch.trim().is_empty() {
            cmd.args(["--branch", branch.trim(), "--single-branch"]);
        }
        cmd.arg("--").arg(url).arg(local_path);

        match run_with_progress(&mut cmd, progress) {
            Ok(()) => {
                tracing::info!("[Git] Clone finished: {}", local_path.display());
                GitOutcome::ok()
            }
            Err(message) => {
                tracing::error!("[Git] Clone of {} failed: {}", url, message);
                if local_path.exists() {
                    if let Err(e) = std::fs::remove_dir_all(local_path) {
                        tracing::warn!(
                            "[Git] Failed to clean up {}: {}",
                            local_path.display(),
                            e
                        );
                    }
                }
                GitOutcome::failure(format!("clone failed: {message}"))
            }
        }
    }

    fn pull_sync(&self, local_path: &Path, credentials: &GitCredentials) -> GitOutcome {
        if !self.is_repository_sync(local_path) {
            return GitOutcome::failure("path is not a git repository");
        }

        tracing::info!("[Git] Pulling {}", local_path.display());
        let mut cmd = self.command(Some(local_path), credentials);
        cmd.args(["pull", "--ff-only"]);
        match run(&mut cmd) {
            Ok(_) => GitOutcome::ok(),
            Err(message) => {
                tracing::error!("[Git] Pull of {} failed: {}", local_path.display(), message);
                GitOutcome::failure(format!("pull failed: {message}"))
            }
        }
    }

    fn log_sync(&self, path: &Path, file: Option<&str>, max_count: usize) -> Vec<GitCommit> {
        if !self.is_repository_sync(path) {
            return Vec::new();
        }
        let mut cmd = self.command(Some(path), &GitCredentials::None);
        cmd.args(["log", "-n", &max_count.to_string(), LOG_FORMAT]);
        if let Some(file) = file {
            cmd.args(["--", &normalize_file_path(file)]);
        }
        match run(&mut cmd) {
            Ok(out) => parse_log(&out),
            Err(message) => {
                tracing::warn!("[Git] log failed in {}: {}", path.display(), message);
                Vec::new()
            }
        }
    }

    fn show_sync(&self, path: &Path, file: &str, commit: &str) -> String {
        if !self.is_repository_sync(path) {
            return String::new();
        }
        let mut cmd = self.command(Some(path), &GitCredentials::None);
        cmd.args(["show", "--end-of-options"])
            .arg(format!("{}:{}", commit, normalize_file_path(file)));
        run(&mut cmd).unwrap_or_else(|message| {
            tracing::debug!("[Git] show {}:{} failed: {}", commit, file, message);
            String::new()
        })
    }

    fn status_sync(&self, path: &Path) -> GitStatus {
        if !self.is_repository_sync(path) {
            return GitStatus::default();
        }
        let mut cmd = self.command(Some(path), &GitCredentials::None);
        cmd.args(["status", "--porcelain=v1"]);
        match run(&mut cmd) {
            Ok(out) => parse_status(&out),
            Err(message) => {
                tracing::warn!("[Git] status failed in {}: {}", path.display(), message);
                GitStatus::default()
            }
        }
    }

    fn ls_remote_sync(&self, url: &str, credentials: &GitCredentials) -> (Vec<String>, Option<String>) {
        tracing::info!("[Git] Listing remote branches of {}", url);
        let mut cmd = self.command(None, credentials);
        cmd.args(["ls-remote", "--heads", "--", url]);
        match run(&mut cmd) {
            Ok(out) => {
                let branches = parse_remote_heads(&out);
                tracing::info!("[Git] Found {} branches", branches.len());
                (branches, None)
            }
            Err(message) => {
                tracing::error!("[Git] ls-remote of {} failed: {}", url, message);
                (Vec::new(), Some(format!("failed to list branches: {message}")))
            }
        }
    }

    fn current_branch_sync(&self, path: &Path) -> Option<String> {
        if !self.is_repository_sync(path) {
            return None;
        }
        let mut cmd = self.command(Some(path), &GitCredentials::None);
        cmd.args(["rev-parse", "--abbrev-ref", "HEAD"]);
        run(&mut cmd)
            .ok()
            .map(|out| out.trim().to_string())
            .filter(|branch| !branch.is_empty())
    }
}

#[async_trait]
impl GitService for GitCliService {
    fn is_repository(&self, path: &Path) -> bool {
        self.is_repository_sync(path)
    }

    async fn clone_repository(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        credentials: &GitCredentials,
        progress: Option<ProgressCallback>,
    ) -> GitOutcome {
        let (url, local_path, branch, credentials) = (
            url.to_string(),
            local_path.to_path_buf(),
            branch.to_string(),
            credentials.clone(),
        );
        self.run_blocking(GitOutcome::failure("clone task failed"), move |git| {
            git.clone_sync(&url, &local_path, &branch, &credentials, progress)
        })
        .await
    }

    async fn pull(&self, local_path: &Path, credentials: &GitCredentials) -> GitOutcome {
        let (local_path, credentials) = (local_path.to_path_buf(), credentials.clone());
        self.run_blocking(GitOutcome::failure("pull task failed"), move |git| {
            git.pull_sync(&local_path, &credentials)
        })
        .await
    }

    async fn file_history(&self, path: &Path, file: &str, max_count: usize) -> Vec<GitCommit> {
        let (path, file) = (path.to_path_buf(), file.to_string());
        self.run_blocking(Vec::new(), move |git| git.log_sync(&path, Some(&file), max_count))
            .await
    }

    async fn all_commits(&self, path: &Path, max_count: usize) -> Vec<GitCommit> {
        let path = path.to_path_buf();
        self.run_blocking(Vec::new(), move |git| git.log_sync(&path, None, max_count))
            .await
    }

    async fn file_content_at_commit(&self, path: &Path, file: &str, commit: &str) -> String {
        let (path, file, commit) = (path.to_path_buf(), file.to_string(), commit.to_string());
        self.run_blocking(String::new(), move |git| git.show_sync(&path, &file, &commit))
            .await
    }

    async fn file_diff(
        &self,
        path: &Path,
        file: &str,
        from_commit: &str,
        to_commit: &str,
    ) -> GitDiffResult {
        let (path, file) = (path.to_path_buf(), file.to_string());
        let (from, to) = (from_commit.to_string(), to_commit.to_string());
        self.run_blocking(GitDiffResult::default(), move |git| {
            if !git.is_repository_sync(&path) {
                return GitDiffResult::default();
            }
            let old_content = git.show_sync(&path, &file, &from);
            let new_content = git.show_sync(&path, &file, &to);
            diff_lines(&old_content, &new_content)
        })
        .await
    }

    async fn workspace_status(&self, path: &Path) -> GitStatus {
        let path = path.to_path_buf();
        self.run_blocking(GitStatus::default(), move |git| git.status_sync(&path))
            .await
    }

    async fn list_remote_branches(
        &self,
        url: &str,
        credentials: &GitCredentials,
    ) -> (Vec<String>, Option<String>) {
        let (url, credentials) = (url.to_string(), credentials.clone());
        self.run_blocking(
            (Vec::new(), Some("failed to list branches".to_string())),
            move |git| git.ls_remote_sync(&url, &credentials),
        )
        .await
    }

    async fn current_branch(&self, path: &Path) -> Option<String> {
        let path = path.to_path_buf();
        self.run_blocking(None, move |git| git.current_branch_sync(&path))
            .await
    }
}

fn credential_args(credentials: &GitCredentials) -> Vec<String> {
    match credentials {
        GitCredentials::None => Vec::new(),
        GitCredentials::HttpsToken { username, token } => {
            if token.is_empty() {
                return Vec::new();
            }
            let username = username
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(DEFAULT_HTTPS_USERNAME);
            let encoded = STANDARD.encode(format!("{username}:{token}"));
            vec![
                "-c".to_string(),
                format!("http.extraHeader=Authorization: Basic {encoded}"),
            ]
        }
        GitCredentials::SshKey { .. } => {
            if std::env::var_os("SSH_AUTH_SOCK").is_none() {
                tracing::warn!(
                    "[Git] SSH authentication needs a running ssh-agent; continuing anonymously"
                );
            }
            Vec::new()
        }
    }
}

fn prepare_clone_target(local_path: &Path) -> std::io::Result<()> {
    if local_path.exists() {
        std::fs::remove_dir_all(local_path)?;
    }
    if let Some(parent) = local_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn normalize_file_path(file: &str) -> String {
    file.replace('\\', "/")
}

fn run(cmd: &mut Command) -> Result<String, String> {
    let output = cmd.output().map_err(|e| format!("failed to run git: {e}"))?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(failure_message(&String::from_utf8_lossy(&output.stderr), output.status))
    }
}

fn failure_message(stderr: &str, status: std::process::ExitStatus) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("git exited with {status}")
    } else {
        trimmed.to_string()
    }
}

/// Runs `cmd`, forwarding `NN%` progress lines from stderr to `progress`.
fn run_with_progress(cmd: &mut Command, progress: Option<ProgressCallback>) -> Result<(), String> {
    let mut child = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to run git: {e}"))?;

    let mut transcript = String::new();
    if let Some(stderr) = child.stderr.take() {
        let mut stderr = BufReader::new(stderr);
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        while let Ok(1) = stderr.read(&mut byte) {
            if byte[0] == b'\r' || byte[0] == b'\n' {
                let text = String::from_utf8_lossy(&line).into_owned();
                if let (Some(callback), Some(report)) = (&progress, parse_progress(&text)) {
                    callback(report);
                }
                if !text.trim().is_empty() && byte[0] == b'\n' {
                    transcript.push_str(text.trim());
                    transcript.push('\n');
                }
                line.clear();
            } else {
                line.push(byte[0]);
            }
        }
        if !line.is_empty() {
            transcript.push_str(String::from_utf8_lossy(&line).trim());
        }
    }

    let status = child.wait().map_err(|e| format!("failed to wait for git: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(failure_message(&transcript, status))
    }
}

/// Parses lines like `Receiving objects:  45% (9/20)`.
pub(crate) fn parse_progress(line: &str) -> Option<CloneProgress> {
    let (stage, rest) = line.trim().split_once(':')?;
    let rest = rest.trim_start();
    let percent_at = rest.find('%')?;
    let percentage: u8 = rest[..percent_at].trim().parse().ok()?;
    Some(CloneProgress {
        percentage: percentage.min(100),
        stage: stage.trim().trim_start_matches("remote:").trim().to_string(),
        details: rest[percent_at + 1..].trim().trim_end_matches(',').to_string(),
    })
}

pub(crate) fn parse_log(output: &str) -> Vec<GitCommit> {
    output
        .split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_matches(|c: char| c == '\n' || c == '\r');
            if record.is_empty() {
                return None;
            }
            let fields: Vec<&str> = record.split(FIELD_SEP).collect();
            if fields.len() < 6 {
                return None;
            }
            let commit_date = DateTime::parse_from_rfc3339(fields[3])
                .map(|d| d.with_timezone(&Utc))
                .ok()?;
            let hash = fields[0].to_string();
            Some(GitCommit {
                short_hash: hash.chars().take(7).collect(),
                hash,
                author: fields[1].to_string(),
                author_email: fields[2].to_string(),
                commit_date,
                message: fields[4].to_string(),
                parent_hashes: fields[5].split_whitespace().map(str::to_string).collect(),
            })
        })
        .collect()
}

pub(crate) fn parse_status(output: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let (code, path) = line.split_at(2);
        let path = path.trim();
        // Renames are reported as "old -> new".
        let path = path.rsplit(" -> ").next().unwrap_or(path).to_string();
        let mut chars = code.chars();
        let index = chars.next().unwrap_or(' ');
        let worktree = chars.next().unwrap_or(' ');

        if code == "??" {
            status.untracked_files.push(path);
            continue;
        }
        if index == 'M' || worktree == 'M' {
            status.modified_files.push(path.clone());
        }
        if index == 'A' {
            status.untracked_files.push(path.clone());
        }
        if index == 'D' || worktree == 'D' {
            status.deleted_files.push(path.clone());
        }
        if matches!(index, 'M' | 'A' | 'D' | 'R') {
            status.staged_files.push(path);
        }
    }
    status
}

pub(crate) fn parse_remote_heads(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|reference| reference.strip_prefix("refs/heads/"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .unwrap();
        assert!(status.status.success(), "git {:?} failed: {:?}", args, status);
    }

    /// Creates a repository with two commits of `notes.txt` on `main`.
    fn init_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        git(dir, &["init", "-q"]);
        git(dir, &["config", "user.name", "Test User"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
        std::fs::write(dir.join("notes.txt"), "alpha\nbeta\ngamma\n").unwrap();
        git(dir, &["add", "notes.txt"]);
        git(dir, &["commit", "-q", "-m", "first"]);
        std::fs::write(dir.join("notes.txt"), "alpha\nBETA\ngamma\ndelta\n").unwrap();
        git(dir, &["commit", "-q", "-am", "second"]);
        git(dir, &["branch", "-M", "main"]);
        temp
    }

    #[test]
    fn test_parse_progress() {
        let report = parse_progress("Receiving objects:  45% (9/20), 1.2 MiB").unwrap();
        assert_eq!(report.percentage, 45);
        assert_eq!(report.stage, "Receiving objects");
        assert!(report.details.starts_with("(9/20)"));

        let remote = parse_progress("remote: Counting objects: 100% (3/3), done.").unwrap();
        assert_eq!(remote.stage, "Counting objects");
        assert_eq!(remote.percentage, 100);

        assert!(parse_progress("Cloning into 'repo'...").is_none());
    }

    #[test]
    fn test_parse_status_groups_changes() {
        let output = " M src/lib.rs\nA  new.rs\n D gone.rs\n?? scratch.txt\nR  old.rs -> renamed.rs\n";
        let status = parse_status(output);
        assert_eq!(status.modified_files, vec!["src/lib.rs"]);
        assert_eq!(status.untracked_files, vec!["new.rs", "scratch.txt"]);
        assert_eq!(status.deleted_files, vec!["gone.rs"]);
        assert_eq!(status.staged_files, vec!["new.rs", "renamed.rs"]);
    }

    #[test]
    fn test_parse_remote_heads() {
        let output = "abc123\trefs/heads/main\ndef456\trefs/heads/feature/x\n789\trefs/tags/v1\n";
        assert_eq!(parse_remote_heads(output), vec!["main", "feature/x"]);
    }

    #[test]
    fn test_https_token_is_sent_as_basic_header() {
        let args = credential_args(&GitCredentials::HttpsToken {
            username: None,
            token: "tok".into(),
        });
        assert_eq!(args[0], "-c");
        assert_eq!(
            args[1],
            format!("http.extraHeader=Authorization: Basic {}", STANDARD.encode("git:tok"))
        );
        assert!(credential_args(&GitCredentials::None).is_empty());
    }

    #[tokio::test]
    async fn test_non_repository_yields_empty_results() {
        let temp = TempDir::new().unwrap();
        let service = GitCliService::new();

        assert!(!service.is_repository(temp.path()));
        assert!(service.all_commits(temp.path(), 10).await.is_empty());
        assert_eq!(service.current_branch(temp.path()).await, None);
        let outcome = service.pull(temp.path(), &GitCredentials::None).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_message.as_deref(), Some("path is not a git repository"));
    }

    #[tokio::test]
    async fn test_history_and_diff_against_real_repository() {
        if !git_available() {
            return;
        }
        let repo = init_repo();
        let service = GitCliService::new();

        assert!(service.is_repository(repo.path()));
        assert_eq!(service.current_branch(repo.path()).await.as_deref(), Some("main"));

        let history = service.file_history(repo.path(), "notes.txt", 50).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "second");
        assert_eq!(history[0].short_hash.len(), 7);
        assert_eq!(history[0].parent_hashes, vec![history[1].hash.clone()]);

        let diff = service
            .file_diff(repo.path(), "notes.txt", &history[1].hash, &history[0].hash)
            .await;
        assert_eq!(diff.added_lines, 2);
        assert_eq!(diff.deleted_lines, 1);
        assert!(diff.old_content.contains("beta"));
    }

    #[tokio::test]
    async fn test_option_like_commit_is_not_parsed_as_option() {
        if !git_available() {
            return;
        }
        let repo = init_repo();
        let outside = TempDir::new().unwrap();
        let service = GitCliService::new();
        let injected = format!("--output={}", outside.path().join("leak").display());

        let diff = service
            .file_diff(repo.path(), "notes.txt", &injected, "HEAD")
            .await;

        assert!(diff.old_content.is_empty());
        assert!(diff.new_content.contains("delta"));
        assert_eq!(std::fs::read_dir(outside.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_option_like_url_is_treated_as_repository() {
        if !git_available() {
            return;
        }
        let outside = TempDir::new().unwrap();
        let marker = outside.path().join("marker");
        let url = format!("--upload-pack=touch {}", marker.display());

        let (branches, error) = GitCliService::new()
            .list_remote_branches(&url, &GitCredentials::None)
            .await;

        assert!(branches.is_empty());
        assert!(error.is_some());
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_clone_local_repository_reports_success() {
        if !git_available() {
            return;
        }
        let source = init_repo();
        let target_root = TempDir::new().unwrap();
        let target = target_root.path().join("mirror");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.txt"), "old").unwrap();

        let reports: Arc<Mutex<Vec<CloneProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let callback: ProgressCallback = Arc::new(move |p: CloneProgress| sink.lock().unwrap().push(p));

        let service = GitCliService::new();
        let url = source.path().to_string_lossy().to_string();
        let outcome = service
            .clone_repository(&url, &target, "main", &GitCredentials::None, Some(callback))
            .await;

        assert!(outcome.success, "{:?}", outcome.error_message);
        assert!(target.join("notes.txt").exists());
        assert!(!target.join("stale.txt").exists());
        assert!(reports.lock().unwrap().iter().all(|p| p.percentage <= 100));

        let (branches, error) = service.list_remote_branches(&url, &GitCredentials::None).await;
        assert!(error.is_none());
        assert_eq!(branches, vec!["main"]);
    }

    #[tokio::test]
    async fn test_failed_clone_removes_target() {
        if !git_available() {
            return;
        }
        let target_root = TempDir::new().unwrap();
        let target = target_root.path().join("mirror");
        let missing = target_root.path().join("does-not-exist");

        let outcome = GitCliService::new()
            .clone_repository(
                &missing.to_string_lossy(),
                &target,
                "main",
                &GitCredentials::None,
                None,
            )
            .await;

        assert!(!outcome.success);
        assert!(outcome.error_message.is_some());
        assert!(!target.exists());
    }
}
