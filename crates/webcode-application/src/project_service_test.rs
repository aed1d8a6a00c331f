use super::*;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;
use webcode_core::git::{GitCommit, GitDiffResult, GitOutcome, GitStatus};
use webcode_core::project::AuthType;
use webcode_infrastructure::{SqliteDatabase, SqliteProjectRepository};

/// Git stand-in that creates the target directory on a successful clone.
#[derive(Default)]
struct FakeGit {
    fail_with: Option<String>,
    cloned: Mutex<Vec<(String, String, GitCredentials)>>,
}

#[async_trait]
impl GitService for FakeGit {
    fn is_repository(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }

    async fn clone_repository(
        &self,
        url: &str,
        local_path: &Path,
        branch: &str,
        credentials: &GitCredentials,
        _progress: Option<ProgressCallback>,
    ) -> GitOutcome {
        self.cloned
            .lock()
            .unwrap()
            .push((url.to_string(), branch.to_string(), credentials.clone()));
        match &self.fail_with {
            Some(message) => GitOutcome::failure(message.clone()),
            None => {
                std::fs::create_dir_all(local_path.join(".git")).unwrap();
                GitOutcome::ok()
            }
        }
    }

    async fn pull(&self, local_path: &Path, _credentials: &GitCredentials) -> GitOutcome {
        if self.is_repository(local_path) {
            GitOutcome::ok()
        } else {
            GitOutcome::failure("path is not a git repository")
        }
    }

    async fn file_history(&self, _path: &Path, _file: &str, _max: usize) -> Vec<GitCommit> {
        Vec::new()
    }

    async fn all_commits(&self, _path: &Path, _max: usize) -> Vec<GitCommit> {
        Vec::new()
    }

    async fn file_content_at_commit(&self, _path: &Path, _file: &str, _commit: &str) -> String {
        String::new()
    }

    async fn file_diff(&self, _path: &Path, _file: &str, _from: &str, _to: &str) -> GitDiffResult {
        GitDiffResult::default()
    }

    async fn workspace_status(&self, _path: &Path) -> GitStatus {
        GitStatus::default()
    }

    async fn list_remote_branches(
        &self,
        url: &str,
        _credentials: &GitCredentials,
    ) -> (Vec<String>, Option<String>) {
        if url.contains("unreachable") {
            (Vec::new(), Some("could not resolve host".into()))
        } else {
            (vec!["develop".into(), "main".into()], None)
        }
    }

    async fn current_branch(&self, path: &Path) -> Option<String> {
        self.is_repository(path).then(|| "main".to_string())
    }
}

fn service_with(git: FakeGit, root: &Path) -> ProjectService {
    let db = SqliteDatabase::open_in_memory().unwrap();
    ProjectService::new(
        Arc::new(SqliteProjectRepository::new(db)),
        Arc::new(git),
        root,
    )
}

fn input(name: &str) -> ProjectInput {
    ProjectInput {
        name: name.into(),
        git_url: "https://example.com/demo.git".into(),
        auth_type: AuthType::Https,
        https_username: Some("alice".into()),
        https_token: Some("token-1".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_assigns_path_and_defaults() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let owner = Owner::new("alice").unwrap();

    let project = service.create(&owner, input("demo")).await.unwrap();

    assert_eq!(project.status, ProjectStatus::Pending);
    assert_eq!(project.branch, DEFAULT_BRANCH);
    assert_eq!(
        PathBuf::from(&project.local_path),
        root.path().join("alice").join(&project.id)
    );
    assert!(Uuid::parse_str(&project.id).is_ok());
}

#[tokio::test]
async fn test_name_is_unique_per_owner() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let alice = Owner::new("alice").unwrap();
    let bob = Owner::new("bob").unwrap();

    let first = service.create(&alice, input("demo")).await.unwrap();
    let err = service.create(&alice, input("demo")).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(service.create(&bob, input("demo")).await.is_ok());

    // Renaming to its own name is fine.
    assert!(service.update(&alice, &first.id, input("demo")).await.is_ok());
}

#[tokio::test]
async fn test_validation_rejects_blank_fields() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let owner = Owner::default_owner();

    let mut blank_url = input("demo");
    blank_url.git_url = "  ".into();
    assert!(service.create(&owner, blank_url).await.unwrap_err().is_invalid_argument());
    assert!(service.create(&owner, input(" ")).await.unwrap_err().is_invalid_argument());
}

#[tokio::test]
async fn test_update_keeps_omitted_secrets() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let owner = Owner::default_owner();
    let project = service.create(&owner, input("demo")).await.unwrap();

    let mut change = input("renamed");
    change.https_token = None;
    change.branch = Some("develop".into());
    let updated = service.update(&owner, &project.id, change).await.unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.branch, "develop");
    assert_eq!(updated.https_token.as_deref(), Some("token-1"));
}

#[tokio::test]
async fn test_clone_success_marks_ready() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let owner = Owner::default_owner();
    let project = service.create(&owner, input("demo")).await.unwrap();

    let cloned = service.clone_project(&owner, &project.id, None).await.unwrap();

    assert_eq!(cloned.status, ProjectStatus::Ready);
    assert!(cloned.last_sync_at.is_some());
    assert_eq!(
        service.current_branch(&owner, &project.id).await.as_deref(),
        Some("main")
    );
    let pulled = service.pull_project(&owner, &project.id).await.unwrap();
    assert_eq!(pulled.status, ProjectStatus::Ready);
}

#[tokio::test]
async fn test_clone_failure_records_error() {
    let root = TempDir::new().unwrap();
    let git = FakeGit {
        fail_with: Some("authentication failed".into()),
        ..Default::default()
    };
    let service = service_with(git, root.path());
    let owner = Owner::default_owner();
    let project = service.create(&owner, input("demo")).await.unwrap();

    let result = service.clone_project(&owner, &project.id, None).await.unwrap();

    assert_eq!(result.status, ProjectStatus::Error);
    assert_eq!(result.error_message.as_deref(), Some("authentication failed"));
    let stored = service.get(&owner, &project.id).await.unwrap();
    assert_eq!(stored.status, ProjectStatus::Error);
}

#[tokio::test]
async fn test_clone_passes_credentials() {
    let root = TempDir::new().unwrap();
    let git = Arc::new(FakeGit::default());
    let db = SqliteDatabase::open_in_memory().unwrap();
    let service = ProjectService::new(
        Arc::new(SqliteProjectRepository::new(db)),
        git.clone(),
        root.path(),
    );
    let owner = Owner::default_owner();
    let project = service.create(&owner, input("demo")).await.unwrap();

    service.clone_project(&owner, &project.id, None).await.unwrap();

    let calls = git.cloned.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, DEFAULT_BRANCH);
    assert!(matches!(
        &calls[0].2,
        GitCredentials::HttpsToken { token, .. } if token == "token-1"
    ));
}

#[tokio::test]
async fn test_delete_removes_clone_directory() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let owner = Owner::default_owner();
    let project = service.create(&owner, input("demo")).await.unwrap();
    service.clone_project(&owner, &project.id, None).await.unwrap();
    assert!(Path::new(&project.local_path).exists());

    assert!(service.delete(&owner, &project.id).await.unwrap());
    assert!(!Path::new(&project.local_path).exists());
    assert!(!service.delete(&owner, &project.id).await.unwrap());
}

#[tokio::test]
async fn test_missing_project_is_not_found() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let err = service
        .clone_project(&Owner::default_owner(), "nope", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_remote_branches() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());

    let branches = service
        .list_remote_branches("https://example.com/demo.git", &GitCredentials::None)
        .await
        .unwrap();
    assert_eq!(branches, vec!["develop", "main"]);

    let err = service
        .list_remote_branches("https://unreachable.invalid/x.git", &GitCredentials::None)
        .await
        .unwrap_err();
    assert!(matches!(err, WebCodeError::Git(_)));
}

#[tokio::test]
async fn test_history_requires_file_and_project() {
    let root = TempDir::new().unwrap();
    let service = service_with(FakeGit::default(), root.path());
    let owner = Owner::default_owner();
    let project = service.create(&owner, input("demo")).await.unwrap();

    let err = service
        .file_history(&owner, &project.id, " ", 10)
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(service.commits(&owner, "missing", 10).await.unwrap_err().is_not_found());
    assert!(service.commits(&owner, &project.id, 10).await.unwrap().is_empty());
    assert_eq!(
        service.workspace_status(&owner, &project.id).await.unwrap(),
        GitStatus::default()
    );
}

#[tokio::test]
async fn test_option_like_git_arguments_are_rejected_before_git_runs() {
    let root = TempDir::new().unwrap();
    let git = Arc::new(FakeGit::default());
    let db = SqliteDatabase::open_in_memory().unwrap();
    let service = ProjectService::new(
        Arc::new(SqliteProjectRepository::new(db)),
        git.clone(),
        root.path(),
    );
    let owner = Owner::new("alice").unwrap();

    let mut hostile = input("demo");
    hostile.git_url = "--upload-pack=touch /tmp/owned".into();
    assert!(service.create(&owner, hostile).await.unwrap_err().is_invalid_argument());

    let mut hostile_branch = input("demo");
    hostile_branch.branch = Some("--config=core.pager=sh".into());
    assert!(
        service
            .create(&owner, hostile_branch)
            .await
            .unwrap_err()
            .is_invalid_argument()
    );

    let err = service
        .list_remote_branches(" --upload-pack=sh", &GitCredentials::None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());

    let project = service.create(&owner, input("demo")).await.unwrap();
    for (file, from, to) in [
        ("notes.txt", "--output=/tmp/owned", "HEAD"),
        ("notes.txt", "HEAD~1", "-p"),
        ("--output=x", "HEAD~1", "HEAD"),
    ] {
        let err = service
            .file_diff(&owner, &project.id, file, from, to)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument(), "{file} {from} {to}");
    }
    assert!(git.cloned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_projects_follow_stored_workspace_root() {
    use crate::system_settings_service::{SystemDefaults, SystemSettingsService};
    use webcode_infrastructure::SqliteSystemSettingRepository;

    let temp = TempDir::new().unwrap();
    let db = SqliteDatabase::open_in_memory().unwrap();
    let system = Arc::new(SystemSettingsService::new(
        Arc::new(SqliteSystemSettingRepository::new(db.clone())),
        SystemDefaults {
            workspace_root: temp.path().join("configured"),
            default_username: "default".into(),
            identity_header: "x-webcode-user".into(),
        },
    ));
    let service = ProjectService::with_workspace_roots(
        Arc::new(SqliteProjectRepository::new(db)),
        Arc::new(FakeGit::default()),
        system.clone(),
    );
    let owner = Owner::new("alice").unwrap();

    let before = service.create(&owner, input("before")).await.unwrap();
    let moved = temp.path().join("moved");
    system
        .set_workspace_root(&moved.to_string_lossy())
        .await
        .unwrap();
    let after = service.create(&owner, input("after")).await.unwrap();

    assert!(PathBuf::from(&before.local_path).starts_with(temp.path().join("configured")));
    assert_eq!(PathBuf::from(&after.local_path), moved.join("alice").join(&after.id));
    assert_eq!(service.workspace_root().await, moved);
}
