//! Git project models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::git::GitCredentials;

/// Branch cloned when none is given.
pub const DEFAULT_BRANCH: &str = "main";

/// How the remote is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthType {
    #[default]
    None,
    Https,
    Ssh,
}

/// Lifecycle of the local mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProjectStatus {
    #[default]
    Pending,
    Cloning,
    Ready,
    Error,
}

/// A Git remote mirrored into the local workspace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub git_url: String,
    pub auth_type: AuthType,
    pub https_username: Option<String>,
    pub https_token: Option<String>,
    pub ssh_private_key: Option<String>,
    pub ssh_passphrase: Option<String>,
    pub branch: String,
    pub local_path: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Credentials matching the configured auth type.
    pub fn credentials(&self) -> GitCredentials {
        credentials(
            self.auth_type,
            &self.https_username,
            &self.https_token,
            &self.ssh_private_key,
            &self.ssh_passphrase,
        )
    }

    pub fn view(&self) -> ProjectView {
        ProjectView::from(self)
    }
}

/// Client-facing projection of a [`Project`] with secrets removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub git_url: String,
    pub auth_type: AuthType,
    pub https_username: Option<String>,
    pub has_credentials: bool,
    pub branch: String,
    pub local_path: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        let has_secret = |value: &Option<String>| value.as_deref().is_some_and(|s| !s.is_empty());
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            git_url: project.git_url.clone(),
            auth_type: project.auth_type,
            https_username: project.https_username.clone(),
            has_credentials: has_secret(&project.https_token) || has_secret(&project.ssh_private_key),
            branch: project.branch.clone(),
            local_path: project.local_path.clone(),
            last_sync_at: project.last_sync_at,
            status: project.status,
            error_message: project.error_message.clone(),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Fields accepted when creating or updating a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub https_username: Option<String>,
    #[serde(default)]
    pub https_token: Option<String>,
    #[serde(default)]
    pub ssh_private_key: Option<String>,
    #[serde(default)]
    pub ssh_passphrase: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl ProjectInput {
    /// Credentials given with the input, for talking to a remote before a
    /// project exists.
    pub fn credentials(&self) -> GitCredentials {
        credentials(
            self.auth_type,
            &self.https_username,
            &self.https_token,
            &self.ssh_private_key,
            &self.ssh_passphrase,
        )
    }
}

fn credentials(
    auth_type: AuthType,
    https_username: &Option<String>,
    https_token: &Option<String>,
    ssh_private_key: &Option<String>,
    ssh_passphrase: &Option<String>,
) -> GitCredentials {
    match auth_type {
        AuthType::None => GitCredentials::None,
        AuthType::Https => GitCredentials::HttpsToken {
            username: https_username.clone(),
            token: https_token.clone().unwrap_or_default(),
        },
        AuthType::Ssh => GitCredentials::SshKey {
            private_key: ssh_private_key.clone().unwrap_or_default(),
            passphrase: ssh_passphrase.clone(),
        },
    }
}
