//! SQLite schema bootstrap.
//!
//! Every per-user table carries a `username` column that is part of every
//! query predicate. `system_setting` is process-wide.

use rusqlite::Connection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chat_session (
    username          TEXT NOT NULL,
    session_id        TEXT NOT NULL,
    title             TEXT NOT NULL,
    workspace_path    TEXT NOT NULL DEFAULT '',
    tool_id           TEXT NOT NULL DEFAULT '',
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    is_workspace_valid INTEGER NOT NULL DEFAULT 1,
    project_id        TEXT,
    PRIMARY KEY (username, session_id)
);
CREATE INDEX IF NOT EXISTS idx_chat_session_updated
    ON chat_session (username, updated_at);

CREATE TABLE IF NOT EXISTS chat_message (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    session_id  TEXT NOT NULL,
    role        TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    ordinal     INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chat_message_session
    ON chat_message (username, session_id);

CREATE TABLE IF NOT EXISTS session_output (
    username              TEXT NOT NULL,
    session_id            TEXT NOT NULL,
    raw_output            TEXT NOT NULL DEFAULT '',
    events_json           TEXT,
    displayed_event_count INTEGER NOT NULL DEFAULT 20,
    updated_at            TEXT NOT NULL,
    PRIMARY KEY (username, session_id)
);

CREATE TABLE IF NOT EXISTS prompt_template (
    username     TEXT NOT NULL,
    id           TEXT NOT NULL,
    title        TEXT NOT NULL,
    content      TEXT NOT NULL,
    category     TEXT NOT NULL DEFAULT '',
    icon         TEXT NOT NULL DEFAULT '',
    is_custom    INTEGER NOT NULL DEFAULT 1,
    is_favorite  INTEGER NOT NULL DEFAULT 0,
    variables    TEXT NOT NULL DEFAULT '[]',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (username, id)
);
CREATE INDEX IF NOT EXISTS idx_prompt_template_category
    ON prompt_template (username, category);

CREATE TABLE IF NOT EXISTS input_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    username   TEXT NOT NULL,
    text       TEXT NOT NULL,
    timestamp  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_input_history_timestamp
    ON input_history (username, timestamp);

CREATE TABLE IF NOT EXISTS quick_action (
    username    TEXT NOT NULL,
    id          TEXT NOT NULL,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    icon        TEXT NOT NULL DEFAULT '',
    sort_order  INTEGER NOT NULL DEFAULT 0,
    is_enabled  INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (username, id)
);

CREATE TABLE IF NOT EXISTS user_setting (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT,
    updated_at  TEXT NOT NULL,
    UNIQUE (username, key)
);

CREATE TABLE IF NOT EXISTS project (
    username         TEXT NOT NULL,
    id               TEXT NOT NULL,
    name             TEXT NOT NULL,
    git_url          TEXT NOT NULL,
    auth_type        TEXT NOT NULL DEFAULT 'none',
    https_username   TEXT,
    https_token      TEXT,
    ssh_private_key  TEXT,
    ssh_passphrase   TEXT,
    branch           TEXT NOT NULL DEFAULT 'main',
    local_path       TEXT NOT NULL DEFAULT '',
    last_sync_at     TEXT,
    status           TEXT NOT NULL DEFAULT 'pending',
    error_message    TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    PRIMARY KEY (username, id),
    UNIQUE (username, name)
);

CREATE TABLE IF NOT EXISTS system_setting (
    key          TEXT PRIMARY KEY,
    value        TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    updated_at   TEXT NOT NULL
);
"#;

/// Creates all tables and indexes that do not exist yet.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
