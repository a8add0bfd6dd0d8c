//! v001 -- Initial schema creation.
//!
//! Directory tables (`users`, `friendships`, `groups`, `group_members`,
//! `towns`, `countries`), chat tables (`messages`, `thread_reads`) and
//! favorites (`chat_favorites`, `favorite_towns`).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users and friendships
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL                -- RFC-3339
);

CREATE TABLE IF NOT EXISTS friendships (
    user_id    TEXT NOT NULL,                 -- FK -> users(id)
    friend_id  TEXT NOT NULL,                 -- FK -> users(id)
    created_at TEXT NOT NULL,

    PRIMARY KEY (user_id, friend_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (friend_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Group chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS groups (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id  TEXT NOT NULL,                  -- FK -> groups(id)
    user_id   TEXT NOT NULL,
    -- creator | admin_executive | admin | moderator | member
    role      TEXT NOT NULL DEFAULT 'member',
    joined_at TEXT NOT NULL,

    PRIMARY KEY (group_id, user_id),
    FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_group_members_user ON group_members(user_id);

-- ----------------------------------------------------------------
-- Towns and countries
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS towns (
    id      TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    name    TEXT NOT NULL,
    country TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS countries (
    name TEXT PRIMARY KEY NOT NULL
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    thread_key TEXT NOT NULL,                 -- canonical ThreadKey
    author_id  TEXT,                          -- nullable: legacy rows
    body       TEXT NOT NULL,
    created_at TEXT,                          -- nullable: legacy rows
    deleted_at TEXT,                          -- soft delete
    deleted_by TEXT,
    is_pinned  INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    pinned_at  TEXT,
    pinned_by  TEXT
);

CREATE INDEX IF NOT EXISTS idx_messages_thread_ts
    ON messages(thread_key, created_at);

CREATE TABLE IF NOT EXISTS thread_reads (
    user_id      TEXT NOT NULL,
    thread_key   TEXT NOT NULL,
    last_read_at TEXT NOT NULL,

    PRIMARY KEY (user_id, thread_key)
);

-- ----------------------------------------------------------------
-- Favorites
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_favorites (
    user_id        TEXT NOT NULL,
    chat_type      TEXT NOT NULL,             -- friend | group | town_lounge | country_lounge
    reference_id   TEXT NOT NULL,
    reference_name TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_chat_favorites_unique
    ON chat_favorites(user_id, chat_type, reference_id);

CREATE TABLE IF NOT EXISTS favorite_towns (
    user_id    TEXT NOT NULL,
    town_id    TEXT NOT NULL,                 -- FK -> towns(id)
    created_at TEXT NOT NULL,

    PRIMARY KEY (user_id, town_id),
    FOREIGN KEY (town_id) REFERENCES towns(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
