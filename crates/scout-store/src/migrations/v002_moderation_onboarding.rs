use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Per-viewer moderation lists
CREATE TABLE IF NOT EXISTS blocked_users (
    user_id         TEXT NOT NULL,
    blocked_user_id TEXT NOT NULL,
    created_at      TEXT NOT NULL,

    PRIMARY KEY (user_id, blocked_user_id)
);

CREATE TABLE IF NOT EXISTS muted_users (
    user_id       TEXT NOT NULL,
    muted_user_id TEXT NOT NULL,
    created_at    TEXT NOT NULL,

    PRIMARY KEY (user_id, muted_user_id)
);

-- Onboarding answers, one JSON document per step column
CREATE TABLE IF NOT EXISTS onboarding_responses (
    user_id             TEXT PRIMARY KEY NOT NULL,
    current_status      TEXT,
    region_preferences  TEXT,
    climate_preferences TEXT,
    culture_preferences TEXT,
    hobbies             TEXT,
    administration      TEXT,
    costs               TEXT,
    submitted_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS onboarding_status (
    user_id      TEXT PRIMARY KEY NOT NULL,
    completed    INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    completed_at TEXT
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
