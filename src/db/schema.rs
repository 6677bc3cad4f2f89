//! Database schema and migrations for Serene.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users available for chat identity claims
    r#"
CREATE TABLE users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    username        TEXT NOT NULL UNIQUE,
    connection_id   TEXT UNIQUE,             -- NULL while unclaimed
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_connection_id ON users(connection_id);
"#,
    // v2: chat message log
    r#"
CREATE TABLE messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    room        TEXT NOT NULL,
    sender      TEXT NOT NULL,
    text        TEXT NOT NULL,
    created_at  TEXT NOT NULL                -- RFC 3339, microsecond precision, UTC
);

CREATE INDEX idx_messages_room_created ON messages(room, created_at, id);
"#,
];
