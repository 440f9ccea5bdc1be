use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS channels (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            slug        TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS threads (
            id              TEXT PRIMARY KEY,
            channel_id      TEXT NOT NULL REFERENCES channels(id),
            user_id         TEXT NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            slug            TEXT NOT NULL UNIQUE,
            body            TEXT NOT NULL,
            locked          INTEGER NOT NULL DEFAULT 0,
            best_reply_id   TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_threads_channel
            ON threads(channel_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_threads_user
            ON threads(user_id, created_at);

        CREATE TABLE IF NOT EXISTS replies (
            id          TEXT PRIMARY KEY,
            thread_id   TEXT NOT NULL REFERENCES threads(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_replies_thread
            ON replies(thread_id, created_at);

        CREATE TABLE IF NOT EXISTS thread_subscriptions (
            id          TEXT PRIMARY KEY,
            thread_id   TEXT NOT NULL REFERENCES threads(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            UNIQUE(thread_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS activities (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            subject_id      TEXT NOT NULL,
            subject_type    TEXT NOT NULL,
            kind            TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_activities_user
            ON activities(user_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_activities_subject
            ON activities(subject_type, subject_id);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL,
            data        TEXT NOT NULL,
            read_at     TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, read_at);

        CREATE TABLE IF NOT EXISTS threads_index (
            thread_id   TEXT PRIMARY KEY,
            record      TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        -- Seed the default channels
        INSERT OR IGNORE INTO channels (id, name, slug, created_at)
            VALUES ('00000000-0000-0000-0000-000000000001', 'General', 'general',
                    strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));
        INSERT OR IGNORE INTO channels (id, name, slug, created_at)
            VALUES ('00000000-0000-0000-0000-000000000002', 'Off Topic', 'off-topic',
                    strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
