use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            chat_key    TEXT NOT NULL,
            sender      TEXT NOT NULL,
            text        TEXT NOT NULL DEFAULT '',
            kind        TEXT NOT NULL DEFAULT 'text',
            image_url   TEXT,
            unlock_at   TEXT,
            status      TEXT NOT NULL DEFAULT 'sent',
            is_pinned   INTEGER NOT NULL DEFAULT 0,
            reactions   TEXT NOT NULL DEFAULT '[]',
            timestamp   TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_chat
            ON messages(chat_key, created_at);

        CREATE TABLE IF NOT EXISTS activities (
            id          TEXT PRIMARY KEY,
            text        TEXT NOT NULL,
            image_url   TEXT,
            sender      TEXT NOT NULL,
            date        TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'pending',
            reactions   TEXT NOT NULL DEFAULT '[]',
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_activities_date
            ON activities(date, created_at);

        CREATE TABLE IF NOT EXISTS activity_comments (
            id          TEXT PRIMARY KEY,
            activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
            sender      TEXT NOT NULL,
            text        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_activity
            ON activity_comments(activity_id, created_at);

        CREATE TABLE IF NOT EXISTS profiles (
            id           TEXT PRIMARY KEY,
            role         TEXT NOT NULL UNIQUE,
            name         TEXT NOT NULL,
            avatar_url   TEXT,
            latitude     REAL,
            longitude    REAL,
            track_name   TEXT,
            track_artist TEXT,
            track_image  TEXT,
            is_playing   INTEGER NOT NULL DEFAULT 0,
            updated_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS images (
            id          TEXT PRIMARY KEY,
            storage_id  TEXT,
            url         TEXT NOT NULL,
            sender      TEXT NOT NULL,
            receiver    TEXT NOT NULL,
            view_type   TEXT NOT NULL DEFAULT 'permanent',
            viewed      INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS playlist_songs (
            id          TEXT PRIMARY KEY,
            url         TEXT NOT NULL,
            title       TEXT NOT NULL,
            effect      TEXT NOT NULL DEFAULT 'none',
            chat_key    TEXT NOT NULL,
            sort_order  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS push_subscriptions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            endpoint    TEXT NOT NULL UNIQUE,
            p256dh      TEXT NOT NULL,
            auth        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_push_user
            ON push_subscriptions(user_id);

        CREATE TABLE IF NOT EXISTS global_settings (
            id           TEXT PRIMARY KEY,
            stop_effects INTEGER NOT NULL DEFAULT 0,
            updated_by   TEXT,
            updated_at   TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
