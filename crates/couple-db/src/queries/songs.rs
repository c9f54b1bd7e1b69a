use anyhow::Result;
use rusqlite::params;

use couple_types::models::PlaylistSong;

use super::new_id;
use crate::Database;
use crate::models::{SongRow, now_timestamp};

impl Database {
    /// Append a song to the end of the shared playlist.
    pub fn create_song(
        &self,
        url: &str,
        title: &str,
        effect: &str,
        chat_key: &str,
    ) -> Result<PlaylistSong> {
        let id = new_id();
        self.with_conn(|conn| {
            let order: i64 = conn.query_row(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM playlist_songs WHERE chat_key = ?1",
                [chat_key],
                |row| row.get(0),
            )?;
            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO playlist_songs (id, url, title, effect, chat_key, sort_order, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, url, title, effect, chat_key, order, created_at],
            )?;

            Ok(PlaylistSong::from(SongRow {
                id: id.clone(),
                url: url.to_string(),
                title: title.to_string(),
                effect: effect.to_string(),
                chat_key: chat_key.to_string(),
                sort_order: order,
                created_at,
            }))
        })
    }

    /// All songs, oldest first.
    pub fn list_songs(&self) -> Result<Vec<PlaylistSong>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, effect, chat_key, sort_order, created_at
                 FROM playlist_songs ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SongRow {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        title: row.get(2)?,
                        effect: row.get(3)?,
                        chat_key: row.get(4)?,
                        sort_order: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(PlaylistSong::from).collect())
        })
    }

    pub fn delete_song(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM playlist_songs WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}
