use anyhow::Result;
use rusqlite::{Connection, Row, params};

use couple_types::models::Image;

use super::{OptionalExt, new_id};
use crate::Database;
use crate::models::{ImageRow, now_timestamp};

const IMAGE_COLUMNS: &str = "id, storage_id, url, sender, receiver, view_type, viewed, created_at";

impl Database {
    pub fn create_image(
        &self,
        storage_id: Option<&str>,
        url: &str,
        sender: &str,
        receiver: &str,
        view_type: &str,
    ) -> Result<Image> {
        let id = new_id();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO images (id, storage_id, url, sender, receiver, view_type, viewed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                params![id, storage_id, url, sender, receiver, view_type, now_timestamp()],
            )?;
            query_image(conn, &id)?
                .ok_or_else(|| anyhow::anyhow!("Image vanished after write: {}", id))
        })
    }

    /// Images sent or received by `user` (all images when None), newest first.
    pub fn list_images(&self, user: Option<&str>) -> Result<Vec<Image>> {
        self.with_conn(|conn| {
            let rows = match user {
                Some(user) => {
                    let sql = format!(
                        "SELECT {IMAGE_COLUMNS} FROM images WHERE sender = ?1 OR receiver = ?1
                         ORDER BY created_at DESC, rowid DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([user], map_image_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!(
                        "SELECT {IMAGE_COLUMNS} FROM images ORDER BY created_at DESC, rowid DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([], map_image_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows.into_iter().map(Image::from).collect())
        })
    }

    pub fn get_image(&self, id: &str) -> Result<Option<Image>> {
        self.with_conn(|conn| query_image(conn, id))
    }

    pub fn mark_image_viewed(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE images SET viewed = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn delete_image(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM images WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn map_image_row(row: &Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        storage_id: row.get(1)?,
        url: row.get(2)?,
        sender: row.get(3)?,
        receiver: row.get(4)?,
        view_type: row.get(5)?,
        viewed: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_image(conn: &Connection, id: &str) -> Result<Option<Image>> {
    let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_image_row).optional()?;
    Ok(row.map(Image::from))
}
