use anyhow::Result;
use rusqlite::{Connection, params};

use couple_types::models::GlobalSettings;

use crate::Database;
use crate::models::{SettingsRow, now_timestamp};

/// Settings are a single row.
const SETTINGS_ID: &str = "default";

impl Database {
    pub fn get_or_create_settings(&self) -> Result<GlobalSettings> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO global_settings (id, stop_effects, updated_at)
                 VALUES (?1, 0, ?2)",
                params![SETTINGS_ID, now_timestamp()],
            )?;
            query_settings(conn)
        })
    }

    pub fn upsert_settings(
        &self,
        stop_effects: bool,
        updated_by: Option<&str>,
    ) -> Result<GlobalSettings> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO global_settings (id, stop_effects, updated_by, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    stop_effects = excluded.stop_effects,
                    updated_by = excluded.updated_by,
                    updated_at = excluded.updated_at",
                params![SETTINGS_ID, stop_effects, updated_by, now_timestamp()],
            )?;
            query_settings(conn)
        })
    }
}

fn query_settings(conn: &Connection) -> Result<GlobalSettings> {
    let row = conn.query_row(
        "SELECT id, stop_effects, updated_by, updated_at FROM global_settings WHERE id = ?1",
        [SETTINGS_ID],
        |row| {
            Ok(SettingsRow {
                id: row.get(0)?,
                stop_effects: row.get(1)?,
                updated_by: row.get(2)?,
                updated_at: row.get(3)?,
            })
        },
    )?;
    Ok(GlobalSettings::from(row))
}
