use anyhow::Result;
use rusqlite::{Connection, Row, params};

use couple_types::channel::display_name;
use couple_types::models::Profile;

use super::{OptionalExt, new_id};
use crate::Database;
use crate::models::{ProfileRow, now_timestamp};

const PROFILE_COLUMNS: &str = "id, role, name, avatar_url, latitude, longitude, track_name, \
                               track_artist, track_image, is_playing, updated_at";

impl Database {
    pub fn get_profile(&self, role: &str) -> Result<Option<Profile>> {
        self.with_conn(|conn| query_profile(conn, role))
    }

    /// Fetch the profile for `role`, creating a default one on first access.
    pub fn get_or_create_profile(&self, role: &str) -> Result<Profile> {
        self.with_conn(|conn| {
            ensure_profile(conn, role)?;
            require_profile(conn, role)
        })
    }

    /// Create or update the profile for `role`. Fields given as `None` keep
    /// their stored value; a new profile is named after its role.
    pub fn upsert_profile(
        &self,
        role: &str,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Profile> {
        let id = new_id();
        let initial_name = name.map_or_else(|| display_name(role), str::to_string);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, role, name, avatar_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(role) DO UPDATE SET
                    name = COALESCE(?6, name),
                    avatar_url = COALESCE(excluded.avatar_url, avatar_url),
                    updated_at = excluded.updated_at",
                params![id, role, initial_name, avatar_url, now_timestamp(), name],
            )?;
            require_profile(conn, role)
        })
    }

    pub fn update_location(&self, role: &str, latitude: f64, longitude: f64) -> Result<Profile> {
        self.with_conn(|conn| {
            ensure_profile(conn, role)?;
            conn.execute(
                "UPDATE profiles SET latitude = ?2, longitude = ?3, updated_at = ?4 WHERE role = ?1",
                params![role, latitude, longitude, now_timestamp()],
            )?;
            require_profile(conn, role)
        })
    }

    pub fn update_now_playing(
        &self,
        role: &str,
        track_name: Option<&str>,
        track_artist: Option<&str>,
        track_image: Option<&str>,
        is_playing: bool,
    ) -> Result<Profile> {
        self.with_conn(|conn| {
            ensure_profile(conn, role)?;
            conn.execute(
                "UPDATE profiles
                 SET track_name = ?2, track_artist = ?3, track_image = ?4, is_playing = ?5, updated_at = ?6
                 WHERE role = ?1",
                params![role, track_name, track_artist, track_image, is_playing, now_timestamp()],
            )?;
            require_profile(conn, role)
        })
    }
}

fn ensure_profile(conn: &Connection, role: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO profiles (id, role, name, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![new_id(), role, display_name(role), now_timestamp()],
    )?;
    Ok(())
}

fn map_profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        role: row.get(1)?,
        name: row.get(2)?,
        avatar_url: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        track_name: row.get(6)?,
        track_artist: row.get(7)?,
        track_image: row.get(8)?,
        is_playing: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn query_profile(conn: &Connection, role: &str) -> Result<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ?1");
    let row = conn.query_row(&sql, [role], map_profile_row).optional()?;
    Ok(row.map(Profile::from))
}

fn require_profile(conn: &Connection, role: &str) -> Result<Profile> {
    query_profile(conn, role)?.ok_or_else(|| anyhow::anyhow!("Profile vanished after write: {}", role))
}
