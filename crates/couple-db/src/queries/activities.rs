use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, Row, params};

use couple_types::models::{Activity, ActivityComment, toggle_reaction};

use super::{OptionalExt, new_id};
use crate::Database;
use crate::models::{
    ActivityRow, CommentRow, encode_reactions, now_timestamp, parse_reactions,
};

const ACTIVITY_COLUMNS: &str = "id, text, image_url, sender, date, status, reactions, created_at";

impl Database {
    pub fn create_activity(
        &self,
        text: &str,
        image_url: Option<&str>,
        sender: &str,
        date: &str,
    ) -> Result<Activity> {
        let id = new_id();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO activities (id, text, image_url, sender, date, status, reactions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', '[]', ?6)",
                params![id, text, image_url, sender, date, now_timestamp()],
            )?;
            require_activity(conn, &id)
        })
    }

    /// Activities logged on `date`, newest first, each with its comments
    /// oldest first.
    pub fn get_activities_by_date(&self, date: &str) -> Result<Vec<Activity>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE date = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([date], map_activity_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
            let mut comments = query_comments_for(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|row| {
                    let own = comments.remove(&row.id).unwrap_or_default();
                    row.into_activity(own)
                })
                .collect())
        })
    }

    pub fn get_activity(&self, id: &str) -> Result<Option<Activity>> {
        self.with_conn(|conn| query_activity(conn, id))
    }

    pub fn set_activity_status(&self, id: &str, status: &str) -> Result<Option<Activity>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE activities SET status = ?2 WHERE id = ?1",
                params![id, status],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_activity(conn, id)
        })
    }

    /// Same full-array rewrite as message reactions.
    pub fn toggle_activity_reaction(
        &self,
        id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<Option<Activity>> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let current: Option<String> = tx
                .query_row("SELECT reactions FROM activities WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(raw) = current else {
                return Ok(None);
            };

            let mut reactions = parse_reactions(&raw);
            toggle_reaction(&mut reactions, user, emoji);

            tx.execute(
                "UPDATE activities SET reactions = ?2 WHERE id = ?1",
                params![id, encode_reactions(&reactions)],
            )?;
            let updated = query_activity(&tx, id)?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Append a comment. Returns None if the activity does not exist.
    pub fn add_activity_comment(
        &self,
        activity_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Option<ActivityComment>> {
        let id = new_id();
        self.with_conn(|conn| {
            let exists: Option<String> = conn
                .query_row("SELECT id FROM activities WHERE id = ?1", [activity_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }

            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO activity_comments (id, activity_id, sender, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, activity_id, sender, text, created_at],
            )?;

            Ok(Some(ActivityComment::from(CommentRow {
                id: id.clone(),
                activity_id: activity_id.to_string(),
                sender: sender.to_string(),
                text: text.to_string(),
                created_at,
            })))
        })
    }
}

fn map_activity_row(row: &Row<'_>) -> rusqlite::Result<ActivityRow> {
    Ok(ActivityRow {
        id: row.get(0)?,
        text: row.get(1)?,
        image_url: row.get(2)?,
        sender: row.get(3)?,
        date: row.get(4)?,
        status: row.get(5)?,
        reactions: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_activity(conn: &Connection, id: &str) -> Result<Option<Activity>> {
    let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1");
    let Some(row) = conn.query_row(&sql, [id], map_activity_row).optional()? else {
        return Ok(None);
    };
    let mut comments = query_comments_for(conn, &[row.id.clone()])?;
    let own = comments.remove(&row.id).unwrap_or_default();
    Ok(Some(row.into_activity(own)))
}

fn require_activity(conn: &Connection, id: &str) -> Result<Activity> {
    query_activity(conn, id)?.ok_or_else(|| anyhow::anyhow!("Activity vanished after write: {}", id))
}

/// Batch-fetch comments for a set of activity IDs, grouped by activity.
fn query_comments_for(
    conn: &Connection,
    activity_ids: &[String],
) -> Result<HashMap<String, Vec<ActivityComment>>> {
    let mut grouped: HashMap<String, Vec<ActivityComment>> = HashMap::new();
    if activity_ids.is_empty() {
        return Ok(grouped);
    }

    let placeholders: Vec<String> = (1..=activity_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT id, activity_id, sender, text, created_at FROM activity_comments
         WHERE activity_id IN ({})
         ORDER BY created_at ASC, rowid ASC",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(activity_ids.iter()), |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                activity_id: row.get(1)?,
                sender: row.get(2)?,
                text: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for row in rows {
        grouped
            .entry(row.activity_id.clone())
            .or_default()
            .push(ActivityComment::from(row));
    }

    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activities_for_date_are_newest_first_with_ordered_comments() {
        let db = Database::open_in_memory().unwrap();
        let first = db.create_activity("gym", None, "sajid", "2025-02-14").unwrap();
        let second = db
            .create_activity("lunch", Some("https://img/x.jpg"), "nasywa", "2025-02-14")
            .unwrap();
        db.create_activity("other day", None, "sajid", "2025-02-15").unwrap();

        db.add_activity_comment(&first.id, "nasywa", "proud of you").unwrap();
        db.add_activity_comment(&first.id, "sajid", "thanks").unwrap();

        let activities = db.get_activities_by_date("2025-02-14").unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].id, second.id);
        assert_eq!(activities[1].id, first.id);

        let texts: Vec<&str> = activities[1].comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["proud of you", "thanks"]);
        assert_eq!(activities[1].status, "pending");
    }

    #[test]
    fn status_and_reaction_updates() {
        let db = Database::open_in_memory().unwrap();
        let activity = db.create_activity("run", None, "sajid", "2025-02-14").unwrap();

        let done = db.set_activity_status(&activity.id, "done").unwrap().unwrap();
        assert_eq!(done.status, "done");

        let reacted = db
            .toggle_activity_reaction(&activity.id, "nasywa", "🔥")
            .unwrap()
            .unwrap();
        assert_eq!(reacted.reactions.len(), 1);

        assert!(db.set_activity_status("missing", "done").unwrap().is_none());
        assert!(db.add_activity_comment("missing", "sajid", "hi").unwrap().is_none());
    }
}
