use anyhow::Result;
use rusqlite::params;

use couple_types::models::PushSubscription;

use super::new_id;
use crate::Database;
use crate::models::{PushSubscriptionRow, now_timestamp};

impl Database {
    /// Register a browser push endpoint for `user_id`. Re-registering the same
    /// endpoint moves it to the new user and refreshes its keys.
    pub fn upsert_push_subscription(
        &self,
        user_id: &str,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(endpoint) DO UPDATE SET
                    user_id = excluded.user_id,
                    p256dh = excluded.p256dh,
                    auth = excluded.auth",
                params![new_id(), user_id, endpoint, p256dh, auth, now_timestamp()],
            )?;
            Ok(())
        })
    }

    pub fn push_subscriptions_for(&self, user_id: &str) -> Result<Vec<PushSubscription>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, endpoint, p256dh, auth, created_at
                 FROM push_subscriptions WHERE user_id = ?1",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(PushSubscriptionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        endpoint: row.get(2)?,
                        p256dh: row.get(3)?,
                        auth: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(PushSubscription::from).collect())
        })
    }

    pub fn delete_push_subscription(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM push_subscriptions WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_unique_and_moves_between_users() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_push_subscription("sajid", "https://push/1", "p", "a").unwrap();
        db.upsert_push_subscription("nasywa", "https://push/1", "p2", "a2").unwrap();

        assert!(db.push_subscriptions_for("sajid").unwrap().is_empty());
        let subs = db.push_subscriptions_for("nasywa").unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].p256dh, "p2");

        db.delete_push_subscription(&subs[0].id).unwrap();
        assert!(db.push_subscriptions_for("nasywa").unwrap().is_empty());
    }
}
