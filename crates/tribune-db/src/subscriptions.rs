use anyhow::Result;

use crate::models::SubscriptionRow;
use crate::{Database, now};

impl Database {
    /// Subscribes a user to a thread. Returns false if they already were;
    /// the (thread_id, user_id) pair is unique so repeats are no-ops.
    pub fn subscribe(&self, id: &str, thread_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO thread_subscriptions (id, thread_id, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, thread_id, user_id, now()),
            )?;
            Ok(n > 0)
        })
    }

    /// Returns false if there was nothing to remove.
    pub fn unsubscribe(&self, thread_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM thread_subscriptions WHERE thread_id = ?1 AND user_id = ?2",
                [thread_id, user_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn is_subscribed(&self, thread_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM thread_subscriptions WHERE thread_id = ?1 AND user_id = ?2)",
                [thread_id, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn get_subscriptions(&self, thread_id: &str) -> Result<Vec<SubscriptionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thread_id, user_id, created_at
                 FROM thread_subscriptions
                 WHERE thread_id = ?1",
            )?;
            let rows = stmt
                .query_map([thread_id], |row| {
                    Ok(SubscriptionRow {
                        id: row.get(0)?,
                        thread_id: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn is_subscribed_tracks_the_row() {
        let db = db();
        let ana = user(&db, "ana");
        let bruno = user(&db, "bruno");
        let (id, _) = thread(&db, &ana, "Watch me");

        assert!(!db.is_subscribed(&id, &bruno).unwrap());

        assert!(db.subscribe("s1", &id, &bruno).unwrap());
        assert!(db.is_subscribed(&id, &bruno).unwrap());
        assert!(!db.is_subscribed(&id, &ana).unwrap());

        assert!(db.unsubscribe(&id, &bruno).unwrap());
        assert!(!db.is_subscribed(&id, &bruno).unwrap());
    }

    #[test]
    fn subscribe_twice_keeps_one_row() {
        let db = db();
        let ana = user(&db, "ana");
        let (id, _) = thread(&db, &ana, "Watch me");

        assert!(db.subscribe("s1", &id, &ana).unwrap());
        assert!(!db.subscribe("s2", &id, &ana).unwrap());

        let subs = db.get_subscriptions(&id).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "s1");
        assert_eq!(subs[0].user_id, ana);
        assert_eq!(subs[0].thread_id, id);
    }

    #[test]
    fn unsubscribe_without_subscription_is_a_noop() {
        let db = db();
        let ana = user(&db, "ana");
        let (id, _) = thread(&db, &ana, "Watch me");
        assert!(!db.unsubscribe(&id, &ana).unwrap());
    }
}
