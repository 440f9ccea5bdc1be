use anyhow::Result;

use crate::models::NotificationRow;
use crate::{Database, now};

impl Database {
    pub fn insert_notification(&self, id: &str, user_id: &str, kind: &str, data: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, kind, data, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, user_id, kind, data, now()),
            )?;
            Ok(())
        })
    }

    /// Unread notifications for a user, newest first.
    pub fn unread_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, kind, data, read_at, created_at
                 FROM notifications
                 WHERE user_id = ?1 AND read_at IS NULL
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        data: row.get(3)?,
                        read_at: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Only the owner's own unread notification can be marked.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE notifications SET read_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND read_at IS NULL",
                (now(), id, user_id),
            )?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn mark_read_hides_notification() {
        let db = db();
        let ana = user(&db, "ana");
        let bruno = user(&db, "bruno");
        db.insert_notification("n1", &ana, "thread_was_updated", r#"{"message":"hi"}"#).unwrap();
        db.insert_notification("n2", &ana, "thread_was_updated", r#"{"message":"again"}"#).unwrap();

        let unread = db.unread_notifications(&ana).unwrap();
        assert_eq!(unread.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["n2", "n1"]);
        assert!(unread.iter().all(|n| n.read_at.is_none()));

        assert!(!db.mark_notification_read("n1", &bruno).unwrap());
        assert!(db.mark_notification_read("n1", &ana).unwrap());
        assert!(!db.mark_notification_read("n1", &ana).unwrap());

        let unread = db.unread_notifications(&ana).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, "n2");
        assert!(db.unread_notifications(&bruno).unwrap().is_empty());
    }
}
