use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::ActivityRow;
use crate::{Database, now};

impl Database {
    /// A user's activity feed, newest first.
    pub fn get_activities(&self, user_id: &str, limit: u32) -> Result<Vec<ActivityRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, subject_id, subject_type, kind, created_at
                 FROM activities
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(ActivityRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        subject_id: row.get(2)?,
                        subject_type: row.get(3)?,
                        kind: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn record_activity(
    conn: &Connection,
    user_id: &str,
    subject_id: &str,
    subject_type: &str,
    kind: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO activities (id, user_id, subject_id, subject_type, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![Uuid::new_v4().to_string(), user_id, subject_id, subject_type, kind, now()],
    )?;
    Ok(())
}

pub(crate) fn delete_activities_for(conn: &Connection, subject_type: &str, subject_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM activities WHERE subject_type = ?1 AND subject_id = ?2",
        [subject_type, subject_id],
    )?;
    Ok(())
}
