use anyhow::Result;
use rusqlite::{Connection, Row};

use crate::activities::{delete_activities_for, record_activity};
use crate::models::{AuthorRow, ReplyRow};
use crate::threads::touch_thread;
use crate::{Database, OptionalExt, now};

const REPLY_SELECT: &str = "
    SELECT r.id, r.thread_id, r.body, r.created_at, r.updated_at,
           u.id, u.name, u.email, u.created_at
    FROM replies r
    JOIN users u ON u.id = r.user_id";

impl Database {
    /// Persists a reply, bumps the thread's `updated_at` and records the activity.
    pub fn insert_reply(&self, id: &str, thread_id: &str, user_id: &str, body: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let ts = now();

            tx.execute(
                "INSERT INTO replies (id, thread_id, user_id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, thread_id, user_id, body, ts],
            )?;
            touch_thread(&tx, thread_id)?;
            record_activity(&tx, user_id, id, "reply", "created_reply")?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Replies of a thread, oldest first.
    pub fn get_replies(&self, thread_id: &str) -> Result<Vec<ReplyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE r.thread_id = ?1 ORDER BY r.created_at ASC, r.rowid ASC",
                REPLY_SELECT
            ))?;
            let rows = stmt
                .query_map([thread_id], reply_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_reply(&self, id: &str) -> Result<Option<ReplyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} WHERE r.id = ?1", REPLY_SELECT))?;
            let row = stmt.query_row([id], reply_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn delete_reply(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = delete_reply_in(&tx, id)?;
            tx.commit()?;
            Ok(removed)
        })
    }
}

/// Removes one reply and whatever hangs off it: its activity rows and any
/// thread's best-reply pointer at it.
pub(crate) fn delete_reply_in(conn: &Connection, id: &str) -> Result<bool> {
    delete_activities_for(conn, "reply", id)?;
    conn.execute("UPDATE threads SET best_reply_id = NULL WHERE best_reply_id = ?1", [id])?;
    let n = conn.execute("DELETE FROM replies WHERE id = ?1", [id])?;
    Ok(n > 0)
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyRow> {
    Ok(ReplyRow {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        body: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        owner: AuthorRow {
            id: row.get(5)?,
            name: row.get(6)?,
            email: row.get(7)?,
            created_at: row.get(8)?,
        },
    })
}
