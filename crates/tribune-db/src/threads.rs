use std::collections::HashSet;

use anyhow::Result;
use rusqlite::{Connection, Row};
use tracing::debug;

use crate::activities::{delete_activities_for, record_activity};
use crate::models::{AuthorRow, ChannelRow, ThreadRow};
use crate::replies::delete_reply_in;
use crate::search::remove_from_index;
use crate::slug::unique_thread_slug;
use crate::{Database, OptionalExt, now};

/// Thread columns plus its channel, creator and reply count, in one round trip.
const THREAD_SELECT: &str = "
    SELECT t.id, t.title, t.slug, t.body, t.locked, t.best_reply_id,
           (SELECT COUNT(*) FROM replies r WHERE r.thread_id = t.id),
           t.created_at, t.updated_at,
           c.id, c.name, c.slug, c.created_at,
           u.id, u.name, u.email, u.created_at
    FROM threads t
    JOIN channels c ON c.id = t.channel_id
    JOIN users u ON u.id = t.user_id";

/// Newest first; rowid breaks ties between threads created in the same instant.
const NEWEST_FIRST: &str = "ORDER BY t.created_at DESC, t.rowid DESC";

impl Database {
    /// Inserts a thread and returns the slug it was given.
    ///
    /// Slug probing and the INSERT share one transaction under the writer lock.
    pub fn create_thread(
        &self,
        id: &str,
        channel_id: &str,
        user_id: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let slug = unique_thread_slug(&tx, title)?;
            let ts = now();

            tx.execute(
                "INSERT INTO threads (id, channel_id, user_id, title, slug, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                rusqlite::params![id, channel_id, user_id, title, slug, body, ts],
            )?;
            record_activity(&tx, user_id, id, "thread", "created_thread")?;

            tx.commit()?;
            debug!("Thread {} created with slug '{}'", id, slug);
            Ok(slug)
        })
    }

    pub fn get_thread(&self, id: &str) -> Result<Option<ThreadRow>> {
        self.with_conn(|conn| query_thread(conn, "t.id", id))
    }

    pub fn get_thread_by_slug(&self, slug: &str) -> Result<Option<ThreadRow>> {
        self.with_conn(|conn| query_thread(conn, "t.slug", slug))
    }

    /// All threads, or only those of one channel, newest first.
    pub fn list_threads(&self, channel_slug: Option<&str>, limit: u32) -> Result<Vec<ThreadRow>> {
        self.with_conn(|conn| match channel_slug {
            Some(slug) => query_threads(conn, "WHERE c.slug = ?1", rusqlite::params![slug, limit]),
            None => query_threads(conn, "", rusqlite::params![limit]),
        })
    }

    /// A user's threads, newest first.
    pub fn threads_by_user(&self, user_id: &str, limit: u32) -> Result<Vec<ThreadRow>> {
        self.with_conn(|conn| {
            query_threads(conn, "WHERE t.user_id = ?1", rusqlite::params![user_id, limit])
        })
    }

    pub fn set_thread_locked(&self, id: &str, locked: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE threads SET locked = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![locked, now(), id],
            )?;
            Ok(n > 0)
        })
    }

    /// Points the thread at its best reply. Ownership of the reply is the caller's concern.
    pub fn mark_best_reply(&self, thread_id: &str, reply_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE threads SET best_reply_id = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![reply_id, now(), thread_id],
            )?;
            Ok(n > 0)
        })
    }

    /// Deletes the thread and everything it owns.
    ///
    /// Replies are removed one at a time so each reply's own cleanup runs,
    /// rather than leaning on a foreign-key cascade.
    pub fn delete_thread(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let reply_ids: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM replies WHERE thread_id = ?1")?;
                stmt.query_map([id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            for reply_id in &reply_ids {
                delete_reply_in(&tx, reply_id)?;
            }

            tx.execute("DELETE FROM thread_subscriptions WHERE thread_id = ?1", [id])?;
            delete_activities_for(&tx, "thread", id)?;
            remove_from_index(&tx, id)?;
            let removed = tx.execute("DELETE FROM threads WHERE id = ?1", [id])?;

            tx.commit()?;
            debug!("Thread {} deleted along with {} replies", id, reply_ids.len());
            Ok(removed > 0)
        })
    }

    /// Ids of every thread the user is subscribed to.
    pub fn subscribed_thread_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT thread_id FROM thread_subscriptions WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<HashSet<_>, _>>()?;
            Ok(ids)
        })
    }
}

pub(crate) fn touch_thread(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("UPDATE threads SET updated_at = ?1 WHERE id = ?2", (now(), id))?;
    Ok(())
}

// `column` is always one of our own literals, never user input.
fn query_thread(conn: &Connection, column: &str, value: &str) -> Result<Option<ThreadRow>> {
    let mut stmt = conn.prepare(&format!("{} WHERE {} = ?1", THREAD_SELECT, column))?;
    let row = stmt.query_row([value], thread_from_row).optional()?;
    Ok(row)
}

/// `filter` binds its values first; the LIMIT is always the last parameter.
fn query_threads(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<ThreadRow>> {
    let sql = format!(
        "{} {} {} LIMIT ?{}",
        THREAD_SELECT,
        filter,
        NEWEST_FIRST,
        params.len()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, thread_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<ThreadRow> {
    Ok(ThreadRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        body: row.get(3)?,
        locked: row.get(4)?,
        best_reply_id: row.get(5)?,
        replies_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        channel: ChannelRow {
            id: row.get(9)?,
            name: row.get(10)?,
            slug: row.get(11)?,
            created_at: row.get(12)?,
        },
        creator: AuthorRow {
            id: row.get(13)?,
            name: row.get(14)?,
            email: row.get(15)?,
            created_at: row.get(16)?,
        },
    })
}
