//! The `threads_index` table: one flattened JSON record per thread plus a
//! lower-cased text column that searches match against.

use anyhow::Result;
use rusqlite::Connection;

use crate::{Database, now};

impl Database {
    /// Inserts or replaces the thread's search record.
    pub fn index_thread(&self, thread_id: &str, record: &str, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO threads_index (thread_id, record, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(thread_id) DO UPDATE SET record = excluded.record, content = excluded.content",
                (thread_id, record, content.to_lowercase(), now()),
            )?;
            Ok(())
        })
    }

    /// Records whose content contains every term, newest first.
    /// An empty term list matches nothing.
    pub fn search_threads(&self, terms: &[&str], limit: u32) -> Result<Vec<String>> {
        if terms.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let clauses: Vec<String> = (1..=terms.len())
                .map(|i| format!("content LIKE ?{} ESCAPE '\\'", i))
                .collect();
            let sql = format!(
                "SELECT record FROM threads_index WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT ?{}",
                clauses.join(" AND "),
                terms.len() + 1
            );

            let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();
            let mut params: Vec<&dyn rusqlite::types::ToSql> = patterns
                .iter()
                .map(|p| p as &dyn rusqlite::types::ToSql)
                .collect();
            params.push(&limit);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn remove_from_index(conn: &Connection, thread_id: &str) -> Result<()> {
    conn.execute("DELETE FROM threads_index WHERE thread_id = ?1", [thread_id])?;
    Ok(())
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
