use crate::models::{ChannelRow, UserRow};
use crate::{Database, OptionalExt, now};
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, name, email, password, created_at";
const CHANNEL_COLUMNS: &str = "id, name, slug, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, name: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, name, email, password_hash, now()),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "name", name))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Channels --

    pub fn create_channel(&self, id: &str, name: &str, slug: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, name, slug, now()),
            )?;
            Ok(())
        })
    }

    pub fn list_channels(&self) -> Result<Vec<ChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM channels ORDER BY name", CHANNEL_COLUMNS))?;
            let rows = stmt
                .query_map([], channel_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_channel_by_slug(&self, slug: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel(conn, "slug", slug))
    }

    pub fn get_channel_by_id(&self, id: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel(conn, "id", id))
    }
}

// `column` is always one of our own literals, never user input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_channel(conn: &Connection, column: &str, value: &str) -> Result<Option<ChannelRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {} FROM channels WHERE {} = ?1", CHANNEL_COLUMNS, column))?;
    let row = stmt.query_row([value], channel_from_row).optional()?;
    Ok(row)
}

fn channel_from_row(row: &Row<'_>) -> rusqlite::Result<ChannelRow> {
    Ok(ChannelRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
    })
}
