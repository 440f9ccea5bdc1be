//! URL slugs for threads and channels.

use anyhow::Result;
use rusqlite::Connection;

/// Used when a title has no letters or digits at all.
const FALLBACK_SLUG: &str = "thread";

/// Lower-cases `value`, turns runs of whitespace, `-` and `_` into a single
/// `-`, and drops every other non-alphanumeric character.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            match fold(c) {
                Some(ascii) => slug.push_str(ascii),
                None => slug.extend(c.to_lowercase()),
            }
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// Strips the accent from common Latin letters so "Ação" slugs as "acao".
fn fold(c: char) -> Option<&'static str> {
    let ascii = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => "e",
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => "i",
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => "o",
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => "u",
        'ç' | 'Ç' => "c",
        'ñ' | 'Ñ' => "n",
        'ß' => "ss",
        _ => return None,
    };
    Some(ascii)
}

/// Picks the first free slug for a new thread: `slug`, then `slug-2`,
/// `slug-3`, ... in order.
///
/// Check-then-insert: callers must run this and the INSERT under the same
/// writer lock. Across processes the UNIQUE index on `threads.slug` is what
/// catches a collision.
pub fn unique_thread_slug(conn: &Connection, title: &str) -> Result<String> {
    let mut original = slugify(title);
    if original.is_empty() {
        original = FALLBACK_SLUG.to_string();
    }

    let mut slug = original.clone();
    let mut count = 2;
    while thread_slug_exists(conn, &slug)? {
        slug = format!("{}-{}", original, count);
        count += 1;
    }

    Ok(slug)
}

fn thread_slug_exists(conn: &Connection, slug: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM threads WHERE slug = ?1)",
        [slug],
        |row| row.get(0),
    )?;
    Ok(exists)
}
