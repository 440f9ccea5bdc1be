/// Database row types — these map directly to SQLite rows.
/// Distinct from tribune-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

/// A user joined onto another row. Never carries the password column.
#[derive(Debug, Clone)]
pub struct AuthorRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<UserRow> for AuthorRow {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ThreadRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Raw, unsanitized.
    pub body: String,
    pub locked: bool,
    pub best_reply_id: Option<String>,
    pub replies_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub channel: ChannelRow,
    pub creator: AuthorRow,
}

#[derive(Debug, Clone)]
pub struct ReplyRow {
    pub id: String,
    pub thread_id: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: AuthorRow,
}

pub struct SubscriptionRow {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub created_at: String,
}

pub struct ActivityRow {
    pub id: String,
    pub user_id: String,
    pub subject_id: String,
    pub subject_type: String,
    pub kind: String,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    /// JSON document
    pub data: String,
    pub read_at: Option<String>,
    pub created_at: String,
}
