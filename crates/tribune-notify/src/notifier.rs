use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use tribune_db::Database;
use tribune_types::events::ThreadWasUpdated;

/// Delivers a notification to one user. Called from a blocking context.
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: &str, notification: &ThreadWasUpdated) -> Result<()>;
}

/// Stores notifications in the `notifications` table, where the user reads
/// them through their profile.
pub struct DatabaseNotifier {
    db: Arc<Database>,
}

impl DatabaseNotifier {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl Notifier for DatabaseNotifier {
    fn notify(&self, user_id: &str, notification: &ThreadWasUpdated) -> Result<()> {
        let data = serde_json::to_string(notification)?;
        self.db.insert_notification(
            &Uuid::new_v4().to_string(),
            user_id,
            ThreadWasUpdated::KIND,
            &data,
        )
    }
}
