use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Last time each user looked at each thread, keyed by `(user_id, thread_id)`.
/// Process-local; forgotten on restart.
#[derive(Clone, Default)]
pub struct VisitTracker {
    visits: Arc<RwLock<HashMap<(Uuid, Uuid), DateTime<Utc>>>>,
}

impl VisitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, user_id: Uuid, thread_id: Uuid) {
        self.record_at(user_id, thread_id, Utc::now()).await;
    }

    pub async fn record_at(&self, user_id: Uuid, thread_id: Uuid, at: DateTime<Utc>) {
        self.visits.write().await.insert((user_id, thread_id), at);
    }

    pub async fn last_visit(&self, user_id: Uuid, thread_id: Uuid) -> Option<DateTime<Utc>> {
        self.visits.read().await.get(&(user_id, thread_id)).copied()
    }

    /// True when the thread changed after the user's last visit, or they never visited.
    pub async fn has_updates_for(&self, user_id: Uuid, thread_id: Uuid, updated_at: DateTime<Utc>) -> bool {
        match self.last_visit(user_id, thread_id).await {
            Some(visited) => updated_at > visited,
            None => true,
        }
    }
}
