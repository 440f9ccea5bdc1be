use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Activity, Channel, User};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub token: String,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChannelRequest {
    pub name: String,
}

// -- Threads --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateThreadRequest {
    pub channel_id: Uuid,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    /// Already sanitized.
    pub body: String,
    pub path: String,
    pub channel: Channel,
    pub creator: User,
    pub locked: bool,
    pub best_reply_id: Option<Uuid>,
    pub replies_count: u64,
    /// Always false for anonymous viewers.
    pub is_subscribed_to: bool,
    /// `None` for anonymous viewers.
    pub has_updates: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadDetailResponse {
    #[serde(flatten)]
    pub thread: ThreadResponse,
    pub replies: Vec<ReplyResponse>,
}

/// Flattened thread as exported to the `threads_index` search table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub path: String,
    pub channel: Channel,
    pub creator: User,
    pub locked: bool,
    pub best_reply_id: Option<Uuid>,
    pub replies_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Replies --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddReplyRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub owner: User,
    pub body: String,
    pub is_best: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Subscriptions --

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub subscribed: bool,
}

// -- Profiles --

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
    pub path: String,
    pub threads: Vec<ThreadResponse>,
    pub activities: Vec<Activity>,
}
