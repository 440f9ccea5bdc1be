//! Row → API model conversion. Every body read goes through the sanitizer here.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use tribune_db::models::{ActivityRow, AuthorRow, ChannelRow, NotificationRow, ReplyRow, ThreadRow};
use tribune_types::api::{ReplyResponse, SearchRecord, ThreadResponse};
use tribune_types::events::ThreadRef;
use tribune_types::models::{Activity, Channel, Notification, SubjectType, User, thread_path};

use crate::sanitize::clean_body;

/// What the current viewer knows about a thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewerFlags {
    pub is_subscribed_to: bool,
    pub has_updates: Option<bool>,
}

pub fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Older rows may hold SQLite's "YYYY-MM-DD HH:MM:SS" without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, raw, e);
            DateTime::default()
        })
}

pub fn user(row: &AuthorRow) -> User {
    User {
        id: parse_uuid(&row.id, "user id"),
        name: row.name.clone(),
        email: row.email.clone(),
        created_at: parse_timestamp(&row.created_at, "user created_at"),
    }
}

pub fn channel(row: &ChannelRow) -> Channel {
    Channel {
        id: parse_uuid(&row.id, "channel id"),
        name: row.name.clone(),
        slug: row.slug.clone(),
        created_at: parse_timestamp(&row.created_at, "channel created_at"),
    }
}

pub fn path(row: &ThreadRow) -> String {
    thread_path(&row.channel.slug, &row.slug)
}

pub fn thread(row: &ThreadRow, flags: ViewerFlags) -> ThreadResponse {
    ThreadResponse {
        id: parse_uuid(&row.id, "thread id"),
        title: row.title.clone(),
        slug: row.slug.clone(),
        body: clean_body(&row.body),
        path: path(row),
        channel: channel(&row.channel),
        creator: user(&row.creator),
        locked: row.locked,
        best_reply_id: row.best_reply_id.as_deref().map(|id| parse_uuid(id, "best_reply_id")),
        replies_count: row.replies_count.max(0) as u64,
        is_subscribed_to: flags.is_subscribed_to,
        has_updates: flags.has_updates,
        created_at: parse_timestamp(&row.created_at, "thread created_at"),
        updated_at: parse_timestamp(&row.updated_at, "thread updated_at"),
    }
}

pub fn thread_ref(row: &ThreadRow) -> ThreadRef {
    ThreadRef {
        id: parse_uuid(&row.id, "thread id"),
        title: row.title.clone(),
        path: path(row),
    }
}

pub fn reply(row: &ReplyRow, best_reply_id: Option<&str>) -> ReplyResponse {
    ReplyResponse {
        id: parse_uuid(&row.id, "reply id"),
        thread_id: parse_uuid(&row.thread_id, "reply thread_id"),
        owner: user(&row.owner),
        body: clean_body(&row.body),
        is_best: best_reply_id == Some(row.id.as_str()),
        created_at: parse_timestamp(&row.created_at, "reply created_at"),
        updated_at: parse_timestamp(&row.updated_at, "reply updated_at"),
    }
}

/// The thread as exported to the search index: its attributes plus `path`,
/// with nothing viewer-specific in it.
pub fn search_record(row: &ThreadRow) -> SearchRecord {
    let t = thread(row, ViewerFlags::default());
    SearchRecord {
        id: t.id,
        title: t.title,
        slug: t.slug,
        body: t.body,
        path: t.path,
        channel: t.channel,
        creator: t.creator,
        locked: t.locked,
        best_reply_id: t.best_reply_id,
        replies_count: t.replies_count,
        created_at: t.created_at,
        updated_at: t.updated_at,
    }
}

/// Rows with an unknown subject type are dropped.
pub fn activity(row: &ActivityRow) -> Option<Activity> {
    let Some(subject_type) = SubjectType::parse(&row.subject_type) else {
        warn!("Unknown subject_type '{}' on activity '{}'", row.subject_type, row.id);
        return None;
    };

    Some(Activity {
        id: parse_uuid(&row.id, "activity id"),
        user_id: parse_uuid(&row.user_id, "activity user_id"),
        subject_id: parse_uuid(&row.subject_id, "activity subject_id"),
        subject_type,
        kind: row.kind.clone(),
        created_at: parse_timestamp(&row.created_at, "activity created_at"),
    })
}

pub fn notification(row: &NotificationRow) -> Notification {
    Notification {
        id: parse_uuid(&row.id, "notification id"),
        kind: row.kind.clone(),
        data: serde_json::from_str(&row.data).unwrap_or_else(|e| {
            warn!("Corrupt data on notification '{}': {}", row.id, e);
            serde_json::Value::Null
        }),
        read_at: row.read_at.as_deref().map(|ts| parse_timestamp(ts, "notification read_at")),
        created_at: parse_timestamp(&row.created_at, "notification created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> AuthorRow {
        AuthorRow {
            id: Uuid::new_v4().to_string(),
            name: "ana".into(),
            email: "ana@example.com".into(),
            created_at: "2024-05-01T10:00:00.000000Z".into(),
        }
    }

    fn thread_row() -> ThreadRow {
        ThreadRow {
            id: Uuid::new_v4().to_string(),
            title: "Hello".into(),
            slug: "hello".into(),
            body: "<p>hi</p><script>evil()</script>".into(),
            locked: false,
            best_reply_id: None,
            replies_count: 3,
            created_at: "2024-05-01T10:00:00.000000Z".into(),
            updated_at: "2024-05-02T10:00:00.000000Z".into(),
            channel: ChannelRow {
                id: Uuid::new_v4().to_string(),
                name: "General".into(),
                slug: "general".into(),
                created_at: "2024-01-01T00:00:00.000Z".into(),
            },
            creator: author(),
        }
    }

    #[test]
    fn thread_body_is_sanitized_and_path_built() {
        let t = thread(&thread_row(), ViewerFlags::default());
        assert_eq!(t.body, "<p>hi</p>");
        assert_eq!(t.path, "/threads/general/hello");
        assert_eq!(t.replies_count, 3);
        assert!(t.updated_at > t.created_at);
    }

    #[test]
    fn search_record_carries_path_and_no_viewer_state() {
        let record = serde_json::to_value(search_record(&thread_row())).unwrap();
        assert_eq!(record["path"], "/threads/general/hello");
        assert_eq!(record["creator"]["name"], "ana");
        assert!(record.get("is_subscribed_to").is_none());
        assert!(record.get("password").is_none());
        assert!(record["creator"].get("password").is_none());
    }

    #[test]
    fn reply_knows_if_it_is_best() {
        let row = ReplyRow {
            id: "4f1d2c9e-8d5b-4f5e-9d7a-2b1c3d4e5f60".into(),
            thread_id: Uuid::new_v4().to_string(),
            body: "<a href=\"javascript:x()\">link</a>".into(),
            created_at: "2024-05-01T10:00:00.000000Z".into(),
            updated_at: "2024-05-01T10:00:00.000000Z".into(),
            owner: author(),
        };
        let r = reply(&row, Some("4f1d2c9e-8d5b-4f5e-9d7a-2b1c3d4e5f60"));
        assert!(r.is_best);
        assert!(!r.body.contains("javascript"));
        assert!(!reply(&row, None).is_best);
    }

    #[test]
    fn legacy_sqlite_timestamps_parse() {
        let ts = parse_timestamp("2024-05-01 10:00:00", "test");
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn unknown_activity_subject_is_dropped() {
        let row = ActivityRow {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            subject_id: Uuid::new_v4().to_string(),
            subject_type: "channel".into(),
            kind: "created_channel".into(),
            created_at: "2024-05-01T10:00:00.000000Z".into(),
        };
        assert!(activity(&row).is_none());
    }
}
