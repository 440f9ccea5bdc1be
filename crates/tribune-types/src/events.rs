use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain events published on the in-process dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ForumEvent {
    /// A reply was persisted under a thread
    ThreadHasNewReply { thread: ThreadRef, reply: ReplyRef },
}

impl ForumEvent {
    pub fn thread_id(&self) -> Uuid {
        match self {
            Self::ThreadHasNewReply { thread, .. } => thread.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRef {
    pub id: Uuid,
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRef {
    pub id: Uuid,
    pub user_id: Uuid,
    pub owner_name: String,
}

/// Payload stored for a subscriber when a thread they follow gets a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadWasUpdated {
    pub thread_id: Uuid,
    pub reply_id: Uuid,
    pub message: String,
    pub link: String,
}

impl ThreadWasUpdated {
    pub const KIND: &'static str = "thread_was_updated";

    pub fn new(thread: &ThreadRef, reply: &ReplyRef) -> Self {
        Self {
            thread_id: thread.id,
            reply_id: reply.id,
            message: format!("{} replied to {}", reply.owner_name, thread.title),
            link: format!("{}#reply-{}", thread.path, reply.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_was_updated_links_to_reply() {
        let thread = ThreadRef {
            id: Uuid::new_v4(),
            title: "Borrow checker woes".into(),
            path: "/threads/general/borrow-checker-woes".into(),
        };
        let reply = ReplyRef {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            owner_name: "joana".into(),
        };

        let n = ThreadWasUpdated::new(&thread, &reply);
        assert_eq!(n.message, "joana replied to Borrow checker woes");
        assert_eq!(n.link, format!("/threads/general/borrow-checker-woes#reply-{}", reply.id));
    }

    #[test]
    fn event_serializes_tagged() {
        let event = ForumEvent::ThreadHasNewReply {
            thread: ThreadRef { id: Uuid::nil(), title: "t".into(), path: "/threads/a/t".into() },
            reply: ReplyRef { id: Uuid::nil(), user_id: Uuid::nil(), owner_name: "n".into() },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ThreadHasNewReply");
        assert_eq!(json["data"]["thread"]["path"], "/threads/a/t");
        assert_eq!(event.thread_id(), Uuid::nil());
    }
}
