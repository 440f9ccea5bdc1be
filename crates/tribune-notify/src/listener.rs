use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use tribune_db::Database;
use tribune_types::events::{ForumEvent, ReplyRef, ThreadRef, ThreadWasUpdated};

use crate::notifier::Notifier;

/// Notifies every subscriber of the thread except the reply's author.
///
/// A failed delivery is logged and skipped; it never undoes the reply.
/// Returns how many subscribers were notified.
pub fn notify_subscribers(
    db: &Database,
    notifier: &dyn Notifier,
    thread: &ThreadRef,
    reply: &ReplyRef,
) -> Result<usize> {
    let author = reply.user_id.to_string();
    let notification = ThreadWasUpdated::new(thread, reply);

    let mut delivered = 0;
    for sub in db.get_subscriptions(&thread.id.to_string())? {
        if sub.user_id == author {
            continue;
        }
        match notifier.notify(&sub.user_id, &notification) {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Notifying {} about thread {} failed: {:#}", sub.user_id, thread.id, e),
        }
    }

    debug!("Thread {}: notified {} subscribers", thread.id, delivered);
    Ok(delivered)
}

pub fn handle_event(db: &Database, notifier: &dyn Notifier, event: &ForumEvent) -> Result<()> {
    match event {
        ForumEvent::ThreadHasNewReply { thread, reply } => {
            notify_subscribers(db, notifier, thread, reply)?;
        }
    }
    Ok(())
}

/// Consumes dispatcher events until the channel closes. Each event is handled
/// off the async runtime. Events missed by a lagging receiver are lost.
pub async fn run_listener(
    mut rx: broadcast::Receiver<ForumEvent>,
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
) {
    info!("Notification listener started");

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Notification listener lagged, {} events dropped", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let db = db.clone();
        let notifier = notifier.clone();
        let handled = tokio::task::spawn_blocking(move || handle_event(&db, notifier.as_ref(), &event)).await;

        match handled {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Event handling failed: {:#}", e),
            Err(e) => error!("spawn_blocking join error: {}", e),
        }
    }

    info!("Notification listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use uuid::Uuid;

    use crate::dispatcher::Dispatcher;
    use crate::notifier::DatabaseNotifier;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, user_id: &str, _notification: &ThreadWasUpdated) -> Result<()> {
            if self.fail_for.as_deref() == Some(user_id) {
                return Err(anyhow!("mailbox full"));
            }
            self.seen.lock().unwrap().push(user_id.to_string());
            Ok(())
        }
    }

    struct Fixture {
        db: Arc<Database>,
        thread: ThreadRef,
        author: String,
        subscribers: Vec<String>,
    }

    /// A thread with the author and two other users subscribed.
    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut ids = vec![];
        for name in ["author", "sub1", "sub2"] {
            let id = Uuid::new_v4();
            db.create_user(&id.to_string(), name, &format!("{}@example.com", name), "hash").unwrap();
            ids.push(id.to_string());
        }

        let thread_id = Uuid::new_v4();
        let slug = db
            .create_thread(&thread_id.to_string(), "00000000-0000-0000-0000-000000000001", &ids[0], "Hi", "body")
            .unwrap();
        for (i, user_id) in ids.iter().enumerate() {
            db.subscribe(&format!("s{}", i), &thread_id.to_string(), user_id).unwrap();
        }

        Fixture {
            db,
            thread: ThreadRef {
                id: thread_id,
                title: "Hi".into(),
                path: format!("/threads/general/{}", slug),
            },
            author: ids[0].clone(),
            subscribers: ids[1..].to_vec(),
        }
    }

    fn reply_by(user_id: &str) -> ReplyRef {
        ReplyRef {
            id: Uuid::new_v4(),
            user_id: user_id.parse().unwrap(),
            owner_name: "someone".into(),
        }
    }

    #[test]
    fn reply_author_is_never_notified() {
        let f = fixture();
        let notifier = RecordingNotifier::default();

        let n = notify_subscribers(&f.db, &notifier, &f.thread, &reply_by(&f.author)).unwrap();

        assert_eq!(n, 2);
        let mut seen = notifier.seen.lock().unwrap().clone();
        seen.sort();
        let mut expected = f.subscribers.clone();
        expected.sort();
        assert_eq!(seen, expected);
        assert!(!seen.contains(&f.author));
    }

    #[test]
    fn subscribed_replier_is_skipped_but_thread_author_is_notified() {
        let f = fixture();
        let notifier = RecordingNotifier::default();

        notify_subscribers(&f.db, &notifier, &f.thread, &reply_by(&f.subscribers[0])).unwrap();

        let seen = notifier.seen.lock().unwrap();
        assert!(seen.contains(&f.author));
        assert!(seen.contains(&f.subscribers[1]));
        assert!(!seen.contains(&f.subscribers[0]));
    }

    #[test]
    fn one_failed_delivery_does_not_stop_the_rest() {
        let f = fixture();
        let notifier = RecordingNotifier {
            fail_for: Some(f.subscribers[0].clone()),
            ..Default::default()
        };

        let n = notify_subscribers(&f.db, &notifier, &f.thread, &reply_by(&f.author)).unwrap();

        assert_eq!(n, 1);
        assert_eq!(*notifier.seen.lock().unwrap(), vec![f.subscribers[1].clone()]);
    }

    #[tokio::test]
    async fn dispatched_reply_ends_up_in_subscriber_notifications() {
        let f = fixture();
        let dispatcher = Dispatcher::new();
        let notifier: Arc<dyn Notifier> = Arc::new(DatabaseNotifier::new(f.db.clone()));
        let listener = tokio::spawn(run_listener(dispatcher.subscribe(), f.db.clone(), notifier));

        let reply = reply_by(&f.author);
        dispatcher.broadcast(ForumEvent::ThreadHasNewReply { thread: f.thread.clone(), reply: reply.clone() });
        drop(dispatcher);
        listener.await.unwrap();

        for user_id in &f.subscribers {
            let rows = f.db.unread_notifications(user_id).unwrap();
            assert_eq!(rows.len(), 1);
            let data: ThreadWasUpdated = serde_json::from_str(&rows[0].data).unwrap();
            assert_eq!(data.reply_id, reply.id);
            assert_eq!(data.link, format!("{}#reply-{}", f.thread.path, reply.id));
        }
        assert!(f.db.unread_notifications(&f.author).unwrap().is_empty());
    }
}
