//! Domain events and subscriber notifications.
//!
//! Handlers publish on the [`dispatcher::Dispatcher`]; the server runs
//! [`listener::run_listener`] as a background task that turns new-reply
//! events into notifications for the thread's subscribers.

pub mod dispatcher;
pub mod listener;
pub mod notifier;
