#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use tribune_api::auth::{AppState, AppStateInner};
use tribune_db::Database;
use tribune_notify::dispatcher::Dispatcher;
use tribune_notify::listener::run_listener;
use tribune_notify::notifier::DatabaseNotifier;

pub const GENERAL: &str = "00000000-0000-0000-0000-000000000001";
pub const OFF_TOPIC: &str = "00000000-0000-0000-0000-000000000002";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// A fresh in-memory forum with the notification listener running.
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();
        let notifier = Arc::new(DatabaseNotifier::new(db.clone()));
        tokio::spawn(run_listener(dispatcher.subscribe(), db.clone(), notifier));

        let state = AppStateInner::new(db, "test-secret".into(), dispatcher);
        Self {
            router: tribune_api::router(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registers `name` and returns their bearer token.
    pub async fn register(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name),
                    "password": "correct-horse",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_thread(&self, token: &str, channel_id: &str, title: &str, body: &str) -> Value {
        let (status, thread) = self
            .post(
                "/threads",
                Some(token),
                json!({ "channel_id": channel_id, "title": title, "body": body }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", thread);
        thread
    }

    pub async fn reply(&self, token: &str, thread: &Value, body: &str) -> Value {
        let uri = format!("{}/replies", thread["path"].as_str().unwrap());
        let (status, reply) = self.post(&uri, Some(token), json!({ "body": body })).await;
        assert_eq!(status, StatusCode::CREATED, "{}", reply);
        reply
    }

    /// Polls a user's unread notifications until `count` arrive; delivery is asynchronous.
    pub async fn wait_for_notifications(&self, name: &str, token: &str, count: usize) -> Vec<Value> {
        let uri = format!("/profiles/{}/notifications", name);
        for _ in 0..100 {
            let (status, body) = self.get(&uri, Some(token)).await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            let list = body.as_array().unwrap().clone();
            if list.len() >= count {
                return list;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} notifications for {}", count, name);
    }
}

pub fn titles(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect()
}
