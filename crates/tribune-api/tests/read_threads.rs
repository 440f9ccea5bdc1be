mod common;

use axum::http::StatusCode;
use common::{GENERAL, OFF_TOPIC, TestApp, titles};

#[tokio::test]
async fn a_user_can_browse_threads() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    let thread = app.create_thread(&token, GENERAL, "Lifetimes explained", "Some words").await;
    app.reply(&token, &thread, "first").await;
    app.reply(&token, &thread, "second").await;

    let (status, list) = app.get("/threads", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["Lifetimes explained"]);
    assert_eq!(list[0]["replies_count"], 2);
    assert_eq!(list[0]["path"], "/threads/general/lifetimes-explained");
}

#[tokio::test]
async fn threads_are_listed_newest_first() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    app.create_thread(&token, GENERAL, "Older", "body").await;
    app.create_thread(&token, OFF_TOPIC, "Newer", "body").await;

    let (_, list) = app.get("/threads", None).await;
    assert_eq!(titles(&list), vec!["Newer", "Older"]);
}

#[tokio::test]
async fn a_user_can_read_a_single_thread() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    let other = app.register("pedro").await;
    let thread = app.create_thread(&token, GENERAL, "Async traits", "Are they stable yet?").await;
    app.reply(&other, &thread, "Since 1.75").await;
    app.reply(&token, &thread, "Thanks!").await;

    let (status, shown) = app.get(thread["path"].as_str().unwrap(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["title"], "Async traits");
    assert_eq!(shown["body"], "Are they stable yet?");
    assert_eq!(shown["creator"]["name"], "joana");

    let replies = shown["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["body"], "Since 1.75");
    assert_eq!(replies[0]["owner"]["name"], "pedro");
    assert_eq!(replies[1]["body"], "Thanks!");
}

#[tokio::test]
async fn a_user_can_filter_threads_by_channel() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    app.create_thread(&token, GENERAL, "In general", "body").await;
    app.create_thread(&token, OFF_TOPIC, "Off topic", "body").await;

    let (status, list) = app.get("/threads/general", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["In general"]);

    let (_, list) = app.get("/threads/off-topic", None).await;
    assert_eq!(titles(&list), vec!["Off topic"]);

    let (status, _) = app.get("/threads/no-such-channel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_thread_is_only_found_under_its_own_channel() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    app.create_thread(&token, GENERAL, "Where am I", "body").await;

    let (status, _) = app.get("/threads/general/where-am-i", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/threads/off-topic/where-am-i", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bodies_are_sanitized_when_read() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    let thread = app
        .create_thread(&token, GENERAL, "Markup", "<b>bold</b><script>alert(1)</script>")
        .await;
    app.reply(&token, &thread, "<img src=x onerror=alert(1)>hi").await;

    let (_, shown) = app.get(thread["path"].as_str().unwrap(), None).await;
    assert_eq!(shown["body"], "<b>bold</b>");
    let reply = shown["replies"][0]["body"].as_str().unwrap();
    assert!(!reply.contains("onerror"));
    assert!(reply.contains("hi"));
}

#[tokio::test]
async fn anonymous_viewers_get_no_personal_flags() {
    let app = TestApp::new();
    let token = app.register("joana").await;
    let thread = app.create_thread(&token, GENERAL, "Flags", "body").await;

    let (_, shown) = app.get(thread["path"].as_str().unwrap(), None).await;
    assert_eq!(shown["is_subscribed_to"], false);
    assert!(shown["has_updates"].is_null());
}

#[tokio::test]
async fn a_thread_has_updates_until_visited_and_again_after_a_reply() {
    let app = TestApp::new();
    let reader = app.register("joana").await;
    let writer = app.register("pedro").await;
    let thread = app.create_thread(&writer, GENERAL, "Fresh news", "body").await;
    let path = thread["path"].as_str().unwrap();

    let (_, list) = app.get("/threads", Some(&reader)).await;
    assert_eq!(list[0]["has_updates"], true);

    // The first visit still reports what was new before it
    let (_, shown) = app.get(path, Some(&reader)).await;
    assert_eq!(shown["has_updates"], true);

    let (_, list) = app.get("/threads", Some(&reader)).await;
    assert_eq!(list[0]["has_updates"], false);

    app.reply(&writer, &thread, "more news").await;
    let (_, list) = app.get("/threads", Some(&reader)).await;
    assert_eq!(list[0]["has_updates"], true);
}

#[tokio::test]
async fn health_check_responds() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
