use std::sync::atomic::Ordering;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn healthy_database_answers_ok_without_caching() {
    let app = TestApp::spawn().await;

    let res = app.get_anonymous(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.text, "OK");
    assert_eq!(
        res.header("cache-control"),
        Some("no-cache, no-store, must-revalidate")
    );
}

#[tokio::test]
async fn unreachable_database_reports_unavailable() {
    let app = TestApp::spawn().await;
    app.metadata.down.store(true, Ordering::SeqCst);

    let res = app.get_anonymous(routes::HEALTH).await;

    assert_eq!(res.status, 503);
}

#[tokio::test]
async fn query_string_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get_anonymous(&format!("{}?verbose=1", routes::HEALTH)).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
