use crate::helpers::spawn_app;

#[tokio::test]
async fn status_returns_404_for_unknown_activity() {
    let app = spawn_app().await;

    let response = app.status(uuid::Uuid::new_v4()).await;

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["reference"].is_string());
}

#[tokio::test]
async fn status_reports_created_immediately_after_submit() {
    let app = spawn_app().await;

    let response = app
        .submit("http://127.0.0.1:1/t", "http://127.0.0.1:1/r", "POST", "body")
        .await;
    let id: uuid::Uuid = response
        .headers()
        .get("X-Activity")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let status_response = app.status(id).await;
    assert_eq!(status_response.status().as_u16(), 200);
    let body: serde_json::Value = status_response.json().await.unwrap();
    assert_eq!(body["id"], id.to_string());
    // the unroutable target means the activity may already have cycled
    // through SENT_FAILED by the time this assertion runs; any state other
    // than terminal success/failure-without-a-response is fine here, this
    // test only checks the status endpoint reports *something* sane early on.
    assert_ne!(body["state"], serde_json::Value::Null);
}
