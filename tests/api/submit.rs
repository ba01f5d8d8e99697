use crate::helpers::spawn_app;

#[tokio::test]
async fn submit_returns_202_and_an_activity_id() {
    let app = spawn_app().await;

    let response = app
        .submit("http://127.0.0.1:1/t", "http://127.0.0.1:1/r", "POST", r#"{"n":1}"#)
        .await;

    assert_eq!(response.status().as_u16(), 202);
    let activity_header = response.headers().get("X-Activity").unwrap();
    assert!(uuid::Uuid::parse_str(activity_header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn submit_persists_a_created_activity() {
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

    let saved = resilient_proxy::store::get_activity_status(&app.pool, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.id, id);
}

#[tokio::test]
async fn submit_missing_routing_header_returns_400_without_inserting() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(format!("{}/submit", app.addr))
        .header("X-Url", "http://127.0.0.1:1/t")
        .header("X-Reply", "http://127.0.0.1:1/r")
        // X-ReplyMethod deliberately omitted
        .body("body")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("X-ReplyMethod"));
    assert!(body["reference"].is_string());
}

#[tokio::test]
async fn submit_strips_routing_headers_but_keeps_others() {
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

    let activity = sqlx::query!("SELECT headers FROM activities WHERE id = $1", id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let headers: serde_json::Value = serde_json::from_slice(&activity.headers).unwrap();
    assert!(headers.get("x-url").is_none());
    assert!(headers.get("x-reply").is_none());
    assert!(headers.get("x-replymethod").is_none());
    assert_eq!(headers.get("x-custom").unwrap(), "keep-me");
}
