use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

#[tokio::test]
async fn happy_path_reaches_completed_and_delivers_the_reply() {
    let app = spawn_app().await;
    let target = MockServer::start().await;
    let reply = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/target"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&target)
        .await;
    Mock::given(method("POST"))
        .and(path("/reply"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&reply)
        .await;

    let response = app
        .submit(
            &format!("{}/target", target.uri()),
            &format!("{}/reply", reply.uri()),
            "POST",
            r#"{"n":1}"#,
        )
        .await;
    let id: uuid::Uuid = response
        .headers()
        .get("X-Activity")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = app.wait_for_state(id, &["COMPLETED"], 200).await;
    assert_eq!(body["state"], "COMPLETED");
}

#[tokio::test]
async fn transient_target_failure_is_requeued_and_eventually_succeeds() {
    let app = spawn_app().await;
    let target = MockServer::start().await;
    let reply = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/target"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&target)
        .await;
    Mock::given(method("POST"))
        .and(path("/target"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&target)
        .await;
    Mock::given(method("POST"))
        .and(path("/reply"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&reply)
        .await;

    let response = app
        .submit(
            &format!("{}/target", target.uri()),
            &format!("{}/reply", reply.uri()),
            "POST",
            "body",
        )
        .await;
    let id: uuid::Uuid = response
        .headers()
        .get("X-Activity")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    // first tick: target returns 503 -> SENT_FAILED; requeue worker then
    // moves it back to SCHEDULED and the next send tick succeeds.
    let body = app.wait_for_state(id, &["COMPLETED"], 200).await;
    assert_eq!(body["state"], "COMPLETED");
}
