use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

#[tokio::test]
async fn transient_reply_failure_is_retried_without_recalling_the_target() {
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
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&reply)
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

    let body = app.wait_for_state(id, &["COMPLETED"], 200).await;
    assert_eq!(body["state"], "COMPLETED");

    // the target mock's `expect(1)` above already asserts a single call on
    // drop; reaching COMPLETED here confirms the retry reused the
    // already-persisted response instead of resending to the target.
}
