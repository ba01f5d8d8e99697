//! Posts a submission through `/submit` with the three routing headers, then
//! polls `/message?id=<uuid>` until the activity reaches a terminal state.
//! A thin manual-testing aid, not part of the core library.

use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let mut args = std::env::args().skip(1);
    let target_url = args
        .next()
        .unwrap_or_else(|| "http://127.0.0.1:9091/target".to_string());
    let reply_url = args
        .next()
        .unwrap_or_else(|| "http://127.0.0.1:9091/reply".to_string());
    let proxy_base =
        std::env::var("PROXY_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:9090".to_string());

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{proxy_base}/submit"))
        .header("X-Url", target_url)
        .header("X-Reply", reply_url)
        .header("X-ReplyMethod", "POST")
        .body(r#"{"n":1}"#)
        .send()
        .await?;

    let activity_id = response
        .headers()
        .get("X-Activity")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("no X-Activity header in submit response"))?
        .to_string();
    println!("submitted activity {activity_id}");

    for _ in 0..20 {
        let status: serde_json::Value = client
            .get(format!("{proxy_base}/message"))
            .query(&[("id", &activity_id)])
            .send()
            .await?
            .json()
            .await?;
        println!("status: {status}");
        if status["state"] == "COMPLETED" {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    anyhow::bail!("activity {activity_id} did not reach COMPLETED in time")
}
