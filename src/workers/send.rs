//! Send Worker (§4.4): leases one pending activity, calls the target,
//! persists the response on success, then inline-delivers the reply.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::outbound;
use crate::store;
use crate::store::ActivityState;
use crate::store::Response;
use crate::workers::reply;

#[tracing::instrument(name = "Send worker tick", skip_all, fields(activity_id = tracing::field::Empty))]
async fn tick(
    pool: &PgPool,
    client: &Client,
    node_id: &str,
    allowed_response_codes: &HashSet<u16>,
) -> Result<(), anyhow::Error> {
    let Some(activity) = store::lease_next_sendable(pool, node_id).await? else {
        return Ok(());
    };
    tracing::Span::current().record("activity_id", tracing::field::display(activity.id));

    match outbound::call_target(client, &activity).await {
        Ok(target_response) if allowed_response_codes.contains(&target_response.status().as_u16()) => {
            let status_code = target_response.status().as_u16();
            let headers = outbound::headers_to_json(target_response.headers());
            let content_type = target_response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/octet-stream")
                .to_string();
            let payload = target_response.bytes().await?.to_vec();

            let response = Response {
                id: Uuid::new_v4(),
                response_id: activity.id,
                status_code: i32::from(status_code),
                headers,
                payload,
                content_type,
            };
            store::persist_response_and_mark_sent(pool, &response, activity.id).await?;

            reply::deliver(
                pool,
                client,
                activity.id,
                &response,
                &activity.reply_url,
                &activity.reply_method,
                allowed_response_codes,
            )
            .await?;
        }
        Ok(target_response) => {
            let status = target_response.status();
            let body = target_response.text().await.unwrap_or_default();
            tracing::warn!(activity_id = %activity.id, %status, %body, "target call returned a disallowed status");
            store::update_activity_state(pool, activity.id, ActivityState::SentFailed, None)
                .await?;
        }
        Err(e) => {
            tracing::warn!(activity_id = %activity.id, error = %e, "target call failed (transport)");
            store::update_activity_state(pool, activity.id, ActivityState::SentFailed, None)
                .await?;
        }
    }
    Ok(())
}

/// To be run as a separate worker, outside the main API.
pub async fn run(
    pool: PgPool,
    client: Client,
    settings: Settings,
) -> Result<(), anyhow::Error> {
    let node_id = settings.application.node_id.clone();
    let allowed_response_codes = settings.application.allowed_response_codes();
    let period = Duration::from_millis(settings.application.send_tick_ms);

    loop {
        if let Err(e) = tick(&pool, &client, &node_id, &allowed_response_codes).await {
            tracing::error!(error.cause_chain = ?e, error.message = %e, reference = %Uuid::new_v4(), "send worker tick failed");
        }
        tokio::time::sleep(period).await;
    }
}
