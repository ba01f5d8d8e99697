//! Reply delivery (§4.5), shared by the Send Worker's inline stage and the
//! Retry-Reply Worker. The persisted response is authoritative — this never
//! resynthesizes a request against the target.

use reqwest::Client;
use sqlx::PgPool;
use uuid::Uuid;

use crate::outbound;
use crate::store;
use crate::store::ActivityState;
use crate::store::Response;

#[tracing::instrument(
    name = "Deliver reply",
    skip(pool, client, response, allowed_response_codes),
    fields(%activity_id)
)]
pub async fn deliver(
    pool: &PgPool,
    client: &Client,
    activity_id: Uuid,
    response: &Response,
    reply_url: &str,
    reply_method: &str,
    allowed_response_codes: &std::collections::HashSet<u16>,
) -> Result<(), anyhow::Error> {
    match outbound::call_reply(client, activity_id, response, reply_url, reply_method).await {
        Ok(reply) if allowed_response_codes.contains(&reply.status().as_u16()) => {
            store::update_activity_state(pool, activity_id, ActivityState::Completed, None)
                .await?;
        }
        Ok(reply) => {
            let status = reply.status();
            let body = reply.text().await.unwrap_or_default();
            tracing::warn!(%activity_id, %status, %body, "reply call returned a disallowed status");
            store::update_activity_state(pool, activity_id, ActivityState::ReplyFailed, None)
                .await?;
        }
        Err(e) => {
            tracing::warn!(%activity_id, error = %e, "reply call failed (transport)");
            store::update_activity_state(pool, activity_id, ActivityState::ReplyFailed, None)
                .await?;
        }
    }
    Ok(())
}
