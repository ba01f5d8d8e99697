//! Retry-Reply Worker (§4.7): picks the earliest `REPLY_FAILED` activity,
//! loads its already-persisted response, and re-invokes reply delivery.
//! Never resynthesizes a request against the target.

use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::store;
use crate::store::ActivityState;
use crate::workers::reply;

async fn tick(
    pool: &PgPool,
    client: &Client,
    allowed_response_codes: &std::collections::HashSet<u16>,
) -> Result<(), anyhow::Error> {
    let mut candidates =
        store::select_earliest_by_states(pool, &[ActivityState::ReplyFailed], 1).await?;
    let Some(activity) = candidates.pop() else {
        return Ok(());
    };

    let mut responses = store::list_responses_for(pool, activity.id).await?;
    let Some(response) = responses.pop() else {
        anyhow::bail!("activity {} is REPLY_FAILED with no persisted response", activity.id);
    };

    reply::deliver(
        pool,
        client,
        activity.id,
        &response,
        &activity.reply_url,
        &activity.reply_method,
        allowed_response_codes,
    )
    .await
}

pub async fn run(
    pool: PgPool,
    client: Client,
    settings: Settings,
) -> Result<(), anyhow::Error> {
    let allowed_response_codes = settings.application.allowed_response_codes();
    let period = Duration::from_millis(settings.application.retry_reply_tick_ms);

    loop {
        if let Err(e) = tick(&pool, &client, &allowed_response_codes).await {
            tracing::error!(error.cause_chain = ?e, error.message = %e, reference = %Uuid::new_v4(), "retry-reply worker tick failed");
        }
        tokio::time::sleep(period).await;
    }
}
