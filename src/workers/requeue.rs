//! Requeue Worker (§4.6): bulk-moves `SENT_FAILED` activities back to
//! `SCHEDULED` so the Send Worker picks them up again. Kept separate from
//! the Send Worker so its high-frequency tick isn't spent scanning the
//! failure tail.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::store;

async fn tick(
    pool: &PgPool,
    node_id: &str,
) -> Result<(), anyhow::Error> {
    let requeued = store::requeue_sent_failed(pool, node_id).await?;
    if requeued > 0 {
        tracing::info!(requeued, "requeued sent-failed activities");
    }
    Ok(())
}

pub async fn run(
    pool: PgPool,
    settings: Settings,
) -> Result<(), anyhow::Error> {
    let node_id = settings.application.node_id.clone();
    let period = Duration::from_millis(settings.application.requeue_tick_ms);

    loop {
        if let Err(e) = tick(&pool, &node_id).await {
            tracing::error!(error.cause_chain = ?e, error.message = %e, reference = %Uuid::new_v4(), "requeue worker tick failed");
        }
        tokio::time::sleep(period).await;
    }
}
