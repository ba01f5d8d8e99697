//! Cleanup Worker (§4.8): removes `COMPLETED` activities (and their
//! responses) older than the retention window. Response is deleted before
//! Activity to respect the foreign key; a crash between the two leaves an
//! orphaned, still-expired `COMPLETED` activity that the next tick removes.
//! No activity outside `COMPLETED` is ever eligible.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::store;

async fn tick(
    pool: &PgPool,
    retention: chrono::Duration,
) -> Result<(), anyhow::Error> {
    let expired = store::select_completed_expired_join(pool, Utc::now(), retention).await?;
    for (activity, response) in expired {
        store::delete_response(pool, response.id).await?;
        store::delete_activity(pool, activity.id).await?;
        tracing::info!(activity_id = %activity.id, "cleaned up expired activity");
    }
    Ok(())
}

pub async fn run(
    pool: PgPool,
    settings: Settings,
) -> Result<(), anyhow::Error> {
    let retention = chrono::Duration::seconds(
        i64::try_from(settings.application.retention_period_seconds).unwrap_or(i64::MAX),
    );
    let period = Duration::from_millis(settings.application.cleanup_tick_ms);

    loop {
        if let Err(e) = tick(&pool, retention).await {
            tracing::error!(error.cause_chain = ?e, error.message = %e, reference = %Uuid::new_v4(), "cleanup worker tick failed");
        }
        tokio::time::sleep(period).await;
    }
}
