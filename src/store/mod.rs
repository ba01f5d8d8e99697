//! Typed CRUD over the `activities` / `responses` tables, and the
//! transactional helpers the worker set relies on to cross crashes safely.
//!
//! State machine:
//!
//! ```text
//!              submit
//!               ────►  CREATED
//!                         │  (Send Worker leases)
//!                         ▼
//!                     SCHEDULED ◄──────────────┐
//!                         │                    │ requeue (Requeue Worker)
//!            target OK    │    target fails    │
//!                ┌────────┴────────┐           │
//!                ▼                 ▼           │
//!              SENT           SENT_FAILED ─────┘
//!                │
//!      reply OK  │  reply fails
//!        ┌───────┴───────┐
//!        ▼               ▼
//!    COMPLETED      REPLY_FAILED ──(Retry-Reply Worker)──► COMPLETED | REPLY_FAILED
//! ```

mod models;

pub use models::Activity;
pub use models::ActivityState;
pub use models::ActivityStatus;
pub use models::Response;

use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("activity {0} already exists")]
    Conflict(Uuid),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] sqlx::Error),
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Insert a brand new activity. Fails with `Conflict` on an id collision.
#[tracing::instrument(name = "Insert activity", skip(pool, activity))]
pub async fn insert_activity(
    pool: &PgPool,
    activity: &Activity,
) -> Result<(), StoreError> {
    let result = sqlx::query!(
        r#"
        INSERT INTO activities
            (id, url, method, reply_url, reply_method, state, node_id, created_at, headers, payload, content_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
        activity.id,
        activity.url,
        activity.method,
        activity.reply_url,
        activity.reply_method,
        activity.state as ActivityState,
        activity.node_id,
        activity.created_at,
        activity.headers,
        activity.payload,
        activity.content_type,
    )
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(activity.id)),
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(name = "Get activity status", skip(pool))]
pub async fn get_activity_status(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ActivityStatus>, StoreError> {
    let row = sqlx::query!(
        r#"SELECT id, state AS "state: ActivityState" FROM activities WHERE id = $1"#,
        id
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ActivityStatus {
        id: r.id,
        state: r.state,
    }))
}

/// Idempotent write of `state` (and, if given, `node_id`).
#[tracing::instrument(name = "Update activity state", skip(pool))]
pub async fn update_activity_state(
    pool: &PgPool,
    id: Uuid,
    new_state: ActivityState,
    node_id: Option<&str>,
) -> Result<(), StoreError> {
    sqlx::query!(
        r#"UPDATE activities SET state = $1, node_id = COALESCE($2, node_id) WHERE id = $3"#,
        new_state as ActivityState,
        node_id,
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[tracing::instrument(name = "Insert response", skip(pool, response))]
pub async fn insert_response(
    pool: &PgPool,
    response: &Response,
) -> Result<(), StoreError> {
    sqlx::query!(
        r#"
        INSERT INTO responses (id, response_id, status_code, headers, payload, content_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        response.id,
        response.response_id,
        response.status_code,
        response.headers,
        response.payload,
        response.content_type,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[tracing::instrument(name = "List responses for activity", skip(pool))]
pub async fn list_responses_for(
    pool: &PgPool,
    activity_id: Uuid,
) -> Result<Vec<Response>, StoreError> {
    let responses = sqlx::query_as!(
        Response,
        r#"
        SELECT id, response_id, status_code, headers, payload, content_type
        FROM responses
        WHERE response_id = $1
        "#,
        activity_id
    )
    .fetch_all(pool)
    .await?;
    Ok(responses)
}

#[tracing::instrument(name = "Delete response", skip(pool))]
pub async fn delete_response(
    pool: &PgPool,
    id: Uuid,
) -> Result<(), StoreError> {
    sqlx::query!("DELETE FROM responses WHERE id = $1", id)
        .execute(pool)
        .await?;
    Ok(())
}

#[tracing::instrument(name = "Delete activity", skip(pool))]
pub async fn delete_activity(
    pool: &PgPool,
    id: Uuid,
) -> Result<(), StoreError> {
    sqlx::query!("DELETE FROM activities WHERE id = $1", id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns activities in any of `states`, earliest-`created_at`-first. Used
/// by every poller that isn't the Send Worker (which leases instead, see
/// [`lease_next_sendable`]).
#[tracing::instrument(name = "Select earliest by states", skip(pool))]
pub async fn select_earliest_by_states(
    pool: &PgPool,
    states: &[ActivityState],
    limit: i64,
) -> Result<Vec<Activity>, StoreError> {
    let activities = sqlx::query_as!(
        Activity,
        r#"
        SELECT
            id, url, method, reply_url, reply_method,
            state AS "state: ActivityState",
            node_id, created_at, leased_at, headers, payload, content_type
        FROM activities
        WHERE state = ANY($1)
        ORDER BY created_at ASC
        LIMIT $2
        "#,
        states as &[ActivityState],
        limit,
    )
    .fetch_all(pool)
    .await?;
    Ok(activities)
}

/// `(Activity, Response)` pairs eligible for cleanup: `state = COMPLETED`
/// and `now - created_at > retention`.
#[tracing::instrument(name = "Select completed+expired", skip(pool))]
pub async fn select_completed_expired_join(
    pool: &PgPool,
    now: DateTime<Utc>,
    retention: chrono::Duration,
) -> Result<Vec<(Activity, Response)>, StoreError> {
    let cutoff = now - retention;
    let rows = sqlx::query!(
        r#"
        SELECT
            a.id AS a_id, a.url, a.method, a.reply_url, a.reply_method,
            a.state AS "a_state: ActivityState",
            a.node_id, a.created_at, a.leased_at, a.headers AS a_headers,
            a.payload AS a_payload, a.content_type AS a_content_type,
            r.id AS r_id, r.response_id, r.status_code, r.headers AS r_headers,
            r.payload AS r_payload, r.content_type AS r_content_type
        FROM activities a
        JOIN responses r ON r.response_id = a.id
        WHERE a.state = 'completed' AND a.created_at < $1
        ORDER BY a.created_at ASC
        "#,
        cutoff,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let activity = Activity {
                id: row.a_id,
                url: row.url,
                method: row.method,
                reply_url: row.reply_url,
                reply_method: row.reply_method,
                state: row.a_state,
                node_id: row.node_id,
                created_at: row.created_at,
                leased_at: row.leased_at,
                headers: row.a_headers,
                payload: row.a_payload,
                content_type: row.a_content_type,
            };
            let response = Response {
                id: row.r_id,
                response_id: row.response_id,
                status_code: row.status_code,
                headers: row.r_headers,
                payload: row.r_payload,
                content_type: row.r_content_type,
            };
            (activity, response)
        })
        .collect())
}

/// Atomically claims the earliest `CREATED`/`SCHEDULED` activity for this
/// node: a single fenced `UPDATE ... RETURNING` so two Send Workers racing
/// on the same row serialize at the database rather than both winning (the
/// conditional-update strengthening flagged as optional in the design notes
/// is applied here unconditionally).
#[tracing::instrument(name = "Lease next sendable activity", skip(pool))]
pub async fn lease_next_sendable(
    pool: &PgPool,
    node_id: &str,
) -> Result<Option<Activity>, StoreError> {
    let activity = sqlx::query_as!(
        Activity,
        r#"
        UPDATE activities
        SET state = 'scheduled', node_id = $1, leased_at = now()
        WHERE id = (
            SELECT id FROM activities
            WHERE state IN ('created', 'scheduled')
            ORDER BY created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING
            id, url, method, reply_url, reply_method,
            state AS "state: ActivityState",
            node_id, created_at, leased_at, headers, payload, content_type
        "#,
        node_id,
    )
    .fetch_optional(pool)
    .await?;
    Ok(activity)
}

/// Bulk-rewrites every `SENT_FAILED` row to `SCHEDULED`. Idempotent: a
/// second call with nothing newly failed touches zero rows.
#[tracing::instrument(name = "Requeue sent-failed activities", skip(pool))]
pub async fn requeue_sent_failed(
    pool: &PgPool,
    node_id: &str,
) -> Result<u64, StoreError> {
    let result = sqlx::query!(
        r#"
        UPDATE activities
        SET state = 'scheduled', node_id = $1
        WHERE state = 'sent_failed'
        "#,
        node_id,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Transactionally persists the response from a successful target call and
/// transitions the activity to `SENT`. Checks for an already-persisted
/// response first so a retried tick after a crash between the two writes
/// cannot insert a second response for the same activity (invariant: a
/// response is never overwritten).
#[tracing::instrument(name = "Persist response and mark sent", skip(pool, response))]
pub async fn persist_response_and_mark_sent(
    pool: &PgPool,
    response: &Response,
    activity_id: Uuid,
) -> Result<(), StoreError> {
    let mut transaction = pool.begin().await?;

    let existing = sqlx::query!(
        "SELECT id FROM responses WHERE response_id = $1",
        activity_id
    )
    .fetch_optional(&mut *transaction)
    .await?;

    if existing.is_none() {
        sqlx::query!(
            r#"
            INSERT INTO responses (id, response_id, status_code, headers, payload, content_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            response.id,
            response.response_id,
            response.status_code,
            response.headers,
            response.payload,
            response.content_type,
        )
        .execute(&mut *transaction)
        .await?;
    }

    sqlx::query!(
        "UPDATE activities SET state = 'sent' WHERE id = $1",
        activity_id
    )
    .execute(&mut *transaction)
    .await?;

    transaction.commit().await?;
    Ok(())
}
