use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

/// The six-state activity lifecycle. See the state machine diagram in the
/// module docs of `crate::store` for the legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "activity_state", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityState {
    Created,
    Scheduled,
    Sent,
    SentFailed,
    ReplyFailed,
    Completed,
}

impl sqlx::postgres::PgHasArrayType for ActivityState {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_activity_state")
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub url: String,
    pub method: String,
    pub reply_url: String,
    pub reply_method: String,
    pub state: ActivityState,
    pub node_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub leased_at: Option<DateTime<Utc>>,
    pub headers: Vec<u8>,
    pub payload: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Response {
    pub id: Uuid,
    pub response_id: Uuid,
    pub status_code: i32,
    pub headers: Vec<u8>,
    pub payload: Vec<u8>,
    pub content_type: String,
}

/// The minimal projection returned by the status endpoint and by
/// `get_activity_status`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivityStatus {
    pub id: Uuid,
    pub state: ActivityState,
}
