use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ProxyError;
use crate::store;

#[derive(Deserialize, Debug)]
pub struct StatusQuery {
    id: Uuid,
}

/// `GET /message?id=<uuid>` — current lifecycle state of an activity.
#[tracing::instrument(name = "Get activity status", skip(pool))]
pub async fn status(
    query: web::Query<StatusQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ProxyError> {
    let status = store::get_activity_status(&pool, query.id)
        .await?
        .ok_or(ProxyError::NotFound(query.id))?;

    Ok(HttpResponse::Ok().json(status))
}
