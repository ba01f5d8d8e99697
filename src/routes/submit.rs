use actix_web::http::header::HeaderMap;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::Map;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::errors::ProxyError;
use crate::store;
use crate::store::Activity;
use crate::store::ActivityState;

const HEADER_URL: &str = "X-Url";
const HEADER_REPLY: &str = "X-Reply";
const HEADER_REPLY_METHOD: &str = "X-ReplyMethod";

/// `* /submit` — durably persists the request and returns immediately.
/// The incoming method is forwarded verbatim to the target later; this
/// handler accepts any method.
#[tracing::instrument(name = "Submit activity", skip(req, body, pool, settings))]
pub async fn submit(
    req: HttpRequest,
    body: web::Bytes,
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, ProxyError> {
    let mut missing = Vec::new();
    let url = header_value(&req, HEADER_URL, &mut missing);
    let reply_url = header_value(&req, HEADER_REPLY, &mut missing);
    let reply_method = header_value(&req, HEADER_REPLY_METHOD, &mut missing);

    if !missing.is_empty() {
        return Err(ProxyError::Validation(missing));
    }
    let (url, reply_url, reply_method) = (url.unwrap(), reply_url.unwrap(), reply_method.unwrap());

    let mut headers = req.headers().clone();
    headers.remove(HEADER_URL);
    headers.remove(HEADER_REPLY);
    headers.remove(HEADER_REPLY_METHOD);

    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let id = Uuid::new_v4();
    let activity = Activity {
        id,
        url,
        method: req.method().as_str().to_string(),
        reply_url,
        reply_method,
        state: ActivityState::Created,
        node_id: Some(settings.application.node_id.clone()),
        created_at: Utc::now(),
        leased_at: None,
        headers: headers_to_json(&headers),
        payload: body.to_vec(),
        content_type,
    };

    store::insert_activity(&pool, &activity).await?;

    tracing::info!(activity_id = %id, "accepted activity");
    Ok(HttpResponse::Accepted()
        .insert_header(("X-Activity", id.to_string()))
        .finish())
}

/// Persists request headers as a UTF-8 JSON object of string -> string, per
/// the data model in the store module docs. `actix_web`'s `HeaderMap` is a
/// distinct type from the `reqwest::header::HeaderMap` used for outbound
/// calls, so it gets its own serializer here rather than sharing
/// `crate::outbound::headers_to_json`.
fn headers_to_json(headers: &HeaderMap) -> Vec<u8> {
    let mut map = Map::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    serde_json::to_vec(&Value::Object(map)).expect("a map of strings always serializes")
}

fn header_value(
    req: &HttpRequest,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match req.headers().get(name).and_then(|v| v.to_str().ok()) {
        Some(value) => Some(value.to_string()),
        None => {
            missing.push(name);
            None
        }
    }
}
