//! Wire format + outbound calls shared by the Send Worker (target calls) and
//! reply delivery (target/reply calls, §4.4/§4.5). Headers are persisted as
//! a UTF-8 JSON object of string -> string, per the data model in §3.

use std::str::FromStr;

use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::Client;
use reqwest::Method;
use reqwest::Response as ReqwestResponse;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use crate::store::Activity;
use crate::store::Response;

/// Header added to every reply request so the receiver can correlate it
/// back to the originating activity.
pub const TASK_ID_HEADER: &str = "X-TaskId";

pub fn headers_to_json(headers: &HeaderMap) -> Vec<u8> {
    let mut map = Map::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    serde_json::to_vec(&Value::Object(map)).expect("a map of strings always serializes")
}

pub fn json_to_header_map(bytes: &[u8]) -> Result<HeaderMap, anyhow::Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    let object = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("headers JSON is not an object"))?;

    let mut headers = HeaderMap::new();
    for (name, value) in object {
        let value = value
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("header {name} is not a string"))?;
        headers.insert(HeaderName::from_str(name)?, HeaderValue::from_str(value)?);
    }
    Ok(headers)
}

/// Reconstitutes the outbound request from a leased activity and calls
/// `url`. A transport error (including timeout) is the caller's cue to mark
/// `SENT_FAILED`; see the Send Worker.
#[tracing::instrument(name = "Call target", skip(client, activity), fields(activity_id = %activity.id))]
pub async fn call_target(
    client: &Client,
    activity: &Activity,
) -> Result<ReqwestResponse, reqwest::Error> {
    let method = Method::from_bytes(activity.method.as_bytes()).unwrap_or(Method::POST);
    let headers = json_to_header_map(&activity.headers).unwrap_or_default();

    client
        .request(method, &activity.url)
        .headers(headers)
        .header(reqwest::header::CONTENT_TYPE, &activity.content_type)
        .body(activity.payload.clone())
        .send()
        .await
}

/// Reconstitutes the reply request from the persisted response and calls
/// `reply_url`. Adds `X-TaskId` so the reply receiver can correlate.
#[tracing::instrument(name = "Call reply", skip(client, response), fields(%activity_id))]
pub async fn call_reply(
    client: &Client,
    activity_id: Uuid,
    response: &Response,
    reply_url: &str,
    reply_method: &str,
) -> Result<ReqwestResponse, reqwest::Error> {
    let method = Method::from_bytes(reply_method.as_bytes()).unwrap_or(Method::POST);
    let headers = json_to_header_map(&response.headers).unwrap_or_default();

    client
        .request(method, reply_url)
        .headers(headers)
        .header(reqwest::header::CONTENT_TYPE, &response.content_type)
        .header(TASK_ID_HEADER, activity_id.to_string())
        .body(response.payload.clone())
        .send()
        .await
}
