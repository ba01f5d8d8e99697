use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Serialize;
use uuid::Uuid;

/// Body returned for every non-2xx response from the submit/status endpoints.
#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub reference: Uuid,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reference: Uuid::new_v4(),
        }
    }
}

/// Taxonomy from the error handling design: validation failures are the
/// submitter's fault (400), everything else surfaced at a handler boundary
/// is ours (500). Workers never convert into this type; they log and
/// recover through the state machine instead (see `crate::workers`).
#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("missing routing headers: {0:?}")]
    Validation(Vec<&'static str>),
    #[error("activity {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(missing) => {
                ErrorBody::new(format!("missing required headers: {}", missing.join(", ")))
            }
            Self::NotFound(id) => ErrorBody::new(format!("no activity with id {id}")),
            Self::Store(_) | Self::Unexpected(_) => ErrorBody::new("internal error"),
        };
        tracing::error!(
            error.cause_chain = ?self,
            error.message = %self,
            reference = %body.reference,
            "request failed"
        );
        HttpResponse::build(self.status_code()).json(body)
    }
}
