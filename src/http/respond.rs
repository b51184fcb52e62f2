//! Folds a pipeline outcome into the HTTP response.

use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use log::error;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

fn builder(status: StatusCode) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);
    builder.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"));
    builder
}

/// 200 with the value as JSON, or 500 with the failure message as text.
pub fn respond<T: Serialize>(outcome: PipelineResult<T>) -> HttpResponse {
    match outcome {
        Ok(value) => builder(StatusCode::OK).json(value),
        Err(err) => {
            error!("Request failed: {}", err);
            builder(StatusCode::INTERNAL_SERVER_ERROR)
                .content_type(ContentType::plaintext())
                .body(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct FailureWithPlaceholder<T> {
    error: String,
    data: T,
}

/// Like [`respond`], but a failure still carries an empty `data` value so
/// clients can render the same shape either way.
pub fn respond_with_placeholder<T: Serialize + Default>(outcome: PipelineResult<T>) -> HttpResponse {
    match outcome {
        Ok(value) => builder(StatusCode::OK).json(value),
        Err(err) => {
            error!("Request failed: {}", err);
            builder(StatusCode::INTERNAL_SERVER_ERROR).json(FailureWithPlaceholder {
                error: err.to_string(),
                data: T::default(),
            })
        }
    }
}

/// Runs a pipeline with a deadline; running out of time is an ordinary failure.
pub async fn with_deadline<T, F>(limit: Duration, pipeline: F) -> PipelineResult<T>
where
    F: Future<Output = PipelineResult<T>>,
{
    tokio::time::timeout(limit, pipeline)
        .await
        .unwrap_or(Err(PipelineError::Timeout(limit)))
}
