//! HTTP error mapping.
//!
//! Handlers return `Result<_, ApiError>`; actix turns the error into a JSON
//! body of the form `{ "error": { "code": "...", "message": "..." } }`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::error::ImportError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Import(e) => e.kind(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Import(e) => match e {
                ImportError::UnsupportedFormat(_)
                | ImportError::Malformed(_)
                | ImportError::NothingSelected => StatusCode::BAD_REQUEST,
                ImportError::EmptyResult => StatusCode::UNPROCESSABLE_ENTITY,
                ImportError::Upstream(_) => StatusCode::BAD_GATEWAY,
                ImportError::InvalidPhase { .. } => StatusCode::CONFLICT,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn import_errors_map_to_statuses() {
        let cases = [
            (ImportError::UnsupportedFormat("pdf".into()), StatusCode::BAD_REQUEST),
            (ImportError::EmptyResult, StatusCode::UNPROCESSABLE_ENTITY),
            (ImportError::upstream(None), StatusCode::BAD_GATEWAY),
            (ImportError::NothingSelected, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn body_carries_code_and_message() {
        let response = ApiError::from(ImportError::UnsupportedFormat("pdf".into())).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "UNSUPPORTED_FORMAT");
        assert_eq!(
            json["error"]["message"],
            "Unsupported file type '.pdf'. Upload a CSV or spreadsheet file."
        );
    }
}
