//! Error types for collaborator calls and the HTTP surface.
//!
//! Collaborator errors are logged at the call site and converted into a benign default;
//! only `ApiError` ever reaches a client.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure talking to an external service (identity, persistence, language model).
#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("{service} is not configured")]
  NotConfigured { service: &'static str },

  #[error("{service} request failed: {message}")]
  Http { service: &'static str, message: String },

  #[error("{service} returned HTTP {status}: {message}")]
  Status { service: &'static str, status: u16, message: String },

  #[error("{service} response could not be decoded: {message}")]
  Decode { service: &'static str, message: String },

  #[error("token rejected by identity provider")]
  Unauthorized,
}

impl ServiceError {
  pub fn http(service: &'static str, e: reqwest::Error) -> Self {
    Self::Http { service, message: e.to_string() }
  }

  pub fn decode(service: &'static str, e: impl std::fmt::Display) -> Self {
    Self::Decode { service, message: e.to_string() }
  }

  /// Build a `Status` error from a non-success response, keeping a short body excerpt.
  pub async fn from_response(service: &'static str, res: reqwest::Response) -> Self {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    Self::Status { service, status, message: crate::util::trunc_for_log(&body, 200) }
  }
}

/// Errors returned to HTTP clients as `{ "error": "..." }`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  BadRequest(String),
  /// A collaborator needed to serve the request (e.g. identity) is unreachable.
  #[error("{0}")]
  Unavailable(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
