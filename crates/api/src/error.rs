use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clientbench_core::service::ServiceError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// One offending input field in a 422 payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ServiceError::Invalid(detail) => ApiError::Validation(vec![FieldError {
                field: "body".to_string(),
                message: detail,
            }]),
            ServiceError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = Vec::new();
        for (field, errs) in errors.field_errors() {
            // Struct-level checks are keyed `__all__`.
            let field = match field.to_string() {
                f if f == "__all__" => "body".to_string(),
                f => wire_name(&f),
            };
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed `{}` check", err.code));
                details.push(FieldError {
                    field: field.clone(),
                    message,
                });
            }
        }
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                ApiError::Validation(vec![FieldError {
                    field: offending_field(&text).unwrap_or_else(|| "body".to_string()),
                    message: text,
                }])
            }
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType(text),
            _ => ApiError::BadRequest(text),
        }
    }
}

/// Field names are reported the way clients send them (camelCase).
fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Best-effort field name from a JSON decoder message.
fn offending_field(text: &str) -> Option<String> {
    if let Some(rest) = text.split("missing field `").nth(1) {
        return rest.split('`').next().map(str::to_string);
    }
    // Path-prefixed errors look like "...target type: peRatio: invalid type: ...".
    let (_, detail) = text.rsplit_once("target type: ")?;
    let (path, _) = detail.split_once(": ")?;
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }
    Some(path.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                tracing::debug!(%message, "not found");
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Validation(details) => {
                tracing::warn!(?details, "request rejected by validation");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": "validation failed", "details": details })),
                )
                    .into_response()
            }
            ApiError::UnsupportedMediaType(message) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_missing_field_name() {
        let text = "Failed to deserialize the JSON body into the target type: missing field `revenue` at line 1 column 512";
        assert_eq!(offending_field(text).as_deref(), Some("revenue"));
    }

    #[test]
    fn finds_path_prefixed_field_name() {
        let text = "Failed to deserialize the JSON body into the target type: peRatio: invalid type: string \"29.2\", expected f64 at line 1 column 40";
        assert_eq!(offending_field(text).as_deref(), Some("peRatio"));
    }

    #[test]
    fn falls_back_when_no_field_is_named() {
        assert_eq!(
            offending_field("Failed to parse the request body as JSON: EOF while parsing"),
            None
        );
        assert_eq!(
            offending_field(
                "Failed to deserialize the JSON body into the target type: invalid type: integer `1`, expected struct FinancialMetrics at line 1 column 1"
            ),
            None
        );
    }

    #[test]
    fn validator_field_names_use_wire_form() {
        assert_eq!(wire_name("market_cap"), "marketCap");
        assert_eq!(wire_name("quarter"), "quarter");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: ApiError = ServiceError::NotFound {
            ticker: "ZZZ".to_string(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
