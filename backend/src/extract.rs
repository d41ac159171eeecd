//! Extractors that run `validator` rules before a handler sees the input.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Json, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use room_core::ValidationFailure;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::error_body;

/// JSON body extractor that rejects invalid payloads with 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| e.into_response())?;
        data.validate().map_err(validation_response)?;
        Ok(Self(data))
    }
}

/// Query string extractor that rejects invalid parameters with 400.
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                error_body(
                    StatusCode::BAD_REQUEST,
                    "bad_request",
                    &e.body_text(),
                    &[],
                )
            })?;
        data.validate().map_err(validation_response)?;
        Ok(Self(data))
    }
}

fn validation_response(errors: ValidationErrors) -> Response {
    let mut failures = Vec::new();
    flatten(&errors, "", &mut failures);
    error_body(
        StatusCode::BAD_REQUEST,
        "bad_request",
        "Request validation failed",
        &failures,
    )
}

/// Flattens nested validator output into camelCase `path.to.field` failures.
/// Struct-level errors (`__all__`) are reported on the enclosing path.
fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut Vec<ValidationFailure>) {
    for (field, kind) in errors.errors() {
        let path = match (prefix.is_empty(), &**field) {
            (_, "__all__") => prefix.to_string(),
            (true, field) => camel_case(field),
            (false, field) => format!("{prefix}.{}", camel_case(field)),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({}).", err.code));
                    out.push(ValidationFailure::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
