//! `ValidatedJson<T>`: `axum::Json<T>` followed by `Validate::validate()`.
//!
//! Malformed bodies are rejected with 400, bodies that parse but fail
//! validation with 422. Both use the `ApiResponse` envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateModule {
///     #[validate(length(min = 1, max = 255))]
///     title: String,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<CreateModule>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    Malformed(JsonRejection),
    Invalid(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Malformed(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON: {}", rejection.body_text()),
            ),
            Self::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// One `field: message` entry per failure, ordered by field name.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid ({})", field, e.code),
            })
        })
        .collect();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Malformed)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 10, message = "title must be 1-10 characters"))]
        title: String,
        #[validate(range(min = 0))]
        time_spent: i32,
    }

    async fn post_raw(body: impl Into<Body>) -> (StatusCode, Value) {
        let app = Router::new().route(
            "/",
            post(|ValidatedJson(_): ValidatedJson<Sample>| async { "ok" }),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let (status, _) = post_raw(json!({"title": "Intro", "time_spent": 30}).to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (status, body) = post_raw("not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn missing_field_is_400() {
        let (status, _) = post_raw(json!({"title": "Intro"}).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_fields_are_422_in_field_order() {
        let (status, body) = post_raw(json!({"title": "", "time_spent": -5}).to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let message = body["error"].as_str().unwrap();
        assert_eq!(
            message,
            "time_spent: invalid (range); title: title must be 1-10 characters"
        );
    }
}
