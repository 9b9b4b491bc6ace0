use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;
use devbook_service::parser::profile::FieldOrder;

use crate::error::ProfileError;

/// JSON body that has passed `validator` checks. Field failures turn into
/// [`ProfileError::Validation`] before the handler runs.
///
/// An empty body is read as `{}`, so a request without a body reports every
/// required field instead of a content-type error.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let mime = value.split(';').next().unwrap_or("").trim();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + FieldOrder,
    S: Send + Sync,
{
    type Rejection = ProfileError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(&req);
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ProfileError::MalformedBody(rejection.body_text()))?;

        let parsed = if body.is_empty() {
            Json::<T>::from_bytes(b"{}")
        } else if json {
            Json::<T>::from_bytes(&body)
        } else {
            return Err(ProfileError::MalformedBody(
                "Expected request with `Content-Type: application/json`".to_string(),
            ));
        };

        let Json(value) = parsed.map_err(|rejection| ProfileError::MalformedBody(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ProfileError::validation(errors, T::FIELDS))?;
        Ok(ValidatedJson(value))
    }
}
