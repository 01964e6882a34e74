// Validated decoding of the `{status, message?, data, error?, pagination?}` wrapper

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, GENERIC_FAILURE};
use crate::domain::Pagination;

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub message: Option<String>,
    pub data: T,
    pub pagination: Option<Pagination>,
}

fn non_empty_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Turn a raw response into a typed envelope.
///
/// 401 handling happens before this is called since it has session side effects.
pub fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Envelope<T>, ApiError> {
    let code = status.as_u16();
    let value: Value = serde_json::from_str(body).map_err(|e| {
        let snippet_len = body.len().min(200);
        let snippet = body.get(..snippet_len).unwrap_or_default();
        tracing::error!(error = %e, http_status = code, body_snippet = %snippet, "response is not JSON");
        ApiError::BadResponse {
            status: code,
            message: format!("response is not valid JSON: {e}"),
        }
    })?;

    let flagged_failure = value.get("status") == Some(&Value::Bool(false));
    if flagged_failure || !status.is_success() {
        let message = non_empty_str(&value, "message")
            .or_else(|| non_empty_str(&value, "error"))
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        tracing::debug!(http_status = code, %message, "request failed");
        return Err(ApiError::RequestFailed {
            message,
            status: code,
            payload: Some(value),
        });
    }

    let message = non_empty_str(&value, "message").map(str::to_string);
    let pagination = match value.get("pagination") {
        None | Some(Value::Null) => None,
        Some(p) => Some(serde_json::from_value(p.clone()).map_err(|e| ApiError::BadResponse {
            status: code,
            message: format!("unexpected `pagination` shape: {e}"),
        })?),
    };
    let data = value.get("data").cloned().unwrap_or(Value::Null);
    let data = serde_json::from_value(data).map_err(|e| {
        tracing::error!(error = %e, http_status = code, "failed to decode response data");
        ApiError::BadResponse {
            status: code,
            message: format!("unexpected `data` shape: {e}"),
        }
    })?;

    Ok(Envelope {
        message,
        data,
        pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ebook;

    #[test]
    fn unwraps_data_and_pagination() {
        let body = r#"{
            "status": true,
            "data": [{ "id": "1", "slug": "a", "name": "A" }],
            "pagination": { "page": 2, "limit": 10, "total": 35, "pages": 4 }
        }"#;
        let env: Envelope<Vec<Ebook>> = decode(StatusCode::OK, body).unwrap();
        assert_eq!(env.data.len(), 1);
        assert_eq!(env.pagination.unwrap().pages, 4);
    }

    #[test]
    fn status_false_uses_message_then_error_then_generic() {
        let err = decode::<Value>(StatusCode::OK, r#"{ "status": false, "message": "nope" }"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(err.status(), Some(200));

        let err = decode::<Value>(
            StatusCode::BAD_REQUEST,
            r#"{ "status": false, "message": "", "error": "bad slug" }"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "bad slug");
        assert_eq!(err.status(), Some(400));

        let err = decode::<Value>(StatusCode::INTERNAL_SERVER_ERROR, r#"{}"#).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn non_json_body_is_bad_response() {
        let err = decode::<Value>(StatusCode::BAD_GATEWAY, "<html>gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::BadResponse { status: 502, .. }));
    }

    #[test]
    fn wrong_data_shape_is_bad_response_not_panic() {
        let err = decode::<Vec<Ebook>>(StatusCode::OK, r#"{ "status": true, "data": { "id": 1 } }"#)
            .unwrap_err();
        match err {
            ApiError::BadResponse { status, message } => {
                assert_eq!(status, 200);
                assert!(message.contains("data"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_data_decodes_as_unit() {
        let env: Envelope<()> = decode(StatusCode::OK, r#"{ "status": true, "message": "Deleted" }"#).unwrap();
        assert_eq!(env.message.as_deref(), Some("Deleted"));
    }
}
