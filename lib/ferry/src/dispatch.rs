//! Request dispatch and response classification.
//!
//! Each dispatched request ends in exactly one [`ResponseOutcome`]:
//!
//! | status                     | outcome                                 |
//! |----------------------------|-----------------------------------------|
//! | 200-299, 304               | `Success` with the body                 |
//! | 422                        | `Invalid` with the `errors` member only |
//! | anything else, no response | `AdapterError` with status and detail   |
//!
//! Nothing is retried here.

use bytes::Bytes;
use ferry_core::{
    AdapterError, AdapterErrorKind, HttpClient, InvalidError, Method, Request, Response,
    ResponseOutcome, Result, StatusCode,
};
use serde_json::Value;
use tracing::{Instrument, debug, info_span, warn};

/// Longest body excerpt used as an error detail.
const MAX_DETAIL_LEN: usize = 512;

/// Execute `request` and classify the result.
pub async fn dispatch<C: HttpClient>(client: &C, request: Request<Bytes>) -> ResponseOutcome {
    let method = request.method();
    let url = request.url().to_string();
    let span = info_span!("dispatch", %method, %url);

    async move {
        let result = client.execute(request).await;
        let outcome = classify(method, &url, result);
        match &outcome {
            ResponseOutcome::Success(_) => debug!("request succeeded"),
            ResponseOutcome::Invalid(error) => {
                debug!(errors = error.errors().len(), "record rejected as invalid");
            }
            ResponseOutcome::AdapterError(error) => {
                warn!(status = error.status(), kind = %error.kind(), "request failed");
            }
        }
        outcome
    }
    .instrument(span)
    .await
}

/// Classify a transport result.
#[must_use]
pub fn classify(method: Method, url: &str, result: Result<Response<Bytes>>) -> ResponseOutcome {
    match result {
        Ok(response) => classify_response(method, url, &response),
        Err(error) => {
            let kind = if error.is_timeout() {
                AdapterErrorKind::Timeout
            } else {
                AdapterErrorKind::Network
            };
            ResponseOutcome::AdapterError(AdapterError::with_kind(
                0,
                kind,
                format!("{method} {url} failed: {error}"),
            ))
        }
    }
}

/// Classify a received response by status code.
#[must_use]
pub fn classify_response(method: Method, url: &str, response: &Response<Bytes>) -> ResponseOutcome {
    let status = response.status();

    if response.is_success() || response.is_not_modified() {
        return match parse_body(response.body()) {
            Ok(payload) => ResponseOutcome::Success(payload),
            Err(error) => ResponseOutcome::AdapterError(AdapterError::new(
                status,
                format!("{method} {url} returned a {status}: payload is not valid JSON ({error})"),
            )),
        };
    }

    let payload = parse_body(response.body()).ok();

    if status == 422 {
        let errors = match payload.as_ref().and_then(|body| body.get("errors")) {
            Some(Value::Array(errors)) => errors.clone(),
            Some(error @ Value::Object(_)) => vec![error.clone()],
            _ => Vec::new(),
        };
        return ResponseOutcome::Invalid(InvalidError::new(errors));
    }

    let errors = match payload.as_ref().and_then(|body| body.get("errors")) {
        Some(Value::Array(errors)) => errors.clone(),
        _ => Vec::new(),
    };
    let detail = format!(
        "{method} {url} returned a {status}: {}",
        detail_message(status, &errors, response)
    );
    ResponseOutcome::AdapterError(AdapterError::new(status, detail).with_errors(errors))
}

/// Parse a JSON body; an empty body is `null`.
fn parse_body(body: &Bytes) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    ferry_core::from_json(body)
}

/// Best-effort description of a failed response.
fn detail_message(status: u16, errors: &[Value], response: &Response<Bytes>) -> String {
    let from_errors = errors
        .iter()
        .filter_map(|error| {
            error
                .get("detail")
                .or_else(|| error.get("title"))
                .and_then(Value::as_str)
        })
        .collect::<Vec<_>>()
        .join("; ");
    if !from_errors.is_empty() {
        return from_errors;
    }

    let text = response.text_lossy();
    let text = text.trim();
    if !text.is_empty() {
        return text.chars().take(MAX_DETAIL_LEN).collect();
    }

    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use ferry_core::Error;
    use serde_json::json;

    fn response(status: u16, body: &str) -> Response<Bytes> {
        Response::new(status, HashMap::new(), Bytes::from(body.to_string()))
    }

    fn classify_status(status: u16, body: &str) -> ResponseOutcome {
        classify_response(Method::Get, "/posts/1", &response(status, body))
    }

    #[test]
    fn ok_carries_body_unmodified() {
        let body = json!({"data": {"type": "posts", "id": "1", "attributes": {"title": "Hi"}}});
        let outcome = classify_status(200, &body.to_string());
        assert_eq!(outcome, ResponseOutcome::Success(body));
    }

    #[test]
    fn not_modified_and_no_content_are_success() {
        assert_eq!(classify_status(304, ""), ResponseOutcome::Success(Value::Null));
        assert_eq!(classify_status(204, ""), ResponseOutcome::Success(Value::Null));
    }

    #[test]
    fn unprocessable_keeps_only_errors() {
        let body = json!({
            "errors": [{"detail": "can't be blank", "source": {"pointer": "/data/attributes/title"}}],
            "data": {"type": "posts", "id": "1"}
        });
        let outcome = classify_status(422, &body.to_string());

        let ResponseOutcome::Invalid(error) = outcome else {
            panic!("expected an invalid outcome");
        };
        assert_eq!(error.errors().to_vec(), vec![json!({
                    "detail": "can't be blank",
                    "source": {"pointer": "/data/attributes/title"}
                })]);
    }

    #[test]
    fn server_error_has_status_and_detail() {
        let outcome = classify_status(500, "");

        let ResponseOutcome::AdapterError(error) = outcome else {
            panic!("expected an adapter error outcome");
        };
        assert_eq!(error.status(), 500);
        assert_eq!(error.kind(), AdapterErrorKind::Server);
        assert_eq!(error.detail(), "GET /posts/1 returned a 500: Internal Server Error");
    }

    #[test]
    fn error_detail_prefers_json_api_errors() {
        let body = json!({"errors": [{"title": "Forbidden", "detail": "not yours"}]});
        let outcome = classify_status(403, &body.to_string());

        let ResponseOutcome::AdapterError(error) = outcome else {
            panic!("expected an adapter error outcome");
        };
        assert_eq!(error.kind(), AdapterErrorKind::Forbidden);
        assert!(error.detail().ends_with("not yours"));
        assert_eq!(error.errors().len(), 1);
    }

    #[test]
    fn error_detail_falls_back_to_body_text() {
        let outcome = classify_status(404, "no such post");

        let ResponseOutcome::AdapterError(error) = outcome else {
            panic!("expected an adapter error outcome");
        };
        assert_eq!(error.detail(), "GET /posts/1 returned a 404: no such post");
    }

    #[test]
    fn invalid_json_on_success_is_adapter_error() {
        let outcome = classify_status(200, "<html>");

        let ResponseOutcome::AdapterError(error) = outcome else {
            panic!("expected an adapter error outcome");
        };
        assert_eq!(error.status(), 200);
        assert!(error.detail().contains("not valid JSON"));
    }

    #[test]
    fn transport_failures_have_status_zero() {
        let outcome = classify(Method::Get, "/posts", Err(Error::Timeout));
        let ResponseOutcome::AdapterError(error) = outcome else {
            panic!("expected an adapter error outcome");
        };
        assert_eq!(error.status(), 0);
        assert_eq!(error.kind(), AdapterErrorKind::Timeout);

        let outcome = classify(Method::Get, "/posts", Err(Error::connection("refused")));
        let ResponseOutcome::AdapterError(error) = outcome else {
            panic!("expected an adapter error outcome");
        };
        assert_eq!(error.kind(), AdapterErrorKind::Network);
        assert_eq!(error.detail(), "GET /posts failed: connection error: refused");
    }
}
