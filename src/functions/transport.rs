use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value as JsonValue;

use crate::functions::error::{
    error_for_http_response, internal_error, invalid_argument, FunctionsError, FunctionsErrorCode,
    FunctionsResult,
};

#[derive(Clone, Debug)]
pub struct ProxyRequest {
    pub url: String,
    pub payload: JsonValue,
    pub timeout: Duration,
    pub headers: HashMap<String, String>,
}

impl ProxyRequest {
    pub fn new(url: impl Into<String>, payload: JsonValue, timeout: Duration) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            url: url.into(),
            payload,
            timeout,
            headers,
        }
    }
}

/// POSTs the request payload as JSON and returns the decoded JSON response body.
pub async fn invoke_async(client: &Client, request: ProxyRequest) -> FunctionsResult<JsonValue> {
    let ProxyRequest {
        url,
        payload,
        timeout,
        headers,
    } = request;

    let header_map = build_headers(&headers)?;
    let response = client
        .post(url)
        .timeout(timeout)
        .headers(header_map)
        .json(&payload)
        .send()
        .await
        .map_err(map_reqwest_error)?;

    handle_response(response).await
}

fn build_headers(headers: &HashMap<String, String>) -> FunctionsResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| invalid_argument(format!("invalid header name `{key}`: {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| invalid_argument(format!("invalid header value for `{key}`: {err}")))?;
        map.insert(name, header_value);
    }
    Ok(map)
}

fn map_reqwest_error(err: reqwest::Error) -> FunctionsError {
    if err.is_timeout() {
        return FunctionsError::new(
            FunctionsErrorCode::DeadlineExceeded,
            format!("proxy request timed out: {err}"),
        );
    }
    if err.is_connect() {
        return FunctionsError::new(
            FunctionsErrorCode::Unavailable,
            format!("failed to connect to function endpoint: {err}"),
        );
    }
    if err.is_decode() {
        return internal_error(format!("unable to decode function response: {err}"));
    }
    if err.is_builder() || err.is_request() {
        return invalid_argument(format!("malformed proxy request: {err}"));
    }
    FunctionsError::new(
        FunctionsErrorCode::Unknown,
        format!("proxy request failed: {err}"),
    )
}

async fn handle_response(response: Response) -> FunctionsResult<JsonValue> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| internal_error(format!("failed to read function response body: {err}")))?;

    let (body, parse_error) = if bytes.is_empty() {
        (None, None)
    } else {
        match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        }
    };

    if let Some(error) = error_for_http_response(status.as_u16(), body.as_ref()) {
        return Err(error);
    }

    if let Some(err) = parse_error {
        return Err(internal_error(format!(
            "Function response is not valid JSON: {err}"
        )));
    }

    // 204 and other empty success bodies decode as null.
    Ok(body.unwrap_or(JsonValue::Null))
}
