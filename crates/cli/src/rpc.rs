//! Minimal JSON-RPC 2.0 over HTTP

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let body = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to server")?
            .text()
            .await
            .context("Failed to read response")?;

        unwrap_response(&body)
    }
}

/// Extract the result, turning an error object into an error
pub fn unwrap_response(body: &str) -> Result<serde_json::Value> {
    let response: JsonRpcResponse = serde_json::from_str(body).context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("{}", describe_error(&error));
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn describe_error(error: &JsonRpcError) -> String {
    let kind = match error.code {
        4000 => "invalid request",
        4001 => "not found",
        4002 => "conflict",
        4003 => "rate limited",
        5001 => "database error",
        5002 => "upstream service error",
        _ => "server error",
    };
    format!("{} ({}): {}", kind, error.code, error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_returned() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"count":2}}"#;
        assert_eq!(unwrap_response(body).unwrap()["count"], 2);
    }

    #[test]
    fn test_error_object_becomes_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"Task x not found"}}"#;
        let err = unwrap_response(body).unwrap_err();
        assert_eq!(err.to_string(), "not found (4001): Task x not found");
    }

    #[test]
    fn test_missing_result_is_an_error() {
        assert!(unwrap_response(r#"{"jsonrpc":"2.0","id":1}"#).is_err());
        assert!(unwrap_response("not json").is_err());
    }
}
