//! Bundle finder client — wallet correlation analysis on a remote server
//!
//! The heuristic runs out of process; this client only posts the request
//! and maps non-2xx answers to [`BundleError::Server`].

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_BUNDLE_URL: &str = "http://127.0.0.1:5000/api/analyze";

#[derive(Error, Debug)]
pub enum BundleError {
    /// Non-2xx answer; message is the server's `error` field when present
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Failed to connect to analysis server: {0}")]
    Http(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub address: String,
    pub chain_id: String,
    pub desired_token_count: u32,
    pub history_limit: u32,
    pub scope: String,
    pub precision: String,
}

impl AnalyzeRequest {
    /// BSC, 50 tokens, 100 history entries, middle scope, precise mode
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            chain_id: "56".to_string(),
            desired_token_count: 50,
            history_limit: 100,
            scope: "middle".to_string(),
            precision: "precise".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStep {
    pub name: String,
    pub status: String,
    pub message: String,
    pub ts: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suspect {
    pub address: String,
    pub score: f64,
    pub count: u64,
    pub total_analyzed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub steps: Vec<AnalysisStep>,
    #[serde(default)]
    pub suspects: Vec<Suspect>,
    pub has_bundle: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `error` from a JSON body, else a generic status message
pub fn server_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("Server error: {}", status.as_u16()))
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct BundleFinderClient {
    client: Client,
    url: String,
}

impl Default for BundleFinderClient {
    fn default() -> Self {
        Self::new(DEFAULT_BUNDLE_URL)
    }
}

impl BundleFinderClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            url: url.into(),
        }
    }

    /// POST the analysis request. No retries.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResult, BundleError> {
        debug!(address = %request.address, chain = %request.chain_id, "Requesting bundle analysis");

        let resp = self.client.post(&self.url).json(request).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let message = server_error_message(status, &body);
            error!(status = status.as_u16(), %message, "Bundle analysis failed");
            return Err(BundleError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let result: AnalyzeResult = resp.json().await?;
        debug!(
            suspects = result.suspects.len(),
            has_bundle = result.has_bundle,
            "Bundle analysis complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the request body received
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/analyze", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let request_body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if text.len() >= split + 4 + content_length {
                        break text[split + 4..].to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request_body
        });

        (url, handle)
    }

    #[test]
    fn test_request_defaults_and_wire_names() {
        let json = serde_json::to_value(AnalyzeRequest::new("0xabc")).unwrap();
        assert_eq!(json["address"], "0xabc");
        assert_eq!(json["chainId"], "56");
        assert_eq!(json["desiredTokenCount"], 50);
        assert_eq!(json["historyLimit"], 100);
        assert_eq!(json["scope"], "middle");
        assert_eq!(json["precision"], "precise");
    }

    #[test]
    fn test_server_error_message() {
        assert_eq!(
            server_error_message(StatusCode::BAD_REQUEST, r#"{"error": "invalid address"}"#),
            "invalid address"
        );
        assert_eq!(
            server_error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "Server error: 502"
        );
        assert_eq!(
            server_error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": "x"}"#),
            "Server error: 500"
        );
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"steps":[{"name":"fetch","status":"done","message":"ok","ts":1700000000.5}],
                "suspects":[{"address":"0xdef","score":0.92,"count":14,"totalAnalyzed":50}],
                "hasBundle":true,"fromCache":false}"#,
        )
        .await;

        let client = BundleFinderClient::new(url);
        let result = client.analyze(&AnalyzeRequest::new("0xabc")).await.unwrap();
        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();

        assert!(result.has_bundle);
        assert_eq!(result.from_cache, Some(false));
        assert_eq!(result.suspects[0].total_analyzed, 50);
        assert_eq!(result.steps[0].name, "fetch");
        assert_eq!(sent["address"], "0xabc");
    }

    #[tokio::test]
    async fn test_analyze_surfaces_server_error() {
        let (url, server) = serve_once("400 Bad Request", r#"{"error":"Unsupported chain"}"#).await;

        let err = BundleFinderClient::new(url)
            .analyze(&AnalyzeRequest::new("0xabc"))
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            BundleError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported chain");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = BundleFinderClient::new(format!("http://{addr}/api/analyze"))
            .analyze(&AnalyzeRequest::new("0xabc"))
            .await
            .unwrap_err();
        assert!(matches!(err, BundleError::Http(_)));
    }
}
