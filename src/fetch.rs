//! Esummary client: one request per chunk, one summary per identifier.
//!
//! The HTTP layer sits behind [`Transport`] so the request/parse/retry logic
//! can run against canned responses.
//!
//! Response shape:
//!
//! ```json
//! { "result": { "uids": ["7157"], "7157": { "summary": "This gene encodes ..." } } }
//! ```

use crate::batch::Chunk;
use crate::error::{Result, SummaryError};
use crate::request::Endpoint;
use crate::throttle::RequestGate;
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// User agent sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Substituted when the service has no summary for a queried identifier
pub const NO_SUMMARY_PLACEHOLDER: &str = "No Entrez summary in NCBI";

/// Request timeout unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retries per chunk for transient failures unless configured otherwise
pub const DEFAULT_RETRIES: u32 = 2;

/// First retry delay, doubled on each further attempt
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Wait applied to HTTP 429 without a usable Retry-After
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Summary text for one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub id: String,
    pub summary: String,
}

impl SummaryRecord {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
        }
    }

    /// True when the service had nothing for this identifier
    pub fn is_placeholder(&self) -> bool {
        self.summary == NO_SUMMARY_PLACEHOLDER
    }
}

/// URL in, response body out.
///
/// Implementations report non-success statuses as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        (**self).get(url).await
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SummaryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "Sending esummary request");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(SummaryError::RateLimited(secs));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), error = %error_text, "Esummary API error");
            return Err(SummaryError::Api {
                code: status.as_u16(),
                message: format!("{} {}", status, error_text.trim()),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

// === Esummary Response Types ===

#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    #[serde(default)]
    result: Option<Map<String, Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract one record per chunk identifier from an esummary body.
///
/// Records follow chunk order. A missing entry, missing `summary`, null or
/// empty summary all map to [`NO_SUMMARY_PLACEHOLDER`]; any other text is
/// kept verbatim.
pub fn parse_summaries(body: &[u8], chunk: &Chunk) -> Result<Vec<SummaryRecord>> {
    let response: EsummaryResponse = serde_json::from_slice(body).map_err(|e| {
        SummaryError::MalformedResponse(format!("Failed to parse esummary response: {}", e))
    })?;

    let result = match response.result {
        Some(result) => result,
        None => {
            let reason = response
                .error
                .map(|e| format!("service error: {}", e))
                .unwrap_or_else(|| "missing `result` object".to_string());
            return Err(SummaryError::MalformedResponse(reason));
        }
    };

    let records = chunk
        .ids()
        .iter()
        .map(|id| {
            let summary = result
                .get(id)
                .and_then(|entry| entry.get("summary"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());

            match summary {
                Some(text) => SummaryRecord::new(id.as_str(), text),
                None => SummaryRecord::new(id.as_str(), NO_SUMMARY_PLACEHOLDER),
            }
        })
        .collect();

    Ok(records)
}

/// Per-chunk fetcher with retry and optional shared pacing
pub struct SummaryFetcher<T> {
    transport: T,
    endpoint: Endpoint,
    retries: u32,
    initial_backoff: Duration,
    gate: Option<RequestGate>,
}

impl<T: Transport> SummaryFetcher<T> {
    pub fn new(transport: T, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            retries: DEFAULT_RETRIES,
            initial_backoff: INITIAL_BACKOFF,
            gate: None,
        }
    }

    /// Retries allowed per chunk after the first attempt (0 = fail fast)
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    /// Space every request start, retries included, by `interval`
    pub fn with_gate(mut self, interval: Duration) -> Self {
        self.gate = Some(RequestGate::new(interval));
        self
    }

    /// Fetch and parse one chunk.
    ///
    /// Transient failures (network, HTTP 429, HTTP 5xx) are retried with
    /// exponential backoff; anything else returns at once.
    pub async fn fetch_chunk(&self, chunk: &Chunk) -> Result<Vec<SummaryRecord>> {
        let url = self.endpoint.url_for(chunk);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            match self.try_fetch(&url, chunk).await {
                Ok(records) => {
                    let missing = records.iter().filter(|r| r.is_placeholder()).count();
                    debug!(ids = chunk.len(), missing = missing, "Parsed chunk summaries");
                    return Ok(records);
                }
                Err(e) if e.is_transient() && attempt < self.retries => {
                    let wait = match &e {
                        SummaryError::RateLimited(secs) => Duration::from_secs(*secs).max(backoff),
                        _ => backoff,
                    } + jitter();
                    attempt += 1;
                    warn!(
                        attempt = attempt,
                        retries = self.retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Chunk request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                }
                Err(e) => {
                    if attempt > 0 {
                        info!(attempts = attempt + 1, "Giving up on chunk");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str, chunk: &Chunk) -> Result<Vec<SummaryRecord>> {
        if let Some(gate) = &self.gate {
            gate.acquire().await;
        }
        let body = self.transport.get(url).await?;
        parse_summaries(&body, chunk)
    }
}

fn jitter() -> Duration {
    Duration::from_millis(rand::random::<u64>() % 250)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued responses in order and records requested URLs
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Vec<u8>>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Vec<u8>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.urls.lock().map(|u| u.len()).unwrap_or(0)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<Vec<u8>> {
            if let Ok(mut urls) = self.urls.lock() {
                urls.push(url.to_string());
            }
            self.responses
                .lock()
                .ok()
                .and_then(|mut r| r.pop_front())
                .unwrap_or_else(|| Err(SummaryError::Config("no scripted response".to_string())))
        }
    }

    fn chunk(ids: &[&str]) -> Chunk {
        Chunk::new(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_missing_summaries_get_placeholder() -> Result<()> {
        let body = br#"{"result": {
            "uids": ["123", "124", "125", "126"],
            "123": {"summary": ""},
            "124": {"summary": null},
            "125": {"name": "FOO"}
        }}"#;

        let records = parse_summaries(body, &chunk(&["123", "124", "125", "126"]))?;
        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.summary, NO_SUMMARY_PLACEHOLDER);
            assert!(record.is_placeholder());
        }
        assert_eq!(records[0], SummaryRecord::new("123", NO_SUMMARY_PLACEHOLDER));
        Ok(())
    }

    #[test]
    fn test_summary_text_is_kept_verbatim() -> Result<()> {
        let body = br#"{"result": {
            "456": {"summary": "Involved in X."},
            "7": {"summary": "  spaced "},
            "8": {"summary": "   "}
        }}"#;
        let records = parse_summaries(body, &chunk(&["7", "456", "8"]))?;
        assert_eq!(records[0], SummaryRecord::new("7", "  spaced "));
        assert_eq!(records[1], SummaryRecord::new("456", "Involved in X."));
        assert_eq!(records[2], SummaryRecord::new("8", "   "));
        assert!(!records[2].is_placeholder());
        Ok(())
    }

    #[test]
    fn test_malformed_bodies() {
        let c = chunk(&["1"]);
        assert!(matches!(
            parse_summaries(b"<html>busy</html>", &c),
            Err(SummaryError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_summaries(b"{}", &c),
            Err(SummaryError::MalformedResponse(_))
        ));
        match parse_summaries(br#"{"error": "API rate limit exceeded"}"#, &c) {
            Err(SummaryError::MalformedResponse(msg)) => assert!(msg.contains("rate limit")),
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_chunk_requests_chunk_url() -> Result<()> {
        let transport = ScriptedTransport::new(vec![Ok(
            br#"{"result": {"1": {"summary": "one"}, "2": {"summary": ""}}}"#.to_vec(),
        )]);
        let fetcher = SummaryFetcher::new(&transport, Endpoint::default());

        let records = fetcher.fetch_chunk(&chunk(&["1", "2"])).await?;
        assert_eq!(
            records,
            vec![
                SummaryRecord::new("1", "one"),
                SummaryRecord::new("2", NO_SUMMARY_PLACEHOLDER)
            ]
        );

        let urls = transport.urls.lock().map(|u| u.clone()).unwrap_or_default();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("db=gene&id=1,2&retmode=json"));
        Ok(())
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() -> Result<()> {
        let transport = ScriptedTransport::new(vec![
            Err(SummaryError::Api {
                code: 502,
                message: "Bad Gateway".to_string(),
            }),
            Ok(br#"{"result": {"9": {"summary": "nine"}}}"#.to_vec()),
        ]);
        let fetcher = SummaryFetcher::new(&transport, Endpoint::default())
            .with_retries(1)
            .with_backoff(Duration::from_millis(1));

        let records = fetcher.fetch_chunk(&chunk(&["9"])).await?;
        assert_eq!(records, vec![SummaryRecord::new("9", "nine")]);
        assert_eq!(transport.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(SummaryError::Api {
            code: 414,
            message: "Request-URI Too Long".to_string(),
        })]);
        let fetcher = SummaryFetcher::new(&transport, Endpoint::default())
            .with_retries(3)
            .with_backoff(Duration::from_millis(1));

        let result = fetcher.fetch_chunk(&chunk(&["1"])).await;
        assert!(matches!(result, Err(SummaryError::Api { code: 414, .. })));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_fails_fast() {
        let transport = ScriptedTransport::new(vec![
            Err(SummaryError::Api {
                code: 503,
                message: "Service Unavailable".to_string(),
            }),
            Ok(br#"{"result": {}}"#.to_vec()),
        ]);
        let fetcher = SummaryFetcher::new(&transport, Endpoint::default()).with_retries(0);

        assert!(fetcher.fetch_chunk(&chunk(&["1"])).await.is_err());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_for_retry_after() -> Result<()> {
        let transport = ScriptedTransport::new(vec![
            Err(SummaryError::RateLimited(2)),
            Ok(br#"{"result": {"5": {"summary": "five"}}}"#.to_vec()),
        ]);
        let fetcher = SummaryFetcher::new(&transport, Endpoint::default())
            .with_retries(1)
            .with_backoff(Duration::from_millis(1));

        let start = tokio::time::Instant::now();
        let records = fetcher.fetch_chunk(&chunk(&["5"])).await?;
        assert_eq!(records, vec![SummaryRecord::new("5", "five")]);
        assert_eq!(transport.calls(), 2);
        // Retry-After dominates the 1 ms backoff; jitter adds under 250 ms
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(2), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(2250), "waited {:?}", waited);
        Ok(())
    }

    mod http {
        use super::super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use tokio::task::JoinHandle;

        /// Answer a single request with `response` and hand back the raw request
        async fn serve_once(response: String) -> std::io::Result<(String, JoinHandle<String>)> {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            let addr = listener.local_addr()?;

            let handle = tokio::spawn(async move {
                let mut request = Vec::new();
                if let Ok((mut socket, _)) = listener.accept().await {
                    let mut buf = [0u8; 1024];
                    loop {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                request.extend_from_slice(&buf[..n]);
                                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                    break;
                                }
                            }
                        }
                    }
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                String::from_utf8_lossy(&request).into_owned()
            });

            let url = format!("http://{}/esummary.fcgi?db=gene&id=1&retmode=json", addr);
            Ok((url, handle))
        }

        fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
            format!(
                concat!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\n",
                    "{}Content-Length: {}\r\nConnection: close\r\n\r\n{}"
                ),
                status,
                extra_headers,
                body.len(),
                body
            )
        }

        fn transport() -> Result<HttpTransport> {
            HttpTransport::new(Duration::from_secs(5))
        }

        #[tokio::test]
        async fn test_success_returns_body_and_sends_user_agent() -> Result<()> {
            let body = r#"{"result": {"1": {"summary": "one"}}}"#;
            let (url, server) = serve_once(http_response("200 OK", "", body)).await?;

            let bytes = transport()?.get(&url).await?;
            assert_eq!(bytes, body.as_bytes());

            let request = server.await.unwrap_or_default().to_ascii_lowercase();
            assert!(request.starts_with("get /esummary.fcgi?db=gene&id=1&retmode=json"));
            assert!(request.contains("user-agent: mozilla/5.0\r\n"), "{}", request);
            Ok(())
        }

        #[tokio::test]
        async fn test_server_error_maps_to_api() -> Result<()> {
            let (url, _server) =
                serve_once(http_response("500 Internal Server Error", "", "oops")).await?;

            match transport()?.get(&url).await {
                Err(SummaryError::Api { code, message }) => {
                    assert_eq!(code, 500);
                    assert!(message.contains("oops"), "{}", message);
                }
                other => panic!("expected Api error, got {:?}", other),
            }
            Ok(())
        }

        #[tokio::test]
        async fn test_too_many_requests_maps_to_rate_limited() -> Result<()> {
            let (url, _server) =
                serve_once(http_response("429 Too Many Requests", "Retry-After: 7\r\n", "")).await?;
            assert!(matches!(
                transport()?.get(&url).await,
                Err(SummaryError::RateLimited(7))
            ));

            let (url, _server) =
                serve_once(http_response("429 Too Many Requests", "", "")).await?;
            assert!(matches!(
                transport()?.get(&url).await,
                Err(SummaryError::RateLimited(DEFAULT_RETRY_AFTER_SECS))
            ));
            Ok(())
        }
    }
}
