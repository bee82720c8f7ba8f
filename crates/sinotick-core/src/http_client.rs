use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportFailure;
use crate::headers;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Outgoing request envelope. Every upstream in this system is queried
/// with plain GETs, so there is no method or body here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// URL with the query string rendered, for diagnostics and fakes.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query: Vec<String> = self
            .query
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect();
        format!("{}?{}", self.url, query.join("&"))
    }
}

/// Response envelope handed back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Classification of client-level failures, used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Reset,
    Other,
}

/// Client-level HTTP error: the call never produced a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub fn reset(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Reset, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Other, message)
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<HttpError> for TransportFailure {
    fn from(value: HttpError) -> Self {
        match value.kind {
            HttpErrorKind::Timeout => Self::Timeout,
            HttpErrorKind::Connect => Self::Connect,
            HttpErrorKind::Reset => Self::Reset,
            HttpErrorKind::Other => Self::Other(value.message),
        }
    }
}

/// Transport seam the adapters and the resilient transport talk through.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Default offline client; every call fails with a connect error so
/// nothing constructed without real wiring can reach the network.
#[derive(Debug, Default)]
pub struct NoopHttpClient;

impl HttpClient for NoopHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let _ = request;
        Box::pin(async move { Err(HttpError::connect("no transport configured")) })
    }
}

/// Process-wide proxy settings, read from the environment exactly once at
/// startup and passed in by reference from then on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self {
            http: read_env("http_proxy").or_else(|| read_env("HTTP_PROXY")),
            https: read_env("https_proxy").or_else(|| read_env("HTTPS_PROXY")),
        }
    }

    pub const fn is_unset(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

fn read_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// Production client. Applies the proxy configuration at build time, keeps
/// a cookie store for the upstreams that demand one, and stamps browser
/// camouflage headers onto every request.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new(proxy: &ProxyConfig) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10));

        if proxy.is_unset() {
            builder = builder.no_proxy();
        } else {
            if let Some(url) = &proxy.http {
                let http_proxy = reqwest::Proxy::http(url)
                    .map_err(|err| HttpError::other(format!("invalid http proxy: {err}")))?;
                builder = builder.proxy(http_proxy);
            }
            if let Some(url) = &proxy.https {
                let https_proxy = reqwest::Proxy::https(url)
                    .map_err(|err| HttpError::other(format!("invalid https proxy: {err}")))?;
                builder = builder.proxy(https_proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|err| HttpError::other(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    fn classify(err: &reqwest::Error) -> HttpErrorKind {
        if err.is_timeout() {
            return HttpErrorKind::Timeout;
        }
        if err.is_connect() {
            return HttpErrorKind::Connect;
        }

        let message = err.to_string();
        if message.contains("reset") || message.contains("broken pipe") {
            HttpErrorKind::Reset
        } else {
            HttpErrorKind::Other
        }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .timeout(Duration::from_millis(request.timeout_ms));

            if !request.query.is_empty() {
                let pairs: Vec<(&String, &String)> = request.query.iter().collect();
                builder = builder.query(&pairs);
            }

            let mut headers = headers::camouflage_headers();
            headers.insert(
                String::from("user-agent"),
                headers::pick_user_agent().to_owned(),
            );
            headers.extend(request.headers);
            for (name, value) in &headers {
                builder = builder.header(name, value);
            }

            let response = builder
                .send()
                .await
                .map_err(|err| HttpError::new(Self::classify(&err), err.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|err| HttpError::new(Self::classify(&err), err.to_string()))?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_query_and_headers() {
        let request = HttpRequest::get("https://example.test/kline")
            .with_query("param", "sh600000,day,,,320,qfq")
            .with_query("r", "0.5")
            .with_header("Referer", "https://finance.qq.com/")
            .with_timeout_ms(15_000);

        assert_eq!(request.timeout_ms, 15_000);
        assert_eq!(
            request.headers.get("referer").map(String::as_str),
            Some("https://finance.qq.com/")
        );
        assert_eq!(
            request.full_url(),
            "https://example.test/kline?param=sh600000%2Cday%2C%2C%2C320%2Cqfq&r=0.5"
        );
    }

    #[test]
    fn proxy_config_reports_unset_when_empty() {
        let unset = ProxyConfig::default();
        assert!(unset.is_unset());

        let set = ProxyConfig {
            http: Some(String::from("http://127.0.0.1:7890")),
            https: None,
        };
        assert!(!set.is_unset());
    }
}
