//! # ERP API Client
//!
//! One reqwest client shared by every service. Attaches the bearer token,
//! refreshes it when the server rejects it, and turns error bodies into
//! messages a cashier can read.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ApiClient::execute                              │
//! │                                                                         │
//! │  access token expiring soon? ──yes──► refresh (best effort)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  send request with Authorization: Bearer <access>                      │
//! │       │                                                                 │
//! │       ├── 2xx ─────────────────────────────────────────► Ok(response)  │
//! │       ├── 4xx/5xx (not 401) ──► ApiError::from_response(status, body) │
//! │       └── 401                                                          │
//! │            │                                                            │
//! │            ▼                                                            │
//! │       POST /users/token/refresh/  (once, behind a lock)                │
//! │            ├── ok ──► resend once ──► 2xx: Ok / 401: clear, Unauth.   │
//! │            ├── offline ──► Network / Timeout (session kept)            │
//! │            └── rejected ──► clear session ──► Unauthorized             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::token::{TokenPair, TokenStore};

pub(crate) const REFRESH_PATH: &str = "users/token/refresh/";

/// Empty query string.
pub const NO_QUERY: &[(&str, &str)] = &[];

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for the ERP server.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the REST API, e.g. `https://erp.example.com/api/`.
    pub base_url: String,

    /// Per-request timeout. A hung call fails instead of blocking a flush.
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Connect timeout.
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    pub user_agent: String,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClientConfig {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("contable-terminal/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Download
// =============================================================================

/// A file returned by the server (PDF invoice, XLSX export, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Paginated list envelope used by the ERP's list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the server rotates refresh tokens.
    #[serde(default)]
    refresh: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the ERP server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: TokenStore,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig, tokens: TokenStore) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        Ok(ApiClient {
            http,
            base_url: normalize_base_url(&config.base_url)?,
            tokens,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Resolves an API path (`"/pos/ventas/"` or `"pos/ventas/"`).
    pub fn url(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // -------------------------------------------------------------------------
    // JSON helpers
    // -------------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self.execute(Method::GET, path, |rb| rb).await?;
        decode_json(resp).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self.execute(Method::GET, path, |rb| rb.query(query)).await?;
        decode_json(resp).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.execute(Method::POST, path, |rb| rb.json(body)).await?;
        decode_json(resp).await
    }

    /// POST for calls where the status alone decides success.
    ///
    /// With a key, the request carries `Idempotency-Key`. Once the server
    /// answers 2xx the call succeeds: a body that is missing, unreadable or
    /// not JSON comes back as `Value::Null`.
    pub async fn post_acknowledged<B>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> ApiResult<serde_json::Value>
    where
        B: Serialize + ?Sized,
    {
        let resp = self
            .execute(Method::POST, path, |rb| match idempotency_key {
                Some(key) => rb.header("Idempotency-Key", key).json(body),
                None => rb.json(body),
            })
            .await?;
        let status = resp.status();

        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path, status = status.as_u16(), error = %e, "Accepted, body unreadable");
                return Ok(serde_json::Value::Null);
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(path, status = status.as_u16(), error = %e, "Accepted, body is not JSON");
                Ok(serde_json::Value::Null)
            }
        }
    }

    /// POST whose response body is ignored.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.execute(Method::POST, path, |rb| rb.json(body)).await?;
        Ok(())
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.execute(Method::PUT, path, |rb| rb.json(body)).await?;
        decode_json(resp).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.execute(Method::PATCH, path, |rb| rb.json(body)).await?;
        decode_json(resp).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, path, |rb| rb).await?;
        Ok(())
    }

    /// POST without a session: login steps.
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let resp = self.http.post(url).json(body).send().await?;
        debug!(path, status = resp.status().as_u16(), "API request (public)");
        decode_json(check_status(resp).await?).await
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    /// GETs a binary document.
    pub async fn download<Q>(&self, path: &str, query: &Q) -> ApiResult<Download>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let resp = self.execute(Method::GET, path, |rb| rb.query(query)).await?;
        read_download(resp, &url).await
    }

    /// Uploads one file as `multipart/form-data`, with extra text fields.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
        fields: &[(&str, String)],
    ) -> ApiResult<T> {
        // Form is rebuilt per attempt; a 401 retry needs a fresh body.
        let build_form = || {
            let part = Part::bytes(bytes.clone())
                .file_name(filename.to_string())
                .mime_str(content_type)
                .unwrap_or_else(|_| Part::bytes(bytes.clone()).file_name(filename.to_string()));
            fields.iter().fold(
                Form::new().part(field.to_string(), part),
                |form, (name, value)| form.text(name.to_string(), value.clone()),
            )
        };

        let resp = self
            .execute(Method::POST, path, |rb| rb.multipart(build_form()))
            .await?;
        decode_json(resp).await
    }

    // -------------------------------------------------------------------------
    // Tokens
    // -------------------------------------------------------------------------

    /// Exchanges the refresh token for a new access token.
    ///
    /// A rejected refresh clears the session.
    pub async fn refresh(&self) -> ApiResult<TokenPair> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> ApiResult<TokenPair> {
        let Some(refresh) = self.tokens.refresh_token() else {
            return Err(ApiError::NoSession);
        };

        match self
            .post_public::<_, RefreshResponse>(REFRESH_PATH, &serde_json::json!({ "refresh": refresh }))
            .await
        {
            Ok(resp) => {
                let pair = TokenPair {
                    access: resp.access,
                    refresh: resp.refresh.unwrap_or(refresh),
                };
                self.tokens.set(pair.clone());
                info!("Access token refreshed");
                Ok(pair)
            }
            Err(e) if e.is_offline() => Err(e),
            Err(e) => {
                warn!(error = %e, "Token refresh rejected, clearing session");
                self.tokens.clear();
                Err(ApiError::Unauthorized(
                    "Your session has expired, sign in again".to_string(),
                ))
            }
        }
    }

    /// Refreshes after the server rejected `rejected`, unless another
    /// request already did.
    async fn refresh_after_rejection(&self, rejected: &str) -> ApiResult<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.access_token() {
            if current != rejected {
                return Ok(current);
            }
        }

        self.refresh_locked().await.map(|pair| pair.access)
    }

    async fn refresh_if_expiring(&self) {
        if !self.tokens.needs_refresh() {
            return;
        }

        let _guard = self.refresh_lock.lock().await;
        if !self.tokens.needs_refresh() {
            return;
        }

        if let Err(e) = self.refresh_locked().await {
            debug!(error = %e, "Proactive token refresh failed");
        }
    }

    // -------------------------------------------------------------------------
    // Core
    // -------------------------------------------------------------------------

    /// Sends an authenticated request, refreshing and retrying once on 401.
    ///
    /// `build` adds the body and headers; it runs once per attempt.
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> ApiResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path)?;

        self.refresh_if_expiring().await;

        let Some(access) = self.tokens.access_token() else {
            return Err(ApiError::NoSession);
        };

        let resp = self.send_once(&method, &url, &access, &build).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(resp).await;
        }

        debug!(path, "Access token rejected, refreshing");
        let fresh = self.refresh_after_rejection(&access).await?;

        let resp = self.send_once(&method, &url, &fresh, &build).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!(path, "Request rejected after token refresh, clearing session");
            self.tokens.clear();
        }
        check_status(resp).await
    }

    async fn send_once<F>(
        &self,
        method: &Method,
        url: &Url,
        access: &str,
        build: &F,
    ) -> ApiResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let request = build(self.http.request(method.clone(), url.clone())).bearer_auth(access);
        let resp = request.send().await?;

        debug!(
            method = %method,
            path = url.path(),
            status = resp.status().as_u16(),
            "API request"
        );
        Ok(resp)
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

async fn check_status(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::from_response(status, &body))
}

async fn decode_json<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let bytes = resp.bytes().await?;
    // 201/204 with no body decodes as `null` (fits `Value` and `Option<_>`).
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_download(resp: Response, url: &Url) -> ApiResult<Download> {
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await?.to_vec();

    let filename = filename_from_headers(&headers)
        .or_else(|| {
            url.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "download".to_string());

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    Ok(Download {
        filename,
        content_type,
        bytes,
    })
}

fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    parse_content_disposition(value)
}

/// Filename from a `Content-Disposition` value; `filename*` wins.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;

    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };

        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // RFC 5987: charset'lang'percent-encoded
                let encoded = raw.trim().splitn(3, '\'').nth(2)?;
                let decoded = percent_decode(encoded)?;
                if let Some(name) = sanitize_filename(&decoded) {
                    return Some(name);
                }
            }
            "filename" => {
                plain = sanitize_filename(raw.trim().trim_matches('"'));
            }
            _ => {}
        }
    }

    plain
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

/// Drops any directory part so a header cannot point outside the target dir.
fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tests::access_token;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, tokens: TokenStore) -> ApiClient {
        ApiClient::new(ApiClientConfig::new(format!("{}/api", server.uri())), tokens).unwrap()
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="factura-12.pdf""#).as_deref(),
            Some("factura-12.pdf")
        );
        assert_eq!(
            parse_content_disposition(
                r#"attachment; filename="n.xlsx"; filename*=UTF-8''n%C3%B3mina%20enero.xlsx"#
            )
            .as_deref(),
            Some("nómina enero.xlsx")
        );
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="../../etc/passwd""#).as_deref(),
            Some("passwd")
        );
        assert_eq!(parse_content_disposition("inline"), None);
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let tokens = TokenStore::new();
        let api = ApiClient::new(ApiClientConfig::new("https://erp.example.com/api"), tokens).unwrap();
        assert_eq!(
            api.url("/pos/ventas/").unwrap().as_str(),
            "https://erp.example.com/api/pos/ventas/"
        );
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pos/productos/"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
            .mount(&server)
            .await;

        let api = client(&server, TokenStore::with_tokens(TokenPair::new("abc", "r")));
        let ids: Vec<i64> = api.get("/pos/productos/").await.unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_no_session_fails_without_request() {
        let server = MockServer::start().await;
        let api = client(&server, TokenStore::new());

        let err = api.get::<serde_json::Value>("/pos/productos/").await.unwrap_err();
        assert!(matches!(err, ApiError::NoSession));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/rrhh/empleados/"))
            .and(header("authorization", "Bearer old"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"detail": "Given token not valid for any token type"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/users/token/refresh/"))
            .and(body_json(serde_json::json!({"refresh": "r1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "new", "refresh": "r2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rrhh/empleados/"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = TokenStore::with_tokens(TokenPair::new("old", "r1"));
        let api = client(&server, tokens.clone());

        let employees: Vec<serde_json::Value> = api.get("/rrhh/empleados/").await.unwrap();
        assert!(employees.is_empty());
        assert_eq!(tokens.get(), Some(TokenPair::new("new", "r2")));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/contabilidad/facturas/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/users/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Token is blacklisted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = TokenStore::with_tokens(TokenPair::new("old", "r1"));
        let api = client(&server, tokens.clone());

        let err = api
            .get::<serde_json::Value>("/contabilidad/facturas/")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(!tokens.is_signed_in());
    }

    #[tokio::test]
    async fn test_expiring_token_refreshed_before_request() {
        let server = MockServer::start().await;
        let fresh = access_token(3600);

        Mock::given(method("POST"))
            .and(path("/api/users/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": fresh.clone()})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/pos/ventas/"))
            .and(header("authorization", format!("Bearer {fresh}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = TokenStore::with_tokens(TokenPair::new(access_token(10), "keep-me"));
        let api = client(&server, tokens.clone());

        let _: Vec<serde_json::Value> = api.get("/pos/ventas/").await.unwrap();
        // Server did not rotate the refresh token.
        assert_eq!(tokens.refresh_token().as_deref(), Some("keep-me"));
    }

    #[tokio::test]
    async fn test_error_body_becomes_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contabilidad/facturas/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"receptor_rfc": ["Este campo es requerido."]}),
            ))
            .mount(&server)
            .await;

        let api = client(&server, TokenStore::with_tokens(TokenPair::new("a", "r")));
        let err = api
            .post::<_, serde_json::Value>("/contabilidad/facturas/", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "receptor_rfc: Este campo es requerido.");
    }

    #[tokio::test]
    async fn test_download_reads_filename_and_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/contabilidad/facturas/12/pdf/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", r#"attachment; filename="F-0012.pdf""#)
                    .set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let api = client(&server, TokenStore::with_tokens(TokenPair::new("a", "r")));
        let file = api
            .download("/contabilidad/facturas/12/pdf/", NO_QUERY)
            .await
            .unwrap();

        assert_eq!(file.filename, "F-0012.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_offline() {
        // Nothing listens on port 9 locally.
        let api = ApiClient::new(
            ApiClientConfig::new("http://127.0.0.1:9/api").timeout(Duration::from_secs(2)),
            TokenStore::with_tokens(TokenPair::new("a", "r")),
        )
        .unwrap();

        let err = api.get::<serde_json::Value>("/pos/ventas/").await.unwrap_err();
        assert!(err.is_offline(), "expected offline error, got {err:?}");
    }
}
