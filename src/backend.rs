use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use reqwest::{header::ACCEPT, redirect::Policy};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::HashMap,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tower_http::services::{ServeDir, ServeFile};
use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "dist";
const DEFAULT_GITHUB_USERNAME: &str = "HimanshuJangid2147";
const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com/";
const DEFAULT_EMAILJS_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
const DEFAULT_STATS_CACHE_TTL_SECONDS: u64 = 600;
const STATS_FAILURE_TTL_SECONDS: u64 = 30;
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 6_000;
const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_UPSTREAM_MAX_RESPONSE_BYTES: usize = 256 * 1024;
const DEFAULT_CONTACT_MESSAGE_MAX_CHARS: usize = 5_000;
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

const STATS_CACHE_TTL_SECONDS_BOUNDS: (u64, u64) = (1, 86_400);
const UPSTREAM_TIMEOUT_MS_BOUNDS: (u64, u64) = (100, 120_000);
const UPSTREAM_CONNECT_TIMEOUT_MS_BOUNDS: (u64, u64) = (100, 30_000);
const UPSTREAM_MAX_RESPONSE_BYTES_BOUNDS: (usize, usize) = (1_024, 4 * 1024 * 1024);
const CONTACT_MESSAGE_MAX_CHARS_BOUNDS: (usize, usize) = (100, 50_000);
const CONTACT_FIELD_MAX_CHARS: usize = 200;
const UPSTREAM_MAX_REDIRECTS: usize = 2;
const USER_AGENT: &str = "devfolio-server/1.0";
const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LogLevel {
    Debug,
    Info,
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(level: LogLevel) -> u8 {
            match level {
                LogLevel::Debug => 0,
                LogLevel::Info => 1,
            }
        }

        rank(*self).cmp(&rank(*other))
    }
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }
}

/// EmailJS credentials. All three ids are required for the relay to be enabled.
#[derive(Clone)]
struct MailRelayConfig {
    api_url: Url,
    service_id: String,
    template_id: String,
    public_key: String,
    private_key: Option<String>,
}

#[derive(Clone)]
struct ServerConfig {
    port: u16,
    static_dir: PathBuf,
    github_username: String,
    github_api_base_url: Url,
    stats_cache_ttl_seconds: u64,
    upstream_timeout: Duration,
    upstream_connect_timeout: Duration,
    upstream_max_response_bytes: usize,
    contact_message_max_chars: usize,
    mail_relay: Option<MailRelayConfig>,
    log_level: LogLevel,
}

impl ServerConfig {
    fn from_env() -> Result<Self, &'static str> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let static_dir = parse_env_non_empty_string("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        let github_username = parse_env_non_empty_string("GITHUB_USERNAME")
            .unwrap_or_else(|| DEFAULT_GITHUB_USERNAME.to_string());
        let github_api_base_url = parse_env_http_url("GITHUB_API_BASE_URL")
            .or_else(|| Url::parse(DEFAULT_GITHUB_API_BASE_URL).ok())
            .map(with_trailing_slash)
            .ok_or("invalid GitHub API base URL")?;
        let stats_cache_ttl_seconds = parse_env_u64_with_bounds(
            "STATS_CACHE_TTL_SECONDS",
            DEFAULT_STATS_CACHE_TTL_SECONDS,
            STATS_CACHE_TTL_SECONDS_BOUNDS,
        );
        let upstream_timeout_ms = parse_env_u64_with_bounds(
            "UPSTREAM_TIMEOUT_MS",
            DEFAULT_UPSTREAM_TIMEOUT_MS,
            UPSTREAM_TIMEOUT_MS_BOUNDS,
        );
        let upstream_connect_timeout_ms = parse_env_u64_with_bounds(
            "UPSTREAM_CONNECT_TIMEOUT_MS",
            DEFAULT_UPSTREAM_CONNECT_TIMEOUT_MS,
            UPSTREAM_CONNECT_TIMEOUT_MS_BOUNDS,
        );
        let upstream_max_response_bytes = parse_env_usize_with_bounds(
            "UPSTREAM_MAX_RESPONSE_BYTES",
            DEFAULT_UPSTREAM_MAX_RESPONSE_BYTES,
            UPSTREAM_MAX_RESPONSE_BYTES_BOUNDS,
        );
        let contact_message_max_chars = parse_env_usize_with_bounds(
            "CONTACT_MESSAGE_MAX_CHARS",
            DEFAULT_CONTACT_MESSAGE_MAX_CHARS,
            CONTACT_MESSAGE_MAX_CHARS_BOUNDS,
        );
        let log_level = parse_log_level("LOG_LEVEL", DEFAULT_LOG_LEVEL);

        Ok(Self {
            port,
            static_dir,
            github_username,
            github_api_base_url,
            stats_cache_ttl_seconds,
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            upstream_connect_timeout: Duration::from_millis(upstream_connect_timeout_ms),
            upstream_max_response_bytes,
            contact_message_max_chars,
            mail_relay: MailRelayConfig::from_env(),
            log_level,
        })
    }
}

impl MailRelayConfig {
    fn from_env() -> Option<Self> {
        let service_id = parse_env_non_empty_string("EMAILJS_SERVICE_ID")?;
        let template_id = parse_env_non_empty_string("EMAILJS_TEMPLATE_ID")?;
        let public_key = parse_env_non_empty_string("EMAILJS_PUBLIC_KEY")?;
        let api_url = parse_env_http_url("EMAILJS_API_URL")
            .or_else(|| Url::parse(DEFAULT_EMAILJS_API_URL).ok())?;

        Some(Self {
            api_url,
            service_id,
            template_id,
            public_key,
            private_key: parse_env_non_empty_string("EMAILJS_PRIVATE_KEY"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    stats_cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    stats_refresh: Arc<Mutex<()>>,
    client: reqwest::Client,
    config: Arc<ServerConfig>,
}

/// Failures are kept briefly under the error class so repeat views do not hit GitHub.
type CachedStats = Result<GithubStats, &'static str>;

#[derive(Clone)]
struct CacheEntry {
    expires_at: Instant,
    value: CachedStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GithubStats {
    public_repos: u64,
    followers: u64,
}

#[derive(Deserialize)]
struct GithubProfile {
    public_repos: u64,
    followers: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsPayload {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_repos: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    followers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StatsPayload {
    fn found(stats: GithubStats) -> Self {
        Self {
            ok: true,
            public_repos: Some(stats.public_repos),
            followers: Some(stats.followers),
            error: None,
        }
    }

    fn error(error_class: &str) -> Self {
        Self {
            ok: false,
            public_repos: None,
            followers: None,
            error: Some(error_class.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ContactSubmission {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct ValidatedSubmission {
    name: String,
    email: String,
    message: String,
}

#[derive(Serialize)]
struct ContactPayload {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ContactPayload {
    fn sent() -> Self {
        Self { ok: true, error: None }
    }

    fn error(error_class: &str) -> Self {
        Self {
            ok: false,
            error: Some(error_class.to_string()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct UpstreamFailure {
    error_class: &'static str,
    status_code: Option<u16>,
}

impl UpstreamFailure {
    fn new(error_class: &'static str) -> Self {
        Self {
            error_class,
            status_code: None,
        }
    }

    fn status(status: reqwest::StatusCode) -> Self {
        Self {
            error_class: "upstream_status",
            status_code: Some(status.as_u16()),
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let bind_address = format!("0.0.0.0:{}", config.port);
    let client = build_upstream_client(&config)?;
    let static_service = ServeDir::new(&config.static_dir)
        .not_found_service(ServeFile::new(config.static_dir.join("index.html")));

    let state = AppState {
        stats_cache: Arc::new(RwLock::new(HashMap::new())),
        stats_refresh: Arc::new(Mutex::new(())),
        client,
        config: Arc::new(config),
    };

    log_event(
        &state.config,
        LogLevel::Info,
        "server_config",
        serde_json::json!({
            "static_dir": state.config.static_dir.display().to_string(),
            "github_username": state.config.github_username.as_str(),
            "stats_cache_ttl_seconds": state.config.stats_cache_ttl_seconds,
            "mail_relay_configured": state.config.mail_relay.is_some(),
        }),
    );

    let app = Router::new()
        .route("/api/github-stats", get(get_github_stats))
        .route("/api/contact", post(post_contact))
        .fallback_service(static_service)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log_event(
        &state.config,
        LogLevel::Info,
        "server_listening",
        serde_json::json!({ "url": format!("http://127.0.0.1:{}", state.config.port) }),
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_github_stats(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_started_at = Instant::now();
    let request_id = resolve_request_id(&headers);
    let username = state.config.github_username.clone();

    log_event(
        &state.config,
        LogLevel::Debug,
        "stats_request_start",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "method": method.as_str(),
            "path": uri.path(),
        }),
    );

    let (outcome, memory_cache) = match read_from_cache(&state, &username).await {
        Some(cached) => (cached.map_err(UpstreamFailure::new), "hit"),
        None => refresh_github_stats(&state, &username, &request_id).await,
    };

    match outcome {
        Ok(stats) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "stats_request_complete",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "status": StatusCode::OK.as_u16(),
                    "memory_cache": memory_cache,
                    "duration_ms": request_started_at.elapsed().as_millis(),
                }),
            );
            stats_response(StatusCode::OK, StatsPayload::found(stats), &request_id)
        }
        Err(failure) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "stats_request_failed",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "error_class": failure.error_class,
                    "upstream_status": failure.status_code,
                    "upstream_status_class": failure.status_code.map(status_class_for_code),
                    "memory_cache": memory_cache,
                    "duration_ms": request_started_at.elapsed().as_millis(),
                }),
            );
            stats_response(
                StatusCode::BAD_GATEWAY,
                StatsPayload::error(failure.error_class),
                &request_id,
            )
        }
    }
}

/// Concurrent misses queue on the refresh lock; only the first one reaches GitHub.
async fn refresh_github_stats(
    state: &AppState,
    username: &str,
    request_id: &str,
) -> (Result<GithubStats, UpstreamFailure>, &'static str) {
    let _refresh = state.stats_refresh.lock().await;

    if let Some(cached) = read_from_cache(state, username).await {
        return (cached.map_err(UpstreamFailure::new), "coalesced");
    }

    let outcome = fetch_github_stats(state, username, request_id).await;
    let cached = match &outcome {
        Ok(stats) => Ok(*stats),
        Err(failure) => Err(failure.error_class),
    };
    write_to_cache(state, username.to_string(), cached).await;
    (outcome, "miss")
}

async fn post_contact(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    submission: Result<Json<ContactSubmission>, JsonRejection>,
) -> impl IntoResponse {
    let request_started_at = Instant::now();
    let request_id = resolve_request_id(&headers);

    log_event(
        &state.config,
        LogLevel::Debug,
        "contact_request_start",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "method": method.as_str(),
            "path": uri.path(),
        }),
    );

    let validated = submission
        .map_err(|_| "invalid_payload")
        .and_then(|Json(submission)| {
            validate_submission(submission, state.config.contact_message_max_chars)
        });
    let validated = match validated {
        Ok(validated) => validated,
        Err(error_class) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "contact_request_rejected",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "error_class": error_class,
                }),
            );
            return contact_response(
                StatusCode::BAD_REQUEST,
                ContactPayload::error(error_class),
                &request_id,
            );
        }
    };

    let Some(relay) = state.config.mail_relay.as_ref() else {
        log_event(
            &state.config,
            LogLevel::Info,
            "contact_request_failed",
            serde_json::json!({
                "request_id": request_id.as_str(),
                "error_class": "relay_unconfigured",
            }),
        );
        return contact_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ContactPayload::error("relay_unconfigured"),
            &request_id,
        );
    };

    match forward_to_mail_relay(&state.client, relay, &validated, &request_id).await {
        Ok(()) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "contact_request_complete",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "status": StatusCode::OK.as_u16(),
                    "message_chars": validated.message.chars().count(),
                    "duration_ms": request_started_at.elapsed().as_millis(),
                }),
            );
            contact_response(StatusCode::OK, ContactPayload::sent(), &request_id)
        }
        Err(failure) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "contact_request_failed",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "error_class": failure.error_class,
                    "upstream_status": failure.status_code,
                    "upstream_status_class": failure.status_code.map(status_class_for_code),
                    "duration_ms": request_started_at.elapsed().as_millis(),
                }),
            );
            contact_response(
                StatusCode::BAD_GATEWAY,
                ContactPayload::error(failure.error_class),
                &request_id,
            )
        }
    }
}

fn validate_submission(
    submission: ContactSubmission,
    message_max_chars: usize,
) -> Result<ValidatedSubmission, &'static str> {
    let name = submission.name.trim().to_string();
    let email = submission.email.trim().to_string();
    let message = submission.message.trim().to_string();

    if name.is_empty() {
        return Err("missing_name");
    }
    if email.is_empty() {
        return Err("missing_email");
    }
    if message.is_empty() {
        return Err("missing_message");
    }
    if name.chars().count() > CONTACT_FIELD_MAX_CHARS || email.chars().count() > CONTACT_FIELD_MAX_CHARS {
        return Err("field_too_long");
    }
    if !is_plausible_email(&email) {
        return Err("invalid_email");
    }
    if message.chars().count() > message_max_chars {
        return Err("message_too_long");
    }

    Ok(ValidatedSubmission {
        name,
        email,
        message,
    })
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
}

fn relay_request_body(relay: &MailRelayConfig, submission: &ValidatedSubmission) -> serde_json::Value {
    let mut body = serde_json::json!({
        "service_id": relay.service_id.as_str(),
        "template_id": relay.template_id.as_str(),
        "user_id": relay.public_key.as_str(),
        "template_params": submission,
    });

    if let (Some(private_key), serde_json::Value::Object(fields)) =
        (relay.private_key.as_deref(), &mut body)
    {
        fields.insert(
            "accessToken".to_string(),
            serde_json::Value::String(private_key.to_string()),
        );
    }

    body
}

/// Single attempt; the page reports failure and the visitor decides whether to resend.
async fn forward_to_mail_relay(
    client: &reqwest::Client,
    relay: &MailRelayConfig,
    submission: &ValidatedSubmission,
    request_id: &str,
) -> Result<(), UpstreamFailure> {
    let response = client
        .post(relay.api_url.clone())
        .header(REQUEST_ID_HEADER, request_id)
        .json(&relay_request_body(relay, submission))
        .send()
        .await
        .map_err(|error| {
            if error.is_timeout() {
                UpstreamFailure::new("upstream_timeout")
            } else {
                UpstreamFailure::new("upstream_unreachable")
            }
        })?;

    if !response.status().is_success() {
        return Err(UpstreamFailure::status(response.status()));
    }

    Ok(())
}

async fn fetch_github_stats(
    state: &AppState,
    username: &str,
    request_id: &str,
) -> Result<GithubStats, UpstreamFailure> {
    let profile_url = state
        .config
        .github_api_base_url
        .join(&format!("users/{username}"))
        .map_err(|_| UpstreamFailure::new("invalid_upstream_url"))?;

    log_event(
        &state.config,
        LogLevel::Debug,
        "stats_upstream_fetch",
        serde_json::json!({
            "request_id": request_id,
            "url": profile_url.as_str(),
        }),
    );

    let response = state
        .client
        .get(profile_url)
        .header(ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(|error| {
            if error.is_timeout() {
                UpstreamFailure::new("upstream_timeout")
            } else {
                UpstreamFailure::new("upstream_unreachable")
            }
        })?;

    if !response.status().is_success() {
        return Err(UpstreamFailure::status(response.status()));
    }

    let body = read_limited_body(response, state.config.upstream_max_response_bytes)
        .await
        .map_err(UpstreamFailure::new)?;
    let profile: GithubProfile =
        serde_json::from_str(&body).map_err(|_| UpstreamFailure::new("invalid_upstream_payload"))?;

    Ok(GithubStats {
        public_repos: profile.public_repos,
        followers: profile.followers,
    })
}

async fn read_limited_body(
    response: reqwest::Response,
    max_response_bytes: usize,
) -> Result<String, &'static str> {
    let mut stream = response.bytes_stream();
    let mut body: Vec<u8> = Vec::with_capacity(8192);

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|_| "upstream_body_read_failed")?;

        if body.len() + chunk.len() > max_response_bytes {
            return Err("upstream_body_too_large");
        }

        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).to_string())
}

fn build_upstream_client(config: &ServerConfig) -> Result<reqwest::Client, &'static str> {
    reqwest::Client::builder()
        .redirect(Policy::limited(UPSTREAM_MAX_REDIRECTS))
        .timeout(config.upstream_timeout)
        .connect_timeout(config.upstream_connect_timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|_| "failed to prepare upstream client")
}

async fn read_from_cache(state: &AppState, key: &str) -> Option<CachedStats> {
    let now = Instant::now();
    {
        let cache = state.stats_cache.read().await;
        let entry = cache.get(key)?;

        if entry.expires_at > now {
            return Some(entry.value);
        }
    }

    let mut cache = state.stats_cache.write().await;
    purge_expired_entries(&mut cache, now);
    None
}

async fn write_to_cache(state: &AppState, key: String, value: CachedStats) {
    let now = Instant::now();
    let ttl_seconds = match value {
        Ok(_) => state.config.stats_cache_ttl_seconds,
        Err(_) => STATS_FAILURE_TTL_SECONDS.min(state.config.stats_cache_ttl_seconds),
    };
    let mut cache = state.stats_cache.write().await;

    purge_expired_entries(&mut cache, now);
    cache.insert(
        key,
        CacheEntry {
            expires_at: now + Duration::from_secs(ttl_seconds),
            value,
        },
    );
}

fn purge_expired_entries(cache: &mut HashMap<String, CacheEntry>, now: Instant) {
    cache.retain(|_, entry| entry.expires_at > now);
}

fn stats_response(
    status: StatusCode,
    payload: StatsPayload,
    request_id: &str,
) -> axum::response::Response {
    let cache_control = if payload.ok {
        HeaderValue::from_static("public, max-age=300")
    } else {
        HeaderValue::from_static("no-store")
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, cache_control);
    response_with_request_id(status, headers, Json(payload), request_id)
}

fn contact_response(
    status: StatusCode,
    payload: ContactPayload,
    request_id: &str,
) -> axum::response::Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response_with_request_id(status, headers, Json(payload), request_id)
}

fn parse_u64_with_bounds(raw: Option<&str>, default: u64, bounds: (u64, u64)) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_usize_with_bounds(raw: Option<&str>, default: usize, bounds: (usize, usize)) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_env_u64_with_bounds(name: &str, default: u64, bounds: (u64, u64)) -> u64 {
    parse_u64_with_bounds(std::env::var(name).ok().as_deref(), default, bounds)
}

fn parse_env_usize_with_bounds(name: &str, default: usize, bounds: (usize, usize)) -> usize {
    parse_usize_with_bounds(std::env::var(name).ok().as_deref(), default, bounds)
}

fn parse_env_non_empty_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_http_url(value: &str) -> Option<Url> {
    let parsed = Url::parse(value.trim()).ok()?;

    if parsed.scheme() == "http" || parsed.scheme() == "https" {
        Some(parsed)
    } else {
        None
    }
}

fn parse_env_http_url(name: &str) -> Option<Url> {
    parse_http_url(&parse_env_non_empty_string(name)?)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_log_level(name: &str, default: LogLevel) -> LogLevel {
    match parse_env_non_empty_string(name)
        .unwrap_or_else(|| default.as_str().to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        _ => default,
    }
}

fn now_unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis())
        .unwrap_or(0)
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

fn generate_request_id() -> String {
    let counter = REQUEST_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    format!("req-{}-{counter}", now_unix_millis())
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    let value = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|raw| raw.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);

    value.unwrap_or_else(generate_request_id)
}

fn response_with_request_id(
    status: StatusCode,
    mut headers: HeaderMap,
    payload: impl IntoResponse,
    request_id: &str,
) -> axum::response::Response {
    if let Ok(request_id_header) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, request_id_header);
    }
    (status, headers, payload).into_response()
}

fn status_class_for_code(code: u16) -> &'static str {
    match code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}

fn log_event(config: &ServerConfig, level: LogLevel, event: &str, fields: serde_json::Value) {
    if level < config.log_level {
        return;
    }

    let mut payload = serde_json::Map::new();
    payload.insert(
        "ts".to_string(),
        serde_json::Value::Number(serde_json::Number::from(now_unix_seconds())),
    );
    payload.insert("level".to_string(), serde_json::Value::String(level.as_str().to_string()));
    payload.insert("event".to_string(), serde_json::Value::String(event.to_string()));

    if let serde_json::Value::Object(extra) = fields {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }

    println!("{}", serde_json::Value::Object(payload));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn test_config(mail_relay: Option<MailRelayConfig>) -> ServerConfig {
        ServerConfig {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            github_username: "octocat".to_string(),
            github_api_base_url: Url::parse("http://127.0.0.1:9/").expect("valid URL"),
            stats_cache_ttl_seconds: DEFAULT_STATS_CACHE_TTL_SECONDS,
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
            upstream_connect_timeout: Duration::from_millis(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_MS),
            upstream_max_response_bytes: DEFAULT_UPSTREAM_MAX_RESPONSE_BYTES,
            contact_message_max_chars: DEFAULT_CONTACT_MESSAGE_MAX_CHARS,
            mail_relay,
            log_level: LogLevel::Info,
        }
    }

    fn test_relay(private_key: Option<&str>) -> MailRelayConfig {
        MailRelayConfig {
            api_url: Url::parse(DEFAULT_EMAILJS_API_URL).expect("valid URL"),
            service_id: "service_abc".to_string(),
            template_id: "template_xyz".to_string(),
            public_key: "public-key".to_string(),
            private_key: private_key.map(ToString::to_string),
        }
    }

    fn test_state(mail_relay: Option<MailRelayConfig>) -> AppState {
        state_with_config(test_config(mail_relay))
    }

    fn state_with_config(config: ServerConfig) -> AppState {
        AppState {
            stats_cache: Arc::new(RwLock::new(HashMap::new())),
            stats_refresh: Arc::new(Mutex::new(())),
            // Local upstreams must not be routed through any proxy from the environment.
            client: reqwest::Client::builder()
                .no_proxy()
                .timeout(config.upstream_timeout)
                .build()
                .expect("client builds"),
            config: Arc::new(config),
        }
    }

    /// Serves `app` on an ephemeral local port and returns its base URL with a trailing slash.
    async fn spawn_upstream(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local upstream");
        let address = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Url::parse(&format!("http://{address}/")).expect("valid URL")
    }

    fn github_at(base_url: Url) -> ServerConfig {
        ServerConfig {
            github_api_base_url: base_url,
            ..test_config(None)
        }
    }

    fn relay_at(api_url: Url) -> MailRelayConfig {
        MailRelayConfig {
            api_url,
            ..test_relay(None)
        }
    }

    async fn request_stats(state: &AppState) -> axum::response::Response {
        get_github_stats(
            State(state.clone()),
            Method::GET,
            Uri::from_static("/api/github-stats"),
            HeaderMap::new(),
        )
        .await
        .into_response()
    }

    fn submission(name: &str, email: &str, message: &str) -> ContactSubmission {
        ContactSubmission {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn bounded_values_fall_back_to_default() {
        assert_eq!(parse_u64_with_bounds(Some(" 120 "), 600, (1, 86_400)), 120);
        assert_eq!(parse_u64_with_bounds(Some("0"), 600, (1, 86_400)), 600);
        assert_eq!(parse_u64_with_bounds(Some("soon"), 600, (1, 86_400)), 600);
        assert_eq!(parse_u64_with_bounds(None, 600, (1, 86_400)), 600);
        assert_eq!(parse_usize_with_bounds(Some("99"), 5_000, (100, 50_000)), 5_000);
    }

    #[test]
    fn only_http_urls_are_accepted() {
        assert!(parse_http_url("https://api.github.com").is_some());
        assert!(parse_http_url("ftp://example.com").is_none());
        assert!(parse_http_url("not a url").is_none());
    }

    #[test]
    fn base_url_join_keeps_path_prefix() {
        let base = with_trailing_slash(Url::parse("http://localhost:3000/github").expect("valid URL"));
        let joined = base.join("users/octocat").expect("joins");
        assert_eq!(joined.as_str(), "http://localhost:3000/github/users/octocat");
    }

    #[test]
    fn submission_fields_are_trimmed() {
        let validated = validate_submission(
            submission("  Ada ", " ada@example.com ", "\nHello there\n"),
            DEFAULT_CONTACT_MESSAGE_MAX_CHARS,
        )
        .expect("valid submission");

        assert_eq!(
            validated,
            ValidatedSubmission {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                message: "Hello there".to_string(),
            }
        );
    }

    #[test]
    fn blank_or_malformed_submissions_are_rejected() {
        let max = DEFAULT_CONTACT_MESSAGE_MAX_CHARS;
        assert_eq!(validate_submission(submission(" ", "a@b.c", "hi"), max), Err("missing_name"));
        assert_eq!(validate_submission(submission("Ada", "", "hi"), max), Err("missing_email"));
        assert_eq!(validate_submission(submission("Ada", "a@b.c", "   "), max), Err("missing_message"));
        assert_eq!(validate_submission(submission("Ada", "ada.example.com", "hi"), max), Err("invalid_email"));
        assert_eq!(validate_submission(submission("Ada", "a@@b", "hi"), max), Err("invalid_email"));
        assert_eq!(
            validate_submission(submission("Ada", "a@b.c", &"x".repeat(101)), 100),
            Err("message_too_long")
        );
        assert_eq!(
            validate_submission(submission(&"n".repeat(201), "a@b.c", "hi"), max),
            Err("field_too_long")
        );
    }

    #[test]
    fn relay_body_carries_template_params_and_optional_token() {
        let validated = ValidatedSubmission {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            message: "Hello".to_string(),
        };

        let without_token = relay_request_body(&test_relay(None), &validated);
        assert_eq!(without_token["service_id"], "service_abc");
        assert_eq!(without_token["template_id"], "template_xyz");
        assert_eq!(without_token["user_id"], "public-key");
        assert_eq!(without_token["template_params"]["email"], "ada@example.com");
        assert!(without_token.get("accessToken").is_none());

        let with_token = relay_request_body(&test_relay(Some("secret")), &validated);
        assert_eq!(with_token["accessToken"], "secret");
    }

    #[test]
    fn request_id_is_propagated_or_generated() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(" abc-123 "));
        assert_eq!(resolve_request_id(&headers), "abc-123");

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("   "));
        assert!(resolve_request_id(&headers).starts_with("req-"));
    }

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(status_class_for_code(404), "4xx");
        assert_eq!(status_class_for_code(503), "5xx");
        assert_eq!(status_class_for_code(42), "unknown");
    }

    #[tokio::test]
    async fn cached_stats_expire_after_ttl() {
        let state = test_state(None);
        let stats = GithubStats {
            public_repos: 12,
            followers: 34,
        };

        write_to_cache(&state, "octocat".to_string(), Ok(stats)).await;
        assert_eq!(read_from_cache(&state, "octocat").await, Some(Ok(stats)));

        {
            let mut cache = state.stats_cache.write().await;
            if let Some(entry) = cache.get_mut("octocat") {
                entry.expires_at = Instant::now() - Duration::from_secs(1);
            }
        }

        assert_eq!(read_from_cache(&state, "octocat").await, None);
        assert!(state.stats_cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn stats_endpoint_serves_cached_profile() {
        let state = test_state(None);
        write_to_cache(
            &state,
            "octocat".to_string(),
            Ok(GithubStats {
                public_repos: 8,
                followers: 21,
            }),
        )
        .await;

        let response = request_stats(&state).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["publicRepos"], 8);
        assert_eq!(body["followers"], 21);
    }

    #[tokio::test]
    async fn invalid_contact_submission_is_a_bad_request() {
        let response = post_contact(
            State(test_state(Some(test_relay(None)))),
            Method::POST,
            Uri::from_static("/api/contact"),
            HeaderMap::new(),
            Ok(Json(submission("Ada", "nope", "hi"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "invalid_email");
    }

    #[tokio::test]
    async fn contact_without_relay_credentials_is_unavailable() {
        let response = post_contact(
            State(test_state(None)),
            Method::POST,
            Uri::from_static("/api/contact"),
            HeaderMap::new(),
            Ok(Json(submission("Ada", "ada@example.com", "hi"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "relay_unconfigured");
    }

    #[tokio::test]
    async fn failures_are_cached_for_less_time_than_profiles() {
        let state = test_state(None);
        write_to_cache(&state, "octocat".to_string(), Err("upstream_timeout")).await;

        let cache = state.stats_cache.read().await;
        let entry = cache.get("octocat").expect("failure cached");
        let remaining = entry.expires_at - Instant::now();
        assert!(remaining <= Duration::from_secs(STATS_FAILURE_TTL_SECONDS));
        assert_eq!(entry.value, Err("upstream_timeout"));
    }

    #[tokio::test]
    async fn stats_endpoint_fetches_and_caches_the_profile() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let upstream = Router::new().route(
            "/users/octocat",
            get(move |headers: HeaderMap| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, AtomicOrdering::SeqCst);
                    assert_eq!(
                        headers.get(header::ACCEPT).and_then(|value| value.to_str().ok()),
                        Some("application/vnd.github+json")
                    );
                    Json(serde_json::json!({ "login": "octocat", "public_repos": 12, "followers": 34 }))
                }
            }),
        );
        let state = state_with_config(github_at(spawn_upstream(upstream).await));

        let first = request_stats(&state).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("public, max-age=300"))
        );
        let body = body_json(first).await;
        assert_eq!(body["publicRepos"], 12);
        assert_eq!(body["followers"], 34);

        let second = request_stats(&state).await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_cold_requests_share_one_upstream_fetch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let upstream = Router::new().route(
            "/users/octocat",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, AtomicOrdering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Json(serde_json::json!({ "public_repos": 5, "followers": 8 }))
                }
            }),
        );
        let state = state_with_config(github_at(spawn_upstream(upstream).await));

        let responses =
            futures_util::future::join_all((0..5).map(|_| request_stats(&state))).await;

        assert!(responses
            .iter()
            .all(|response| response.status() == StatusCode::OK));
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_profile_is_a_bad_gateway_and_is_not_refetched() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let upstream = Router::new().fallback(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
                StatusCode::NOT_FOUND
            }
        });
        let state = state_with_config(github_at(spawn_upstream(upstream).await));

        let first = request_stats(&state).await;
        assert_eq!(first.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            first.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        assert_eq!(body_json(first).await["error"], "upstream_status");

        let second = request_stats(&state).await;
        assert_eq!(second.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(second).await["error"], "upstream_status");
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_json_profile_is_an_invalid_payload() {
        let upstream = Router::new().route(
            "/users/octocat",
            get(|| async { "<html>rate limited</html>" }),
        );
        let state = state_with_config(github_at(spawn_upstream(upstream).await));

        let response = request_stats(&state).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "invalid_upstream_payload");
    }

    #[tokio::test]
    async fn oversized_profile_is_rejected() {
        let padding = "x".repeat(4 * 1024);
        let upstream = Router::new().route(
            "/users/octocat",
            get(move || {
                let padding = padding.clone();
                async move {
                    Json(serde_json::json!({ "public_repos": 1, "followers": 2, "bio": padding }))
                }
            }),
        );
        let config = ServerConfig {
            upstream_max_response_bytes: UPSTREAM_MAX_RESPONSE_BYTES_BOUNDS.0,
            ..github_at(spawn_upstream(upstream).await)
        };
        let state = state_with_config(config);

        let response = request_stats(&state).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "upstream_body_too_large");
    }

    #[tokio::test]
    async fn accepted_submission_is_forwarded_to_the_relay() {
        let received = Arc::new(RwLock::new(None));
        let sink = received.clone();
        let upstream = Router::new().route(
            "/email/send",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    *sink.write().await = Some(body);
                    "OK"
                }
            }),
        );
        let base_url = spawn_upstream(upstream).await;
        let relay = relay_at(base_url.join("email/send").expect("relay URL"));

        let response = post_contact(
            State(test_state(Some(relay))),
            Method::POST,
            Uri::from_static("/api/contact"),
            HeaderMap::new(),
            Ok(Json(submission(" Ada ", "ada@example.com", "Hello there"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
        let forwarded = received.read().await.clone().expect("relay called");
        assert_eq!(forwarded["service_id"], "service_abc");
        assert_eq!(forwarded["template_params"]["name"], "Ada");
    }

    #[tokio::test]
    async fn relay_rejection_is_a_bad_gateway() {
        let upstream = Router::new().route(
            "/email/send",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base_url = spawn_upstream(upstream).await;
        let relay = relay_at(base_url.join("email/send").expect("relay URL"));

        let response = post_contact(
            State(test_state(Some(relay))),
            Method::POST,
            Uri::from_static("/api/contact"),
            HeaderMap::new(),
            Ok(Json(submission("Ada", "ada@example.com", "Hello there"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "upstream_status");
    }
}
