//! Request clients: plain, and bearer-authenticated with transparent token refresh

use crate::error::{ClientError, Result};
use crate::request::{ApiResponse, PendingRequest};
use crate::session::Session;
use crate::token_store::{self, CredentialStore};
use crate::types::{Envelope, SessionTokens, UpstreamFailure};
use async_singleflight::Group;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Error code the server returns when the access token has expired
pub const DEFAULT_EXPIRED_CODE: &str = "J003";

/// Header carrying the refresh token during a refresh exchange
pub const DEFAULT_REFRESH_HEADER: &str = "refresh";

/// Macro to fail the refresh exchange if the response is not successful
macro_rules! check_refresh_response {
    ($response:expr) => {
        if !$response.is_success() {
            return Err(ClientError::RefreshFailed(format!(
                "refresh exchange failed with status {}: {}",
                $response.status,
                $response.text()
            )));
        }
    };
}

/// Configuration shared by both clients
#[derive(Debug, Clone)]
pub struct AuthClientConfig {
    /// Base URL every request path is resolved against
    pub base_url: Url,

    /// Error code marking an expired access token
    /// Default: "J003"
    pub expired_code: String,

    /// Header the refresh token is sent in during a refresh exchange
    /// Default: "refresh", sent lowercase; header names are case-insensitive,
    /// so the server sees it as `REFRESH`
    pub refresh_header: HeaderName,
}

impl AuthClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            expired_code: DEFAULT_EXPIRED_CODE.to_string(),
            refresh_header: HeaderName::from_static(DEFAULT_REFRESH_HEADER),
        }
    }

    /// Parse the base URL from a string
    pub fn parse(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Configuration(format!("Invalid base URL {base_url:?}: {e}")))?;
        Ok(Self::new(base_url))
    }

    /// Load from the environment
    ///
    /// `BARGUNI_API_URL` is required, `BARGUNI_EXPIRED_CODE` overrides the sentinel.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("BARGUNI_API_URL")
            .map_err(|_| ClientError::Configuration("BARGUNI_API_URL is not set".to_string()))?;

        let config = Self::parse(&base_url)?;
        Ok(match std::env::var("BARGUNI_EXPIRED_CODE") {
            Ok(code) if !code.is_empty() => config.with_expired_code(code),
            _ => config,
        })
    }

    pub fn with_expired_code(mut self, code: impl Into<String>) -> Self {
        self.expired_code = code.into();
        self
    }

    pub fn with_refresh_header(mut self, header: HeaderName) -> Self {
        self.refresh_header = header;
        self
    }

    /// Resolve a request path against the base URL
    ///
    /// Appends rather than using `Url::join`, so a base URL with a path prefix keeps it.
    /// An absolute URL is accepted only on the base URL's origin (scheme, host and port);
    /// credentials are never sent anywhere else.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(path) {
            if absolute.origin() != self.base_url.origin() {
                return Err(ClientError::Configuration(format!(
                    "Request URL {path:?} is outside the base URL {}",
                    self.base_url
                )));
            }
            return Ok(absolute);
        }

        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| ClientError::Configuration(format!("Invalid request URL {raw:?}: {e}")))
    }
}

/// A client that can send Barguni API requests
///
/// Resolves with the response on success; failed responses come back as
/// [`ClientError::Upstream`] (or a more specific error).
pub trait ApiClient: Send + Sync + 'static {
    fn send(&self, request: PendingRequest) -> impl Future<Output = Result<ApiResponse>> + Send;
}

/// Shared request execution: base URL, JSON content type, per-attempt headers
struct Transport {
    config: AuthClientConfig,
    http_client: Client,
}

impl Transport {
    fn new(config: AuthClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Send one attempt of `request`
    ///
    /// `access_token` replaces any bearer header on the request; the refresh
    /// header is present only when `refresh_token` is given.
    async fn execute(
        &self,
        request: &PendingRequest,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = self.config.endpoint_url(&request.path)?;

        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);
        headers.remove(&self.config.refresh_header);
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }
        if let Some(token) = refresh_token {
            headers.insert(
                self.config.refresh_header.clone(),
                HeaderValue::from_str(&format!("Bearer {token}"))?,
            );
        }

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        ApiResponse::read(response).await
    }
}

/// Client for pre-login flows: no auth header, no recovery
pub struct PlainClient {
    transport: Transport,
}

impl PlainClient {
    pub fn new(config: AuthClientConfig) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            transport: Transport::new(config)?,
        }))
    }
}

impl ApiClient for PlainClient {
    async fn send(&self, request: PendingRequest) -> Result<ApiResponse> {
        let response = self.transport.execute(&request, None, None).await?;
        if response.is_success() {
            return Ok(response);
        }

        match response.failure(&self.transport.config.expired_code) {
            UpstreamFailure::Expired => Err(ClientError::TokenExpired),
            UpstreamFailure::Other { .. } => Err(ClientError::Upstream(Box::new(response))),
        }
    }
}

/// Result of one refresh exchange, shared with every waiter of the singleflight group
type RefreshOutcome = std::result::Result<SessionTokens, String>;

/// How many times a waiter rejoins after the refresh it waited on was abandoned
const MAX_REFRESH_JOINS: usize = 2;

/// Authenticated client with transparent token refresh
///
/// Every request carries `Authorization: Bearer <token>` from the session.
/// When the server answers with the expired-token code, the client runs one
/// refresh exchange, persists the new pair, updates the session and retries
/// the original request once.
pub struct AuthClientHttp<S: CredentialStore> {
    transport: Transport,
    store: S,
    session: Arc<Session>,
    /// Singleflight group so concurrent expired requests of one session share a single refresh
    /// The outcome, failure included, is the shared value: only the leader sees the group's error
    token_refresh_singleflight: Group<RefreshOutcome, String>,
}

impl<S: CredentialStore> AuthClientHttp<S> {
    /// Create a new authenticated client
    ///
    /// # Arguments
    /// * `config` - Base URL and wire constants
    /// * `store` - Where the token pair is persisted
    /// * `session` - Holder of the current access token
    pub fn new(config: AuthClientConfig, store: S, session: Arc<Session>) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            transport: Transport::new(config)?,
            store,
            session,
            token_refresh_singleflight: Group::new(),
        }))
    }

    /// Start a session with a freshly issued token pair (after login)
    pub async fn establish(&self, tokens: &SessionTokens) -> Result<()> {
        token_store::save_tokens(&self.store, tokens).await?;
        self.session.set_access_token(tokens.access_token.clone());
        info!(session = %self.session.id(), "Session established");
        Ok(())
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Get the credential store (for advanced usage)
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recover from an expired access token and retry `request` once
    async fn recover(&self, request: &PendingRequest, sent_token: &str) -> Result<ApiResponse> {
        let current = self.session.access_token();
        let fresh_token = if !current.is_empty() && current != sent_token {
            // Another request refreshed while this one was in flight
            debug!(session = %self.session.id(), path = %request.path, "Token already refreshed, retrying");
            current
        } else {
            self.do_refresh_singleflight(request, sent_token).await?
        };

        let retried = self.transport.execute(request, Some(&fresh_token), None).await?;
        if retried.is_success() {
            Ok(retried)
        } else {
            warn!(
                path = %request.path,
                status = %retried.status,
                "Request failed after token refresh"
            );
            Err(ClientError::Upstream(Box::new(retried)))
        }
    }

    async fn do_refresh_singleflight(&self, request: &PendingRequest, sent_token: &str) -> Result<String> {
        // Use singleflight to deduplicate concurrent refreshes of the same session
        let session_key = self.session.id().to_string();

        for attempt in 0..MAX_REFRESH_JOINS {
            let (outcome, _, _) = self
                .token_refresh_singleflight
                .work(&session_key, async {
                    let outcome = match self.do_refresh(request).await {
                        Ok(tokens) => Ok(tokens),
                        Err(e) => {
                            let err_msg = match e {
                                ClientError::RefreshFailed(msg) => msg,
                                other => other.to_string(),
                            };
                            warn!(session = %session_key, error = %err_msg, "Token refresh failed");
                            Err(err_msg)
                        }
                    };
                    Ok::<RefreshOutcome, String>(outcome)
                })
                .await;

            match outcome {
                Some(Ok(tokens)) => return Ok(tokens.access_token),
                Some(Err(err_msg)) => return Err(ClientError::RefreshFailed(err_msg)),
                None => {
                    // The leader was dropped before finishing
                    let current = self.session.access_token();
                    if !current.is_empty() && current != sent_token {
                        return Ok(current);
                    }
                    debug!(session = %session_key, attempt, "In-flight token refresh was abandoned, rejoining");
                }
            }
        }

        Err(ClientError::RefreshFailed(
            "in-flight token refresh was abandoned".to_string(),
        ))
    }

    /// Perform the refresh exchange
    ///
    /// Replays `request` with the stored (stale) access token and the refresh
    /// token, expects `{ data: { accessToken, refreshToken } }`, then persists
    /// the new pair and updates the session.
    async fn do_refresh(&self, request: &PendingRequest) -> Result<SessionTokens> {
        let stored = token_store::load_tokens(&self.store)
            .await
            .map_err(|e| ClientError::RefreshFailed(format!("credential store read failed: {e}")))?
            .ok_or_else(|| ClientError::RefreshFailed("no refresh token stored".to_string()))?;

        debug!(session = %self.session.id(), path = %request.path, "Refreshing access token");

        let response = self
            .transport
            .execute(request, Some(&stored.access_token), Some(&stored.refresh_token))
            .await
            .map_err(|e| ClientError::RefreshFailed(e.to_string()))?;

        check_refresh_response!(response);

        let envelope: Envelope<SessionTokens> = response
            .json()
            .map_err(|e| ClientError::RefreshFailed(format!("malformed refresh response: {e}")))?;
        let tokens = envelope
            .data
            .ok_or_else(|| ClientError::RefreshFailed("refresh response has no tokens".to_string()))?;

        token_store::save_tokens(&self.store, &tokens)
            .await
            .map_err(|e| ClientError::RefreshFailed(format!("credential store write failed: {e}")))?;
        self.session.set_access_token(tokens.access_token.clone());

        info!(session = %self.session.id(), "Access token refreshed successfully");

        Ok(tokens)
    }
}

impl<S: CredentialStore> ApiClient for AuthClientHttp<S> {
    async fn send(&self, request: PendingRequest) -> Result<ApiResponse> {
        let token = self.session.access_token();
        let response = self.transport.execute(&request, Some(&token), None).await?;
        if response.is_success() {
            return Ok(response);
        }

        match response.failure(&self.transport.config.expired_code) {
            UpstreamFailure::Expired => {
                debug!(path = %request.path, "Access token expired");
                self.recover(&request, &token).await
            }
            UpstreamFailure::Other { code } => {
                debug!(
                    path = %request.path,
                    status = %response.status,
                    code = ?code,
                    "Upstream request failed"
                );
                Err(ClientError::Upstream(Box::new(response)))
            }
        }
    }
}
