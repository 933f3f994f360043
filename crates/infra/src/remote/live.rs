//! HTTP client for the remote session service.
//!
//! Every endpoint answers with an [`ApiResponse`] envelope. Transport and
//! status failures are classified by [`status_to_error`]; a `success=false`
//! body becomes `RemoteRejected` with the server's message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{RemoteSyncClient, TokenStore};
use cadence_domain::{
    ApiResponse, AuthSession, CadenceError, Leaderboard, LoginRequest, PushBatch, PushReceipt,
    RegisterRequest, RemoteStats, Result, SyncEnvelope,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::{status_to_error, InfraError};
use crate::http::HttpClient;

/// Live backend over HTTP.
pub struct LiveRemoteClient {
    http: HttpClient,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl LiveRemoteClient {
    /// Build a client for `base_url`. A trailing slash is added when missing
    /// so relative endpoint paths resolve beneath it.
    pub fn new(base_url: &str, timeout: Duration, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Self::with_http_client(base_url, http, tokens)
    }

    pub fn with_http_client(
        base_url: &str,
        http: HttpClient,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        Ok(Self { http, base_url: normalize_base_url(base_url)?, tokens })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| CadenceError::InvalidConfig(format!("invalid endpoint {path}: {err}")))
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.tokens.token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send a request and unwrap its envelope. Successful envelopes may omit
    /// `data`; callers decide whether that is an error.
    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>> {
        let response = self.http.send(self.authorize(builder).await?).await?;
        let status = response.status();
        let body = response.text().await.map_err(|err| CadenceError::from(InfraError::from(err)))?;

        let envelope = serde_json::from_str::<ApiResponse<T>>(&body);
        if !status.is_success() {
            let reason = envelope.ok().and_then(|e| e.error);
            return Err(status_to_error(status, reason));
        }

        let envelope = envelope
            .map_err(|err| CadenceError::rejected(format!("malformed response body: {err}")))?;
        if !envelope.success {
            return Err(CadenceError::rejected(
                envelope.error.unwrap_or_else(|| "request rejected by server".to_string()),
            ));
        }
        Ok(envelope.data)
    }

    /// Send a request whose outcome is decided by HTTP status alone.
    async fn call_for_status(&self, builder: RequestBuilder) -> Result<()> {
        let response = self.http.send(self.authorize(builder).await?).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .ok()
            .and_then(|envelope| envelope.error);
        Err(status_to_error(status, reason))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        self.call(self.http.request(Method::GET, url)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        self.call(self.http.request(Method::POST, url).json(body)).await
    }

    async fn post_for_status<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        self.call_for_status(self.http.request(Method::POST, url).json(body)).await
    }

    async fn store_session(&self, session: AuthSession) -> Result<AuthSession> {
        self.tokens.save(&session).await?;
        Ok(session)
    }
}

#[async_trait]
impl RemoteSyncClient for LiveRemoteClient {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let request = LoginRequest { email: email.to_string(), password: password.to_string() };
        let session = required(self.post("auth/login", &request).await?)?;
        self.store_session(session).await
    }

    #[instrument(skip(self, password))]
    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let session = required(self.post("auth/register", &request).await?)?;
        self.store_session(session).await
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<()> {
        let remote = self.post_for_status("auth/logout", &serde_json::json!({})).await;
        self.tokens.clear().await?;
        match remote {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(error = %err, "logout request failed; local credential cleared");
                Err(err)
            }
        }
    }

    #[instrument(skip(self, batch), fields(batch_len = batch.len()))]
    async fn push_sessions(&self, batch: &[SyncEnvelope]) -> Result<PushReceipt> {
        let body = PushBatch { sessions: batch.to_vec() };
        required(self.post("sessions/sync", &body).await?)
    }

    async fn fetch_sessions(&self) -> Result<Vec<SyncEnvelope>> {
        let mut sessions: Vec<SyncEnvelope> = self.get("sessions").await?.unwrap_or_default();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    async fn fetch_stats(&self) -> Result<RemoteStats> {
        required(self.get("stats").await?)
    }

    async fn fetch_leaderboard(&self, limit: usize) -> Result<Leaderboard> {
        required(self.get(&format!("leaderboard?limit={limit}")).await?)
    }

    /// A reachable server that answers without data counts as not ready.
    async fn ping(&self) -> Result<bool> {
        Ok(self.get("ping").await?.unwrap_or(false))
    }

    fn backend_name(&self) -> &'static str {
        "live"
    }
}

fn required<T>(data: Option<T>) -> Result<T> {
    data.ok_or_else(|| CadenceError::rejected("response carried no data"))
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| CadenceError::InvalidConfig(format!("api base url {raw:?}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CadenceError::InvalidConfig(format!(
            "api base url must use http or https, got {}",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
