//! [`SpotifyClient`] — authenticated access to the Web API.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::Mutex;
use tracklog_core::{record::RecentlyPlayedPage, source::PlayHistorySource};

use crate::{
  Error, OAuthConfig, Result,
  token::{Token, TokenCache, TokenResponse},
};

pub const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const API_URL: &str = "https://api.spotify.com";

/// Largest page the recently-played endpoint will serve.
const MAX_LIMIT: u32 = 50;

#[derive(Default)]
struct TokenSlot {
  token:         Option<Token>,
  cache_checked: bool,
}

/// Async client for the parts of the Spotify Web API tracklog uses.
///
/// Access tokens are obtained with the refresh-token grant, kept in memory,
/// and written through to a [`TokenCache`] so later processes can reuse them
/// until they expire.
pub struct SpotifyClient {
  http:          Client,
  oauth:         OAuthConfig,
  refresh_token: String,
  cache:         TokenCache,
  slot:          Mutex<TokenSlot>,
  accounts_url:  String,
  api_url:       String,
}

impl SpotifyClient {
  pub fn new(
    oauth: OAuthConfig,
    refresh_token: impl Into<String>,
    cache: TokenCache,
  ) -> Result<Self> {
    let http = Client::builder()
      .user_agent(concat!("tracklog/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      oauth,
      refresh_token: refresh_token.into(),
      cache,
      slot: Mutex::new(TokenSlot::default()),
      accounts_url: ACCOUNTS_URL.to_owned(),
      api_url: API_URL.to_owned(),
    })
  }

  /// Point the client at different accounts and API hosts.
  pub fn with_endpoints(mut self, accounts_url: &str, api_url: &str) -> Self {
    self.accounts_url = accounts_url.trim_end_matches('/').to_owned();
    self.api_url = api_url.trim_end_matches('/').to_owned();
    self
  }

  pub fn authorize_url(&self, state: Option<&str>) -> Result<Url> {
    self.oauth.authorize_url(&self.accounts_url, state)
  }

  // ── Tokens ────────────────────────────────────────────────────────────────

  /// Return a usable access token, refreshing it if needed.
  async fn access_token(&self) -> Result<String> {
    let mut slot = self.slot.lock().await;

    if slot.token.is_none() && !slot.cache_checked {
      slot.token = self.cache.load().await;
      slot.cache_checked = true;
    }

    if let Some(token) = slot.token.as_ref().filter(|t| !t.is_expired()) {
      return Ok(token.access_token.clone());
    }

    let refresh_token = slot
      .token
      .as_ref()
      .and_then(|t| t.refresh_token.clone())
      .unwrap_or_else(|| self.refresh_token.clone());

    let token = self.refresh(&refresh_token).await?;
    if let Err(e) = self.cache.store(&token).await {
      tracing::warn!(error = %e, "failed to write token cache");
    }

    let access = token.access_token.clone();
    slot.token = Some(token);
    Ok(access)
  }

  /// `POST /api/token` with the refresh-token grant.
  async fn refresh(&self, refresh_token: &str) -> Result<Token> {
    tracing::debug!("refreshing spotify access token");
    let issued_at = Utc::now();

    let resp = self
      .http
      .post(format!("{}/api/token", self.accounts_url))
      .basic_auth(&self.oauth.client_id, Some(&self.oauth.client_secret))
      .form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
      ])
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::TokenRefresh { status: status.as_u16(), body });
    }

    let response: TokenResponse = resp.json().await?;
    Ok(response.into_token(issued_at, refresh_token))
  }

  /// Expire the in-memory access token so the next call refreshes. Its
  /// refresh token is kept, since the accounts service may have rotated it.
  async fn invalidate(&self) {
    let mut slot = self.slot.lock().await;
    if let Some(token) = slot.token.as_mut() {
      token.expires_at = DateTime::<Utc>::MIN_UTC;
    }
    slot.cache_checked = true;
  }

  // ── Endpoints ─────────────────────────────────────────────────────────────

  /// `GET /v1/me/player/recently-played?limit=<limit>`
  pub async fn fetch_recently_played(&self, limit: u32) -> Result<RecentlyPlayedPage> {
    if !(1..=MAX_LIMIT).contains(&limit) {
      return Err(Error::InvalidLimit(limit));
    }

    let token = self.access_token().await?;
    let resp = self
      .http
      .get(format!("{}/v1/me/player/recently-played", self.api_url))
      .query(&[("limit", limit)])
      .bearer_auth(token)
      .send()
      .await?;

    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      if status == StatusCode::UNAUTHORIZED {
        self.invalidate().await;
      }
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Unauthorized { status: status.as_u16(), body });
    }
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status: status.as_u16(), body });
    }

    let page: RecentlyPlayedPage = resp.json().await?;
    tracing::debug!(items = page.items.len(), limit, "fetched recently played page");
    Ok(page)
  }
}

impl PlayHistorySource for SpotifyClient {
  type Error = Error;

  async fn recently_played(&self, limit: u32) -> Result<RecentlyPlayedPage> {
    self.fetch_recently_played(limit).await
  }
}
