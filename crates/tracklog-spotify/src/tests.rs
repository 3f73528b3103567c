//! Client tests against an in-process fake of the accounts service and the
//! Web API.

use std::{
  collections::HashMap,
  path::PathBuf,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use axum::{
  Form, Json, Router,
  extract::{Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use chrono::{Duration, Utc};
use serde_json::json;
use tokio::net::TcpListener;

use crate::{Error, OAuthConfig, SCOPES, SpotifyClient, Token, TokenCache};

// ─── Fake server ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Fake {
  token_hits:     Arc<AtomicUsize>,
  api_hits:       Arc<AtomicUsize>,
  refresh_sent:   Arc<Mutex<Vec<String>>>,
  token_status:   StatusCode,
  api_status:     StatusCode,
  /// 1-based API hit that answers 401 regardless of `api_status`.
  reject_hit:     Option<usize>,
  rotate_refresh: bool,
}

impl Default for Fake {
  fn default() -> Self {
    Self {
      token_hits:     Arc::default(),
      api_hits:       Arc::default(),
      refresh_sent:   Arc::default(),
      token_status:   StatusCode::OK,
      api_status:     StatusCode::OK,
      reject_hit:     None,
      rotate_refresh: false,
    }
  }
}

async fn token_handler(
  State(fake): State<Fake>,
  headers: HeaderMap,
  Form(form): Form<HashMap<String, String>>,
) -> Response {
  fake.token_hits.fetch_add(1, Ordering::SeqCst);
  if let Some(refresh) = form.get("refresh_token") {
    fake.refresh_sent.lock().unwrap().push(refresh.clone());
  }

  if fake.token_status != StatusCode::OK {
    return (fake.token_status, Json(json!({ "error": "invalid_grant" }))).into_response();
  }
  let has_basic = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.starts_with("Basic "));
  if !has_basic || form.get("grant_type").map(String::as_str) != Some("refresh_token") {
    return (StatusCode::BAD_REQUEST, "bad token request").into_response();
  }

  let mut body = json!({
    "access_token": "fresh-token",
    "token_type": "Bearer",
    "scope": SCOPES.join(" "),
    "expires_in": 3600,
  });
  if fake.rotate_refresh {
    body["refresh_token"] = json!("rotated-refresh");
  }
  Json(body).into_response()
}

async fn recent_handler(
  State(fake): State<Fake>,
  headers: HeaderMap,
  Query(query): Query<HashMap<String, String>>,
) -> Response {
  let hit = fake.api_hits.fetch_add(1, Ordering::SeqCst) + 1;

  if fake.reject_hit == Some(hit) {
    return (StatusCode::UNAUTHORIZED, "token revoked").into_response();
  }
  if fake.api_status != StatusCode::OK {
    return (fake.api_status, "nope").into_response();
  }
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  if bearer != "Bearer fresh-token" && bearer != "Bearer cached-token" {
    return (StatusCode::UNAUTHORIZED, "bad token").into_response();
  }

  let limit: usize = query
    .get("limit")
    .and_then(|l| l.parse().ok())
    .unwrap_or(20);
  let items: Vec<_> = (0..limit.min(2))
    .map(|i| {
      json!({
        "track": {
          "id": format!("track-{i}"),
          "name": format!("Song {i}"),
          "artists": [{ "name": "The Band" }],
        },
        "played_at": format!("2024-05-01T10:0{i}:00.000Z"),
        "context": null,
      })
    })
    .collect();

  Json(json!({
    "items": items,
    "next": null,
    "cursors": { "after": "1714557600000", "before": "1714557000000" },
    "limit": limit,
  }))
  .into_response()
}

async fn serve(fake: Fake) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let app = Router::new()
    .route("/api/token", post(token_handler))
    .route("/v1/me/player/recently-played", get(recent_handler))
    .with_state(fake);
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}")
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn cache_path(name: &str) -> PathBuf {
  let path = std::env::temp_dir().join(format!(
    "tracklog-spotify-{name}-{}.json",
    std::process::id()
  ));
  let _ = std::fs::remove_file(&path);
  path
}

fn oauth() -> OAuthConfig {
  OAuthConfig::new("client-id", "client-secret", "http://127.0.0.1:8888/callback")
}

async fn client(fake: &Fake, cache: &PathBuf) -> SpotifyClient {
  let base = serve(fake.clone()).await;
  SpotifyClient::new(oauth(), "configured-refresh", TokenCache::new(cache))
    .unwrap()
    .with_endpoints(&base, &base)
}

fn cached_token(expires_in: Duration) -> Token {
  Token {
    access_token:  "cached-token".into(),
    token_type:    "Bearer".into(),
    scope:         SCOPES.join(" "),
    expires_at:    Utc::now() + expires_in,
    refresh_token: Some("cached-refresh".into()),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refreshes_once_and_reuses_token() {
  let fake = Fake::default();
  let cache = cache_path("reuse");
  let c = client(&fake, &cache).await;

  let first = c.fetch_recently_played(50).await.unwrap();
  let second = c.fetch_recently_played(5).await.unwrap();

  assert_eq!(first.items.len(), 2);
  assert_eq!(first.limit, Some(50));
  assert_eq!(second.limit, Some(5));
  assert_eq!(first.items[0]["track"]["id"], "track-0");
  assert_eq!(fake.token_hits.load(Ordering::SeqCst), 1);
  assert_eq!(fake.api_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn refreshed_token_is_written_to_cache() {
  let fake = Fake::default();
  let cache = cache_path("write");
  let c = client(&fake, &cache).await;

  c.fetch_recently_played(1).await.unwrap();

  let stored = TokenCache::new(&cache).load().await.unwrap();
  assert_eq!(stored.access_token, "fresh-token");
  assert_eq!(stored.refresh_token.as_deref(), Some("configured-refresh"));
  assert!(!stored.is_expired());
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_old_one() {
  let fake = Fake { rotate_refresh: true, ..Default::default() };
  let cache = cache_path("rotate");
  let c = client(&fake, &cache).await;

  c.fetch_recently_played(1).await.unwrap();

  let stored = TokenCache::new(&cache).load().await.unwrap();
  assert_eq!(stored.refresh_token.as_deref(), Some("rotated-refresh"));
}

#[tokio::test]
async fn valid_cached_token_skips_refresh() {
  let fake = Fake::default();
  let cache = cache_path("valid");
  TokenCache::new(&cache)
    .store(&cached_token(Duration::hours(1)))
    .await
    .unwrap();
  let c = client(&fake, &cache).await;

  c.fetch_recently_played(5).await.unwrap();

  assert_eq!(fake.token_hits.load(Ordering::SeqCst), 0);
  assert_eq!(fake.api_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_cached_token_is_refreshed() {
  let fake = Fake::default();
  let cache = cache_path("expired");
  TokenCache::new(&cache)
    .store(&cached_token(Duration::seconds(30)))
    .await
    .unwrap();
  let c = client(&fake, &cache).await;

  c.fetch_recently_played(5).await.unwrap();

  assert_eq!(fake.token_hits.load(Ordering::SeqCst), 1);
  let stored = TokenCache::new(&cache).load().await.unwrap();
  assert_eq!(stored.access_token, "fresh-token");
  assert_eq!(stored.refresh_token.as_deref(), Some("cached-refresh"));
}

#[tokio::test]
async fn corrupt_cache_reads_as_empty() {
  let cache = cache_path("corrupt");
  std::fs::write(&cache, b"{ not json").unwrap();
  assert!(TokenCache::new(&cache).load().await.is_none());
}

#[tokio::test]
async fn rejected_refresh_is_an_auth_error() {
  let fake = Fake { token_status: StatusCode::BAD_REQUEST, ..Default::default() };
  let cache = cache_path("rejected");
  let c = client(&fake, &cache).await;

  let err = c.fetch_recently_played(50).await.unwrap_err();

  assert!(matches!(err, Error::TokenRefresh { status: 400, .. }));
  assert!(matches!(tracklog_core::Error::from(err), tracklog_core::Error::UpstreamAuth(_)));
  assert_eq!(fake.api_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unauthorized_response_is_an_auth_error() {
  let fake = Fake { api_status: StatusCode::UNAUTHORIZED, ..Default::default() };
  let cache = cache_path("unauthorized");
  let c = client(&fake, &cache).await;

  let err = c.fetch_recently_played(50).await.unwrap_err();

  assert!(matches!(err, Error::Unauthorized { status: 401, .. }));
  assert!(matches!(tracklog_core::Error::from(err), tracklog_core::Error::UpstreamAuth(_)));
}

#[tokio::test]
async fn forbidden_response_is_an_auth_error() {
  let fake = Fake { api_status: StatusCode::FORBIDDEN, ..Default::default() };
  let cache = cache_path("forbidden");
  let c = client(&fake, &cache).await;

  let err = c.fetch_recently_played(50).await.unwrap_err();

  assert!(matches!(err, Error::Unauthorized { status: 403, .. }));
  assert!(matches!(tracklog_core::Error::from(err), tracklog_core::Error::UpstreamAuth(_)));
}

#[tokio::test]
async fn unauthorized_forces_one_refresh_with_latest_refresh_token() {
  let fake = Fake { rotate_refresh: true, reject_hit: Some(2), ..Default::default() };
  let cache = cache_path("reauth");
  let c = client(&fake, &cache).await;

  c.fetch_recently_played(5).await.unwrap();
  let err = c.fetch_recently_played(5).await.unwrap_err();
  assert!(matches!(err, Error::Unauthorized { status: 401, .. }));
  c.fetch_recently_played(5).await.unwrap();

  assert_eq!(fake.token_hits.load(Ordering::SeqCst), 2);
  assert_eq!(fake.api_hits.load(Ordering::SeqCst), 3);
  assert_eq!(
    *fake.refresh_sent.lock().unwrap(),
    ["configured-refresh", "rotated-refresh"]
  );
}

#[tokio::test]
async fn server_error_is_a_request_error() {
  let fake = Fake { api_status: StatusCode::BAD_GATEWAY, ..Default::default() };
  let cache = cache_path("bad-gateway");
  let c = client(&fake, &cache).await;

  let err = c.fetch_recently_played(50).await.unwrap_err();

  assert!(matches!(err, Error::Status { status: 502, .. }));
  assert!(matches!(tracklog_core::Error::from(err), tracklog_core::Error::UpstreamRequest(_)));
}

#[tokio::test]
async fn out_of_range_limit_never_hits_the_network() {
  let fake = Fake::default();
  let cache = cache_path("limit");
  let c = client(&fake, &cache).await;

  assert!(matches!(c.fetch_recently_played(0).await, Err(Error::InvalidLimit(0))));
  assert!(matches!(c.fetch_recently_played(51).await, Err(Error::InvalidLimit(51))));
  assert_eq!(fake.token_hits.load(Ordering::SeqCst), 0);
  assert_eq!(fake.api_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn authorize_url_carries_scopes_and_redirect() {
  let url = oauth()
    .authorize_url("https://accounts.spotify.com/", Some("xyz"))
    .unwrap();

  assert_eq!(url.path(), "/authorize");
  let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
  assert_eq!(params["client_id"], "client-id");
  assert_eq!(params["response_type"], "code");
  assert_eq!(params["redirect_uri"], "http://127.0.0.1:8888/callback");
  assert_eq!(
    params["scope"],
    "user-read-recently-played user-top-read user-library-read"
  );
  assert_eq!(params["state"], "xyz");
}

#[test]
fn debug_output_hides_secrets() {
  let rendered = format!("{:?} {:?}", oauth(), cached_token(Duration::hours(1)));
  assert!(!rendered.contains("client-secret"));
  assert!(!rendered.contains("cached-token"));
  assert!(!rendered.contains("cached-refresh"));
}
