//! OAuth client credentials and the authorization-code entry point.

use std::fmt;

use reqwest::Url;

use crate::{Error, Result};

/// Scopes requested when authorising tracklog against a Spotify account.
pub const SCOPES: [&str; 3] = [
  "user-read-recently-played",
  "user-top-read",
  "user-library-read",
];

/// Registered application credentials.
#[derive(Clone)]
pub struct OAuthConfig {
  pub client_id:     String,
  pub client_secret: String,
  pub redirect_url:  String,
  pub scopes:        Vec<String>,
}

impl OAuthConfig {
  pub fn new(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    redirect_url: impl Into<String>,
  ) -> Self {
    Self {
      client_id:     client_id.into(),
      client_secret: client_secret.into(),
      redirect_url:  redirect_url.into(),
      scopes:        SCOPES.iter().map(|s| (*s).to_owned()).collect(),
    }
  }

  /// Space-separated scope list, as the accounts service expects it.
  pub fn scope(&self) -> String { self.scopes.join(" ") }

  /// URL a user visits to grant access and obtain an authorization code.
  pub fn authorize_url(&self, accounts_url: &str, state: Option<&str>) -> Result<Url> {
    let base = format!("{}/authorize", accounts_url.trim_end_matches('/'));
    let scope = self.scope();

    let mut params = vec![
      ("client_id", self.client_id.as_str()),
      ("response_type", "code"),
      ("redirect_uri", self.redirect_url.as_str()),
      ("scope", scope.as_str()),
    ];
    if let Some(state) = state {
      params.push(("state", state));
    }

    Url::parse_with_params(&base, &params).map_err(|e| Error::Url {
      url:    base.clone(),
      reason: e.to_string(),
    })
  }
}

impl fmt::Debug for OAuthConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OAuthConfig")
      .field("client_id", &self.client_id)
      .field("client_secret", &"<redacted>")
      .field("redirect_url", &self.redirect_url)
      .field("scopes", &self.scopes)
      .finish()
  }
}
