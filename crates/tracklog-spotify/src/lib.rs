//! Spotify Web API client for tracklog.
//!
//! Covers only what ingestion needs: refreshing an access token from a
//! long-lived refresh token, persisting it to a local cache file, and reading
//! the current user's recently played tracks.

mod auth;
mod client;
mod token;

pub mod error;

pub use auth::{OAuthConfig, SCOPES};
pub use client::{ACCOUNTS_URL, API_URL, SpotifyClient};
pub use error::{Error, Result};
pub use token::{Token, TokenCache};

#[cfg(test)]
mod tests;
