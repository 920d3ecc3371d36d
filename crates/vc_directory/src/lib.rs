//! Client for the user directory API: resolves committer emails to account
//! ids and account ids to public key material.
//!
//! Lookup failures are never fatal; they are logged and reported as "no
//! candidates" so the caller can keep working through other identities.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Environment variable holding the directory bearer credential.
pub const TOKEN_ENV: &str = "PRIVATE_TOKEN";

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct KeyRecord {
    key: Option<String>,
}

pub struct DirectoryClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl DirectoryClient {
    /// A missing or empty token is a configuration error; the client refuses
    /// to be constructed without one.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let token = token
            .filter(|t| !t.is_empty())
            .with_context(|| format!("set {TOKEN_ENV} for directory API authentication"))?;
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_env(base_url: impl Into<String>) -> Result<Self> {
        Self::new(base_url, std::env::var(TOKEN_ENV).ok())
    }

    /// Account ids matching a committer email. Searches the full address
    /// first; when that yields nothing, falls back to the mailbox fragment
    /// before the first `.` (directory search may index display-name
    /// fragments rather than full emails).
    pub fn resolve_user_ids(&self, email: &str) -> Vec<u64> {
        let ids = self.search_user_ids(email);
        if !ids.is_empty() {
            return ids;
        }
        match fallback_search_term(email) {
            Some(term) => {
                debug!(email, term, "retrying directory search with name fragment");
                self.search_user_ids(&term)
            }
            None => ids,
        }
    }

    /// The account's first published key entry, if any.
    pub fn public_key(&self, uid: u64) -> Option<String> {
        let request = self
            .http
            .get(format!("{}/{uid}/gpg_keys", self.base_url))
            .header(TOKEN_HEADER, &self.token);
        match fetch_json::<Vec<KeyRecord>>(request) {
            Ok(keys) => keys.into_iter().next().and_then(|entry| entry.key),
            Err(err) => {
                warn!(uid, error = %err, "key lookup failed");
                None
            }
        }
    }

    fn search_user_ids(&self, term: &str) -> Vec<u64> {
        let request = self
            .http
            .get(format!("{}/", self.base_url))
            .header(TOKEN_HEADER, &self.token)
            .query(&[("search", term)]);
        match fetch_json::<Vec<UserRecord>>(request) {
            Ok(users) => users.into_iter().filter_map(|user| user.id).collect(),
            Err(err) => {
                warn!(term, error = %err, "directory search failed");
                Vec::new()
            }
        }
    }
}

fn fetch_json<T: DeserializeOwned>(request: reqwest::blocking::RequestBuilder) -> Result<T> {
    let response = request.send()?.error_for_status()?;
    Ok(response.json()?)
}

/// Fallback search term for an email: the mailbox local part before the
/// first `.` (`jane.doe@example.org` becomes `jane`).
pub fn fallback_search_term(email: &str) -> Option<String> {
    let mailbox = email.split('@').next()?;
    let fragment = mailbox.split('.').next()?.trim();
    (!fragment.is_empty()).then(|| fragment.to_string())
}
