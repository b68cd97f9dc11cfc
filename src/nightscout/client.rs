/// HTTP client for the Nightscout entries endpoint
use futures_util::future::{BoxFuture, FutureExt};
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use super::error::FetchError;
use super::payload::parse_entries;
use crate::config::{Config, CredentialMode};
use crate::models::Reading;
use crate::utils::redact_token;

const ENTRIES_PATH: [&str; 3] = ["api", "v1", "entries.json"];
const SECRET_HEADER: &str = "api-secret";

/// Everything a single fetch attempt needs, captured from the configuration
/// at the moment the attempt starts.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub base_url: String,
    pub credential: String,
    pub credential_mode: CredentialMode,
    pub tls_bypass: bool,
    pub timeout: Duration,
}

impl From<&Config> for FetchRequest {
    fn from(config: &Config) -> Self {
        FetchRequest {
            base_url: config.base_url.clone(),
            credential: config.credential.clone(),
            credential_mode: config.credential_mode,
            tls_bypass: config.tls_bypass,
            timeout: config.request_timeout,
        }
    }
}

/// Source of (current, previous) reading pairs.
///
/// One call is one attempt; implementations never retry.
pub trait Fetch: Send + 'static {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<[Reading; 2], FetchError>>;
}

#[derive(Debug, Clone)]
pub struct NightscoutClient {
    verified: reqwest::Client,
    unverified: reqwest::Client,
}

impl NightscoutClient {
    pub fn new() -> Result<Self, FetchError> {
        let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let verified = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        // Operator opt-in for self-signed deployments
        let unverified = reqwest::Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(NightscoutClient {
            verified,
            unverified,
        })
    }

    /// Fetch the two most recent entries.
    ///
    /// Missing or unparseable settings fail before any network I/O. Any
    /// status other than 200 is an error, as is a body that does not hold
    /// at least two entries.
    pub async fn fetch_entries(&self, request: &FetchRequest) -> Result<[Reading; 2], FetchError> {
        let credential = clean_credential(&request.credential);
        if request.base_url.trim().is_empty() || credential.is_empty() {
            return Err(FetchError::MissingCredentials);
        }

        let url = entries_url(&request.base_url, credential, request.credential_mode)?;
        debug!("Fetching {}", redact_token(url.as_str()));
        if request.tls_bypass {
            debug!("TLS certificate validation is bypassed");
        }

        let client = if request.tls_bypass {
            &self.unverified
        } else {
            &self.verified
        };

        let mut builder = client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(request.timeout);
        if request.credential_mode == CredentialMode::Header {
            builder = builder.header(SECRET_HEADER, credential);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("Nightscout returned status {}", status);
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_entries(&body)
    }
}

impl Fetch for NightscoutClient {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<[Reading; 2], FetchError>> {
        let client = self.clone();
        async move { client.fetch_entries(&request).await }.boxed()
    }
}

/// Strip whitespace and a pasted `token=` / `?token=` / `/?token=` prefix
pub fn clean_credential(credential: &str) -> &str {
    let credential = credential.trim();
    ["/?token=", "?token=", "token="]
        .iter()
        .find_map(|prefix| credential.strip_prefix(prefix))
        .unwrap_or(credential)
}

/// `<base>/api/v1/entries.json?count=2`, plus the token in query mode
pub fn entries_url(base_url: &str, credential: &str, mode: CredentialMode) -> Result<Url, FetchError> {
    let base = base_url.trim().trim_end_matches('/');
    let mut url =
        Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(format!("{}: not a base URL", base)))?
        .pop_if_empty()
        .extend(ENTRIES_PATH);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("count", "2");
        if mode == CredentialMode::Query {
            query.append_pair("token", credential);
        }
    }

    Ok(url)
}
