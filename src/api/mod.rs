use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;

use crate::config::Config;
use crate::Credentials;

pub mod gist;

pub use gist::Gist;
pub use gist::GistFile;
pub use gist::Visibility;

/// Base GitHub API URL, overridable through `GIST_SWEEP_API_BASE`
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "gist-sweep";
const ACCEPT: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around a `reqwest::Client` pointed at one GitHub API host.
#[derive(Debug, Clone)]
pub struct GistClient {
    client: Client,
    base_url: String,
}

impl GistClient {
    pub fn new(base_url: &str) -> GistClient {
        GistClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> GistClient {
        GistClient::new(&config.api_base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn base_request(
        &self,
        method: Method,
        path: &str,
        credentials: &Credentials,
    ) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", credentials.token))
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }
}

impl Default for GistClient {
    fn default() -> Self {
        GistClient::new(GITHUB_API_BASE)
    }
}
