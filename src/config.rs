//! Runtime configuration, read from the environment.
//!
//! `main` loads `.gist-sweep.env` with `dotenvy` first, so everything here can
//! also live in that file.

use std::env;
use std::path::PathBuf;

use crate::api::GITHUB_API_BASE;

pub const ENV_FILE: &str = ".gist-sweep.env";
pub const API_BASE_VAR: &str = "GIST_SWEEP_API_BASE";
pub const TOKEN_FILE_VAR: &str = "GIST_SWEEP_TOKEN_FILE";
pub const TOKEN_VAR: &str = "GIST_SWEEP_TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    /// Where the token is persisted; `None` means the default location
    pub token_file: Option<PathBuf>,
    /// Token for this run only, takes precedence over the stored one
    pub token_override: Option<String>,
    pub use_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: GITHUB_API_BASE.to_string(),
            token_file: None,
            token_override: None,
            use_color: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            api_base: non_empty(API_BASE_VAR).unwrap_or_else(|| GITHUB_API_BASE.to_string()),
            token_file: non_empty(TOKEN_FILE_VAR).map(PathBuf::from),
            token_override: non_empty(TOKEN_VAR),
            // https://no-color.org: any value disables color
            use_color: lookup("NO_COLOR").is_none(),
        }
    }
}
