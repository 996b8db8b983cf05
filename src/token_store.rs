//! Plaintext token persistence.
//!
//! The token lives in a single file. Reads and writes are best-effort: a
//! missing or unreadable file loads as an empty token, and a failed save is
//! logged rather than returned.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::Credentials;

const APP_DIR: &str = "gist-sweep";
const TOKEN_FILE_NAME: &str = "github_token";
const FALLBACK_FILE_NAME: &str = ".gist-sweep-token";

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> TokenStore {
        TokenStore { path: path.into() }
    }

    /// `<config_dir>/gist-sweep/github_token`, falling back to the home
    /// directory and then the working directory.
    pub fn default_location() -> PathBuf {
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_DIR).join(TOKEN_FILE_NAME);
        }
        match dirs::home_dir() {
            Some(home) => home.join(FALLBACK_FILE_NAME),
            None => PathBuf::from(FALLBACK_FILE_NAME),
        }
    }

    pub fn from_config(config: &Config) -> TokenStore {
        match &config.token_file {
            Some(path) => TokenStore::new(path.clone()),
            None => TokenStore::new(TokenStore::default_location()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Credentials {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Credentials::new(contents.trim_end_matches(['\r', '\n'])),
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no stored token");
                Credentials::default()
            }
        }
    }

    pub fn save(&self, credentials: &Credentials) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %err, "could not create token directory");
                return;
            }
        }
        if let Err(err) = fs::write(&self.path, credentials.token()) {
            warn!(path = %self.path.display(), error = %err, "could not save token");
        }
    }

    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), error = %err, "could not remove token"),
        }
    }
}
