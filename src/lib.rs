pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod token_store;
pub mod util;
pub mod view;

pub use error::GistError;

#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    // Personal access token, needs the `gist` scope
    pub(crate) token: String,
}

impl Credentials {
    pub fn new(token: &str) -> Credentials {
        Credentials {
            token: token.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Keep the token out of `{:?}` output and tracing fields.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &util::mask_token(&self.token))
            .finish()
    }
}
