use thiserror::Error;

/// Everything that can go wrong while talking to GitHub on behalf of a session.
#[derive(Debug, Error)]
pub enum GistError {
    /// The request never got a response (DNS, connectivity, timeout).
    #[error("{0}")]
    Network(#[source] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub API error: {status}")]
    Remote { status: u16 },

    /// GitHub answered 2xx but the body was not what we expected.
    #[error("Unexpected response from GitHub: {0}")]
    Decode(#[source] reqwest::Error),

    /// One or more deletes in a bulk delete failed. Only the count is kept.
    #[error("{count} gists failed to delete")]
    DeleteFailed { count: usize },

    #[error("No GitHub token saved. Run `gist-sweep token save` or set GIST_SWEEP_TOKEN")]
    MissingToken,
}

impl GistError {
    /// Status code for `Remote` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            GistError::Remote { status } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_body_error(err: reqwest::Error) -> GistError {
        if err.is_decode() {
            GistError::Decode(err)
        } else {
            GistError::Network(err)
        }
    }
}
