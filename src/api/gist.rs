//! Gist records and the two endpoints we use: list and delete.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::api::GistClient;
use crate::{Credentials, GistError};

const UNTITLED: &str = "Untitled Gist";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GistFile {
    filename: String,
    language: Option<String>,
}

impl GistFile {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Gist {
    id: String,
    description: Option<String>,
    html_url: String,
    files: BTreeMap<String, GistFile>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    public: bool,
}

impl Gist {
    /// Create a new Gist for testing purposes
    #[cfg(test)]
    pub fn new_for_test(id: &str) -> Self {
        let created_at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut files = BTreeMap::new();
        files.insert(
            "notes.md".to_string(),
            GistFile {
                filename: "notes.md".to_string(),
                language: Some("Markdown".to_string()),
            },
        );
        Gist {
            id: id.to_string(),
            description: Some(format!("Gist {}", id)),
            html_url: format!("https://gist.github.com/{}", id),
            files,
            created_at,
            updated_at: created_at,
            public: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Description, or a placeholder when GitHub has none (or an empty one)
    pub fn title(&self) -> &str {
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => desc,
            _ => UNTITLED,
        }
    }

    pub fn html_url(&self) -> &str {
        &self.html_url
    }

    /// Files in filename order
    pub fn files(&self) -> impl Iterator<Item = &GistFile> {
        self.files.values()
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn updated_at(&self) -> &DateTime<Utc> {
        &self.updated_at
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn visibility(&self) -> Visibility {
        if self.public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl GistClient {
    /// Fetch the authenticated user's gists (`GET /gists`).
    ///
    /// Only the first page GitHub returns is read.
    pub async fn list_gists(&self, credentials: &Credentials) -> Result<Vec<Gist>, GistError> {
        let response = self
            .base_request(Method::GET, "/gists", credentials)
            .send()
            .await
            .map_err(GistError::Network)?;

        let status = response.status();
        debug!(status = status.as_u16(), "GET /gists");
        if !status.is_success() {
            return Err(GistError::Remote {
                status: status.as_u16(),
            });
        }

        response
            .json::<Vec<Gist>>()
            .await
            .map_err(GistError::from_body_error)
    }

    /// Delete one gist (`DELETE /gists/{id}`). The response body is ignored.
    pub async fn delete_gist(&self, id: &str, credentials: &Credentials) -> Result<(), GistError> {
        let path = format!("/gists/{}", id);
        let response = self
            .base_request(Method::DELETE, &path, credentials)
            .send()
            .await
            .map_err(GistError::Network)?;

        let status = response.status();
        debug!(gist = id, status = status.as_u16(), "DELETE /gists");
        if !status.is_success() {
            return Err(GistError::Remote {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
