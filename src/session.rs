//! In-memory gist session: the loaded collection, the selection, and the
//! bulk delete.
//!
//! ## Bulk delete
//!
//! Deletes for every selected gist are issued together and joined with
//! `futures::join_all`. Nothing is mutated until every request has settled;
//! then a single pass removes the gists that were deleted and clears the
//! selection. A failed delete never cancels the others.

use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::api::{Gist, GistClient};
use crate::{Credentials, GistError};

/// Result of a bulk delete where every request settled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Outcome of one delete request. Terminal, never retried.
#[derive(Debug)]
enum DeleteOutcome {
    Succeeded(String),
    Failed(String, GistError),
}

/// Sets the loading flag and clears it on drop, so a cancelled fetch or
/// delete still resets it.
struct LoadingGuard<'a>(&'a mut bool);

impl<'a> LoadingGuard<'a> {
    fn new(flag: &'a mut bool) -> LoadingGuard<'a> {
        *flag = true;
        LoadingGuard(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug)]
pub struct GistSession {
    client: GistClient,
    gists: Vec<Gist>,
    selection: HashSet<String>,
    loading: bool,
}

impl GistSession {
    pub fn new(client: GistClient) -> GistSession {
        GistSession {
            client,
            gists: Vec::new(),
            selection: HashSet::new(),
            loading: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_gists(client: GistClient, gists: Vec<Gist>) -> GistSession {
        GistSession {
            gists,
            ..GistSession::new(client)
        }
    }

    pub fn gists(&self) -> &[Gist] {
        &self.gists
    }

    pub fn selection(&self) -> &HashSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Selected gists, in collection order
    pub fn selected_gists(&self) -> impl Iterator<Item = &Gist> {
        self.gists.iter().filter(move |g| self.is_selected(g.id()))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the collection with whatever GitHub returns.
    ///
    /// On failure the current collection and selection are left as they were.
    pub async fn fetch_all(&mut self, credentials: &Credentials) -> Result<usize, GistError> {
        if credentials.is_empty() {
            return Err(GistError::MissingToken);
        }

        let loading = LoadingGuard::new(&mut self.loading);
        let result = self.client.list_gists(credentials).await;
        drop(loading);

        let gists = result?;
        info!(count = gists.len(), "fetched gists");
        self.gists = gists;
        self.selection.clear();
        Ok(self.gists.len())
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.selection = self.gists.iter().map(|g| g.id().to_string()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Add every id that names a loaded gist to the selection.
    ///
    /// Returns the ids that matched nothing in the collection.
    pub fn select_ids<I, S>(&mut self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unknown = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if self.gists.iter().any(|g| g.id() == id) {
                self.selection.insert(id.to_string());
            } else {
                unknown.push(id.to_string());
            }
        }
        unknown
    }

    /// Delete every selected gist concurrently.
    ///
    /// Deleted gists leave the collection; failed ones stay. The selection is
    /// cleared either way. Any failure is reported as a single
    /// `GistError::DeleteFailed` carrying only the number of failures.
    pub async fn delete_selected(
        &mut self,
        credentials: &Credentials,
    ) -> Result<DeleteReport, GistError> {
        if self.selection.is_empty() {
            return Ok(DeleteReport::default());
        }
        if credentials.is_empty() {
            return Err(GistError::MissingToken);
        }

        let loading = LoadingGuard::new(&mut self.loading);

        let client = &self.client;
        let futures = self.selection.iter().map(|id| async move {
            match client.delete_gist(id, credentials).await {
                Ok(()) => DeleteOutcome::Succeeded(id.clone()),
                Err(err) => DeleteOutcome::Failed(id.clone(), err),
            }
        });
        let outcomes = join_all(futures.collect::<Vec<_>>()).await;

        let mut report = DeleteReport::default();
        for outcome in outcomes {
            match outcome {
                DeleteOutcome::Succeeded(id) => {
                    debug!(gist = %id, "deleted");
                    report.deleted.push(id);
                }
                DeleteOutcome::Failed(id, err) => {
                    debug!(gist = %id, error = %err, "delete failed");
                    report.failed.push(id);
                }
            }
        }

        let deleted: HashSet<&str> = report.deleted.iter().map(String::as_str).collect();
        self.gists.retain(|g| !deleted.contains(g.id()));
        self.selection.clear();
        drop(loading);

        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "bulk delete settled"
        );

        if report.failed.is_empty() {
            Ok(report)
        } else {
            Err(GistError::DeleteFailed {
                count: report.failed.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gist::tests::gist_json;
    use mockito::Server;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    fn ids(session: &GistSession) -> Vec<&str> {
        session.gists().iter().map(|g| g.id()).collect()
    }

    /// HTTP server that answers 204 only once `expected` requests are open
    /// at the same time. Returns its base URL.
    fn spawn_barrier_server(expected: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let barrier = Arc::new(Barrier::new(expected));

        thread::spawn(move || {
            for stream in listener.incoming().take(expected) {
                let mut stream = stream.unwrap();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    let mut line = String::new();
                    loop {
                        line.clear();
                        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                            break;
                        }
                    }
                    barrier.wait();
                    stream
                        .write_all(b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n")
                        .unwrap();
                });
            }
        });

        format!("http://{}", addr)
    }

    fn loaded(names: &[&str]) -> GistSession {
        let gists = names.iter().map(|id| Gist::new_for_test(id)).collect();
        GistSession::with_gists(GistClient::default(), gists)
    }

    #[test]
    fn test_toggle_twice_leaves_selection_empty() {
        let mut session = loaded(&["a"]);

        session.toggle_selection("a");
        assert!(session.is_selected("a"));
        session.toggle_selection("a");

        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_select_all_then_clear() {
        let mut session = loaded(&["a", "b", "c"]);

        session.select_all();
        assert_eq!(session.selected_count(), session.gists().len());

        session.clear_selection();
        assert_eq!(session.selected_count(), 0);
    }

    #[test]
    fn test_select_all_on_empty_collection() {
        let mut session = loaded(&[]);
        session.select_all();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_select_ids_reports_unknown() {
        let mut session = loaded(&["a", "b"]);

        let unknown = session.select_ids(["b", "zzz"]);

        assert_eq!(unknown, vec!["zzz".to_string()]);
        assert!(session.is_selected("b"));
        assert_eq!(session.selected_count(), 1);
    }

    #[test]
    fn test_selected_gists_follow_collection_order() {
        let mut session = loaded(&["a", "b", "c"]);
        session.toggle_selection("c");
        session.toggle_selection("a");

        let selected: Vec<_> = session.selected_gists().map(|g| g.id()).collect();
        assert_eq!(selected, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_fetch_all_replaces_collection_and_clears_selection() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/gists")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([gist_json("x"), gist_json("y")]).to_string())
            .create_async()
            .await;

        let mut session = loaded(&["old"]);
        session.client = GistClient::new(&server.url());
        session.toggle_selection("old");

        let count = session.fetch_all(&Credentials::new("t")).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(ids(&session), vec!["x", "y"]);
        assert!(session.selection().is_empty());
        assert!(!session.is_loading());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_all_unauthorized_keeps_prior_collection() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/gists")
            .with_status(401)
            .create_async()
            .await;

        let mut session = loaded(&["a", "b"]);
        session.client = GistClient::new(&server.url());
        session.toggle_selection("a");

        let err = session.fetch_all(&Credentials::new("bad")).await.unwrap_err();

        assert!(matches!(err, GistError::Remote { status: 401 }));
        assert_eq!(ids(&session), vec!["a", "b"]);
        assert!(session.is_selected("a"));
        assert!(!session.is_loading());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_all_network_failure_resets_loading() {
        let mut session = loaded(&["a"]);
        session.client = GistClient::new("http://127.0.0.1:1");

        let err = session.fetch_all(&Credentials::new("t")).await.unwrap_err();

        assert!(matches!(err, GistError::Network(_)));
        assert_eq!(ids(&session), vec!["a"]);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_all_without_token_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", "/gists").expect(0).create_async().await;

        let mut session = loaded(&[]);
        session.client = GistClient::new(&server.url());

        let err = session.fetch_all(&Credentials::default()).await.unwrap_err();

        assert!(matches!(err, GistError::MissingToken));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_selected_partial_failure() {
        let mut server = Server::new_async().await;
        let delete_a = server
            .mock("DELETE", "/gists/a")
            .match_header("authorization", "Bearer t")
            .with_status(204)
            .create_async()
            .await;
        let delete_b = server
            .mock("DELETE", "/gists/b")
            .expect(0)
            .create_async()
            .await;
        let delete_c = server
            .mock("DELETE", "/gists/c")
            .with_status(404)
            .create_async()
            .await;

        let mut session = loaded(&["a", "b", "c"]);
        session.client = GistClient::new(&server.url());
        session.toggle_selection("a");
        session.toggle_selection("c");

        let err = session
            .delete_selected(&Credentials::new("t"))
            .await
            .unwrap_err();

        assert_eq!(ids(&session), vec!["b", "c"]);
        assert!(session.selection().is_empty());
        assert_eq!(err.to_string(), "1 gists failed to delete");
        assert!(!session.is_loading());
        delete_a.assert_async().await;
        delete_b.assert_async().await;
        delete_c.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_selected_removes_exactly_the_successes() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for (id, status) in [("g1", 204), ("g2", 500), ("g3", 204), ("g4", 403), ("g5", 404)] {
            mocks.push(
                server
                    .mock("DELETE", format!("/gists/{}", id).as_str())
                    .with_status(status)
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let mut session = loaded(&["g1", "g2", "g3", "g4", "g5"]);
        session.client = GistClient::new(&server.url());
        session.select_all();

        let err = session
            .delete_selected(&Credentials::new("t"))
            .await
            .unwrap_err();

        assert!(matches!(err, GistError::DeleteFailed { count: 3 }));
        assert!(err.to_string().contains('3'));
        assert_eq!(ids(&session), vec!["g2", "g4", "g5"]);
        assert!(session.selection().is_empty());
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_delete_selected_all_succeed() {
        let mut server = Server::new_async().await;
        let delete_a = server
            .mock("DELETE", "/gists/a")
            .with_status(204)
            .create_async()
            .await;
        let delete_b = server
            .mock("DELETE", "/gists/b")
            .with_status(204)
            .create_async()
            .await;

        let mut session = loaded(&["a", "b", "keep"]);
        session.client = GistClient::new(&server.url());
        session.select_ids(["a", "b"]);

        let mut report = session.delete_selected(&Credentials::new("t")).await.unwrap();
        report.deleted.sort();

        assert_eq!(report.deleted, vec!["a".to_string(), "b".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(ids(&session), vec!["keep"]);
        assert!(session.selection().is_empty());
        delete_a.assert_async().await;
        delete_b.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_selected_network_failure_counts_every_gist() {
        let mut session = loaded(&["a", "b"]);
        session.client = GistClient::new("http://127.0.0.1:1");
        session.select_all();

        let err = session
            .delete_selected(&Credentials::new("t"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "2 gists failed to delete");
        assert_eq!(ids(&session), vec!["a", "b"]);
        assert!(session.selection().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_empty_selection_is_a_no_op() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut session = loaded(&["a"]);
        session.client = GistClient::new(&server.url());

        let report = session.delete_selected(&Credentials::new("t")).await.unwrap();

        assert_eq!(report, DeleteReport::default());
        assert_eq!(ids(&session), vec!["a"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_selected_issues_every_request_before_any_completes() {
        let base = spawn_barrier_server(3);

        let mut session = loaded(&["a", "b", "c"]);
        session.client = GistClient::new(&base);
        session.select_all();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            session.delete_selected(&Credentials::new("t")),
        )
        .await;

        let report = result.expect("deletes were not in flight together").unwrap();
        assert_eq!(report.deleted.len(), 3);
        assert!(report.failed.is_empty());
        assert!(session.gists().is_empty());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_loading_guard_clears_flag_on_drop() {
        let mut flag = false;
        {
            let guard = LoadingGuard::new(&mut flag);
            assert!(*guard.0);
        }
        assert!(!flag);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_resets_loading() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let mut session = loaded(&["a"]);
        session.client = GistClient::new(&base);

        let result = tokio::time::timeout(
            Duration::from_millis(200),
            session.fetch_all(&Credentials::new("t")),
        )
        .await;

        assert!(result.is_err());
        assert!(!session.is_loading());
        assert_eq!(ids(&session), vec!["a"]);
        drop(listener);
    }
}
