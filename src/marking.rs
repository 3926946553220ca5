//! Marking synchronizer.
//!
//! Keeps the tree view's "this folder/file is a dashboard" annotations in
//! agreement with the derived dashboard set. Rows move between `unmarked`
//! and `marked` as dashboards appear and disappear; the initial full-vault
//! scan seeds the state that incremental mutation events then maintain.
//!
//! The host UI builds tree rows asynchronously, so every operation is
//! applied after a settle delay. A row still absent when the delay elapses
//! means the operation is dropped silently; the next scan or mutation event
//! restores consistency. Best-effort eventual reconciliation, not a hard
//! guarantee.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::dispatch::MarkOp;
use crate::identity;
use crate::vault::Vault;

/// Visibility toggles forwarded to the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityOptions {
    /// Hide dashboard documents in the explorer (folder contents stay
    /// visible).
    pub hide_dashboard_notes: bool,
    /// Hide the contents of dashboard-bearing folders.
    pub hide_folder_contents: bool,
}

/// Host tree-view boundary. Row lookups and class toggling only; the view
/// owns all presentation.
pub trait TreeView: Send + Sync {
    /// Whether a row for this path currently exists in the view.
    fn has_row(&self, path: &str) -> bool;

    fn mark_folder(&self, path: &str);
    fn unmark_folder(&self, path: &str);
    fn mark_document(&self, path: &str);
    fn unmark_document(&self, path: &str);

    fn set_visibility(&self, _options: &VisibilityOptions) {}
}

/// Tree view for hosts without one (headless runs). Rows always exist and
/// marks are accepted and discarded.
pub struct NoopTreeView;

impl TreeView for NoopTreeView {
    fn has_row(&self, _path: &str) -> bool {
        true
    }

    fn mark_folder(&self, _path: &str) {}
    fn unmark_folder(&self, _path: &str) {}
    fn mark_document(&self, _path: &str) {}
    fn unmark_document(&self, _path: &str) {}
}

struct PendingMark {
    token: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    pending: Mutex<HashMap<String, PendingMark>>,
    next_token: AtomicU64,
}

/// Applies marking operations through the tree-view boundary after the
/// settle delay, with the same cancel-before-replace discipline as the
/// update scheduler: a newer operation for the same row supersedes a
/// pending one.
pub struct MarkingSynchronizer {
    view: Arc<dyn TreeView>,
    settle: Duration,
    inner: Arc<Inner>,
}

impl MarkingSynchronizer {
    pub fn new(view: Arc<dyn TreeView>, settle: Duration) -> Self {
        Self {
            view,
            settle,
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
            }),
        }
    }

    /// Queue one marking operation for application after the settle delay.
    pub fn apply(&self, op: MarkOp) {
        let row = match &op {
            MarkOp::MarkFolder(path)
            | MarkOp::UnmarkFolder(path)
            | MarkOp::MarkDocument(path)
            | MarkOp::UnmarkDocument(path) => path.clone(),
        };
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let view = Arc::clone(&self.view);
        let settle = self.settle;
        let inner = Arc::clone(&self.inner);

        let mut pending = self.inner.pending.lock();
        if let Some(superseded) = pending.remove(&row) {
            superseded.handle.abort();
        }

        let task_row = row.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            if view.has_row(&task_row) {
                match &op {
                    MarkOp::MarkFolder(path) => view.mark_folder(path),
                    MarkOp::UnmarkFolder(path) => view.unmark_folder(path),
                    MarkOp::MarkDocument(path) => view.mark_document(path),
                    MarkOp::UnmarkDocument(path) => view.unmark_document(path),
                }
            } else {
                // Row never materialized; dropped, not retried.
                trace!(row = %task_row, "Dropped mark for absent row");
            }
            let mut pending = inner.pending.lock();
            if pending.get(&task_row).is_some_and(|p| p.token == token) {
                pending.remove(&task_row);
            }
        });

        pending.insert(row, PendingMark { token, handle });
    }

    /// Evaluate the dashboard relation for every document in the vault and
    /// mark all matches. Run once when the system becomes ready.
    pub fn scan(&self, vault: &dyn Vault) {
        let mut marked = 0usize;
        for doc in vault.documents() {
            if identity::is_dashboard_of(&doc.path, &doc.parent_path) {
                self.apply(MarkOp::MarkFolder(doc.parent_path.clone()));
                self.apply(MarkOp::MarkDocument(doc.path.clone()));
                marked += 1;
            }
        }
        debug!(dashboards = marked, "Initial marking scan complete");
    }

    /// Forward visibility toggles to the view.
    pub fn update_visibility(&self, options: &VisibilityOptions) {
        self.view.set_visibility(options);
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Abort every pending application. No view mutation happens afterwards
    /// for operations queued before this call.
    pub fn shutdown(&self) {
        let mut pending = self.inner.pending.lock();
        for (_, entry) in pending.drain() {
            entry.handle.abort();
        }
    }
}

impl Drop for MarkingSynchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
