//! Filesystem watch bridge.
//!
//! Connects a recursive OS file watcher to the engine: raw notifications
//! are converted into vault mutation events and handed to
//! `DashboardEngine::handle_event`. Content-only modifications are not
//! structural mutations and are dropped at this boundary.

use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::dispatch::MutationEvent;
use crate::engine::DashboardEngine;
use crate::error::DashError;
use crate::identity;
use crate::vault::{FsVault, NodeRef};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Bridge between a watched directory and the engine.
pub struct WatchBridge {
    engine: Arc<DashboardEngine>,
    vault: Arc<FsVault>,
    running: Arc<RwLock<bool>>,
}

impl WatchBridge {
    pub fn new(engine: Arc<DashboardEngine>, vault: Arc<FsVault>) -> Self {
        Self {
            engine,
            vault,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Run the watch loop until `stop` is called. Blocking; callers on an
    /// async runtime should move this onto a blocking thread.
    pub fn run(&self) -> Result<(), DashError> {
        *self.running.write() = true;
        self.engine.initialize();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if tx.send(res).is_err() {
                error!("Watch receiver dropped while watcher is live");
            }
        })?;
        watcher.watch(self.vault.root(), RecursiveMode::Recursive)?;
        info!(root = %self.vault.root().display(), "Watching vault");

        loop {
            if !*self.running.read() {
                break;
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    for mutation in self.convert(event) {
                        debug!(?mutation, "Vault mutation");
                        self.engine.handle_event(&mutation);
                    }
                }
                Ok(Err(err)) => warn!(error = %err, "Watch error"),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watcher channel disconnected");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Stop the loop and shut the engine down (cancels all pending work).
    pub fn stop(&self) {
        *self.running.write() = false;
        self.engine.shutdown();
    }

    fn convert(&self, event: Event) -> Vec<MutationEvent> {
        match event.kind {
            EventKind::Create(_) => self
                .node_ref(event.paths.first())
                .map(MutationEvent::Created)
                .into_iter()
                .collect(),
            EventKind::Remove(_) => self
                .removed_node_ref(event.paths.first())
                .map(MutationEvent::Deleted)
                .into_iter()
                .collect(),
            EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
                if event.paths.len() >= 2 {
                    let old_path = self
                        .vault
                        .vault_path(&event.paths[0])
                        .unwrap_or_default();
                    match self.node_ref(event.paths.get(1)) {
                        Some(node) if !old_path.is_empty() => {
                            vec![MutationEvent::Renamed { node, old_path }]
                        }
                        _ => Vec::new(),
                    }
                } else {
                    // Rename halves arrive as single-path notifications on
                    // some platforms; classify by what is on disk now.
                    match event.paths.first() {
                        Some(path) if path.exists() => self
                            .node_ref(Some(path))
                            .map(MutationEvent::Created)
                            .into_iter()
                            .collect(),
                        Some(path) => self
                            .removed_node_ref(Some(path))
                            .map(MutationEvent::Deleted)
                            .into_iter()
                            .collect(),
                        None => Vec::new(),
                    }
                }
            }
            _ => Vec::new(),
        }
    }

    fn node_ref(&self, path: Option<&std::path::PathBuf>) -> Option<NodeRef> {
        let absolute: &Path = path?.as_path();
        let vault_path = self.vault.vault_path(absolute)?;
        if absolute.is_dir() {
            Some(NodeRef::folder(vault_path))
        } else {
            Some(NodeRef::document(vault_path))
        }
    }

    /// A removed path is gone from disk, so its kind is inferred from the
    /// name: vault documents carry extensions, folders do not.
    fn removed_node_ref(&self, path: Option<&std::path::PathBuf>) -> Option<NodeRef> {
        let vault_path = self.vault.vault_path(path?)?;
        if identity::extension(&vault_path).is_empty() {
            Some(NodeRef::folder(vault_path))
        } else {
            Some(NodeRef::document(vault_path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marking::NoopTreeView;
    use crate::settings::Settings;
    use tempfile::TempDir;

    fn bridge_over(dir: &TempDir) -> WatchBridge {
        let vault = Arc::new(FsVault::new(dir.path()));
        let engine = Arc::new(DashboardEngine::new(
            Arc::clone(&vault) as Arc<dyn crate::vault::Vault>,
            Arc::new(NoopTreeView),
            Settings::default(),
        ));
        WatchBridge::new(engine, vault)
    }

    #[tokio::test]
    async fn create_notification_becomes_created_event() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Projects")).unwrap();
        std::fs::write(dir.path().join("Projects/notes.md"), "").unwrap();
        let bridge = bridge_over(&dir);

        let event = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(dir.path().join("Projects/notes.md"));
        let converted = bridge.convert(event);
        assert_eq!(
            converted,
            vec![MutationEvent::Created(NodeRef::document(
                "Projects/notes.md"
            ))]
        );
    }

    #[tokio::test]
    async fn removal_kind_is_inferred_from_the_name() {
        let dir = TempDir::new().unwrap();
        let bridge = bridge_over(&dir);

        let doc = Event::new(EventKind::Remove(notify::event::RemoveKind::Any))
            .add_path(dir.path().join("Projects/notes.md"));
        assert_eq!(
            bridge.convert(doc),
            vec![MutationEvent::Deleted(NodeRef::document(
                "Projects/notes.md"
            ))]
        );

        let folder = Event::new(EventKind::Remove(notify::event::RemoveKind::Any))
            .add_path(dir.path().join("Projects/Alpha"));
        assert_eq!(
            bridge.convert(folder),
            vec![MutationEvent::Deleted(NodeRef::folder("Projects/Alpha"))]
        );
    }

    #[tokio::test]
    async fn two_path_rename_carries_the_old_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/z")).unwrap();
        let bridge = bridge_over(&dir);

        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Name(
            notify::event::RenameMode::Both,
        )))
        .add_path(dir.path().join("a/b/c"))
        .add_path(dir.path().join("a/b/z"));

        let converted = bridge.convert(event);
        assert_eq!(
            converted,
            vec![MutationEvent::Renamed {
                node: NodeRef::folder("a/b/z"),
                old_path: "a/b/c".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn content_modifications_are_dropped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("note.md"), "x").unwrap();
        let bridge = bridge_over(&dir);

        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Content,
        )))
        .add_path(dir.path().join("note.md"));
        assert!(bridge.convert(event).is_empty());
    }

    #[tokio::test]
    async fn paths_outside_the_root_are_ignored() {
        let dir = TempDir::new().unwrap();
        let bridge = bridge_over(&dir);

        let event = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(std::path::PathBuf::from("/elsewhere/notes.md"));
        assert!(bridge.convert(event).is_empty());
    }
}
