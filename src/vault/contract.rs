//! Host vault boundary.

use async_trait::async_trait;

use crate::error::DashError;
use crate::vault::{DocumentNode, FolderNode};

/// Read/write access to the host document vault.
///
/// Lookups are synchronous snapshot reads of the host's in-memory tree;
/// document content I/O is asynchronous. Implementations must hand out
/// owned snapshots: the engine never assumes a snapshot stays valid across
/// a mutation event.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Folder snapshot at `path`, with direct children in vault order.
    fn folder(&self, path: &str) -> Option<FolderNode>;

    /// Document snapshot at `path`.
    fn document(&self, path: &str) -> Option<DocumentNode>;

    /// Every document in the vault, for the initial scan and bulk refresh.
    fn documents(&self) -> Vec<DocumentNode>;

    /// The folder currently active/focused in the host UI, if any. Used by
    /// the command surface; adapters without a focus concept return `None`.
    fn active_folder(&self) -> Option<FolderNode> {
        None
    }

    /// Read a document's text content.
    async fn read(&self, path: &str) -> Result<String, DashError>;

    /// Overwrite an existing document's content.
    async fn write(&self, path: &str, content: &str) -> Result<(), DashError>;

    /// Create a new document with the given content.
    async fn create(&self, path: &str, content: &str) -> Result<DocumentNode, DashError>;
}
