//! Vault node snapshots.
//!
//! The engine never owns the vault's tree; it works on owned snapshots
//! produced at lookup time. Paths are slash-delimited and relative to the
//! vault root, with no leading or trailing slash.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::identity;

/// Snapshot of a leaf document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    pub path: String,
    /// File name without extension.
    pub basename: String,
    /// Extension without the dot; empty when absent.
    pub extension: String,
    pub parent_path: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Populated by the engine before rendering when the configuration
    /// asks for frontmatter; `None` otherwise.
    pub frontmatter: Option<BTreeMap<String, String>>,
}

impl DocumentNode {
    /// Build a document snapshot from its path and timestamps. Returns
    /// `None` for root-level paths with no parent folder.
    pub fn from_path(
        path: &str,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Option<Self> {
        let parent = identity::parent_path(path)?;
        Some(Self {
            path: path.to_string(),
            basename: identity::basename(path).to_string(),
            extension: identity::extension(path).to_string(),
            parent_path: parent.to_string(),
            created_at,
            modified_at,
            frontmatter: None,
        })
    }
}

/// Shallow folder reference inside a parent's child listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub path: String,
    pub name: String,
    /// Direct child count, shown on folder cards.
    pub child_count: usize,
}

/// One entry in a folder's child listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultChild {
    Folder(FolderSummary),
    Document(DocumentNode),
}

/// Snapshot of a directory and its direct children, in vault order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub path: String,
    /// Last path segment.
    pub name: String,
    pub children: Vec<VaultChild>,
}

/// Kind of a node referenced by a mutation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Document,
}

/// Lightweight reference to the node a mutation event is about. Carries
/// enough to classify the event even after the node itself is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub path: String,
    pub kind: NodeKind,
}

impl NodeRef {
    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Folder,
        }
    }

    pub fn document(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Document,
        }
    }

    /// Parent path, or `None` for a root-level node.
    pub fn parent_path(&self) -> Option<&str> {
        crate::identity::parent_path(&self.path)
    }
}
