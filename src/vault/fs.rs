//! Filesystem vault.
//!
//! Maps a directory tree on disk to the vault boundary. Snapshot lookups go
//! through `std::fs`, bulk document listing through `walkdir`, and content
//! I/O through `tokio::fs`. Hidden entries (dot-prefixed) are invisible to
//! the vault. Children are listed in file-name order, which stands in for
//! the host's vault order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::DashError;
use crate::identity;
use crate::vault::{DocumentNode, FolderNode, FolderSummary, Vault, VaultChild};

/// Vault rooted at a directory on disk.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault path. Rejects traversal outside the root.
    fn resolve(&self, vault_path: &str) -> Result<PathBuf, DashError> {
        let relative = Path::new(vault_path);
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(DashError::OutsideVault(relative.to_path_buf()));
        }
        Ok(self.root.join(relative))
    }

    /// Vault path of an absolute location inside the root, slash-delimited.
    /// `None` for locations outside the root or with non-UTF-8 segments.
    pub fn vault_path(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?.to_string()),
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }

    fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    fn document_snapshot(&self, vault_path: &str, absolute: &Path) -> Option<DocumentNode> {
        let metadata = fs::metadata(absolute).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        // Creation time is unavailable on some filesystems.
        let created = metadata
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or(modified);
        DocumentNode::from_path(vault_path, created, modified)
    }

    fn direct_child_count(&self, absolute: &Path) -> usize {
        fs::read_dir(absolute)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| !Self::is_hidden(&e.file_name().to_string_lossy()))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl Vault for FsVault {
    fn folder(&self, path: &str) -> Option<FolderNode> {
        let absolute = self.resolve(path).ok()?;
        if !absolute.is_dir() {
            return None;
        }
        let mut entries: Vec<(String, PathBuf, bool)> = fs::read_dir(&absolute)
            .ok()?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                if Self::is_hidden(&name) {
                    return None;
                }
                let is_dir = e.file_type().ok()?.is_dir();
                Some((name, e.path(), is_dir))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut children = Vec::new();
        for (name, child_abs, is_dir) in entries {
            let child_path = format!("{}/{}", path, name);
            if is_dir {
                children.push(VaultChild::Folder(FolderSummary {
                    child_count: self.direct_child_count(&child_abs),
                    path: child_path,
                    name,
                }));
            } else if let Some(doc) = self.document_snapshot(&child_path, &child_abs) {
                children.push(VaultChild::Document(doc));
            }
        }
        Some(FolderNode {
            path: path.to_string(),
            name: identity::file_name(path).to_string(),
            children,
        })
    }

    fn document(&self, path: &str) -> Option<DocumentNode> {
        let absolute = self.resolve(path).ok()?;
        self.document_snapshot(path, &absolute)
    }

    fn documents(&self) -> Vec<DocumentNode> {
        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root).follow_links(false).into_iter();
        for entry in walker.filter_entry(|e| {
            e.depth() == 0 || !Self::is_hidden(&e.file_name().to_string_lossy())
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "Skipping unreadable entry during vault scan");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(vault_path) = self.vault_path(entry.path()) else {
                continue;
            };
            if let Some(doc) = self.document_snapshot(&vault_path, entry.path()) {
                documents.push(doc);
            }
        }
        documents
    }

    async fn read(&self, path: &str) -> Result<String, DashError> {
        let absolute = self.resolve(path)?;
        Ok(tokio::fs::read_to_string(absolute).await?)
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), DashError> {
        let absolute = self.resolve(path)?;
        if !absolute.is_file() {
            return Err(DashError::NodeNotFound(path.to_string()));
        }
        tokio::fs::write(absolute, content).await?;
        Ok(())
    }

    async fn create(&self, path: &str, content: &str) -> Result<DocumentNode, DashError> {
        let absolute = self.resolve(path)?;
        if absolute.exists() {
            return Err(DashError::AlreadyExists(path.to_string()));
        }
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, content).await?;
        self.document(path)
            .ok_or_else(|| DashError::NodeNotFound(path.to_string()))
    }
}
