//! In-memory vault.
//!
//! Reference implementation of the vault boundary backed by a sorted path
//! map. Mutators cover the same create/delete/rename surface a host vault
//! would expose, which makes it the fixture of choice for engine tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::DashError;
use crate::identity;
use crate::vault::{DocumentNode, FolderNode, FolderSummary, Vault, VaultChild};

#[derive(Debug, Clone)]
enum Entry {
    Folder,
    Document {
        content: String,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    },
}

#[derive(Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    active_folder: Option<String>,
}

/// Vault held entirely in memory. Children are listed in lexicographic
/// path order, which stands in for the host's vault order.
#[derive(Default)]
pub struct MemoryVault {
    state: RwLock<State>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a folder, creating missing ancestors.
    pub fn create_folder(&self, path: &str) {
        let mut state = self.state.write();
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            state.entries.entry(prefix.clone()).or_insert(Entry::Folder);
        }
    }

    /// Insert a document with explicit timestamps.
    pub fn create_document_at(
        &self,
        path: &str,
        content: &str,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) {
        if let Some(parent) = identity::parent_path(path) {
            self.create_folder(parent);
        }
        self.state.write().entries.insert(
            path.to_string(),
            Entry::Document {
                content: content.to_string(),
                created_at,
                modified_at,
            },
        );
    }

    /// Insert a document stamped with the current time.
    pub fn create_document(&self, path: &str, content: &str) {
        let now = Utc::now();
        self.create_document_at(path, content, now, now);
    }

    /// Remove a node; removing a folder removes its whole subtree.
    pub fn remove(&self, path: &str) {
        let mut state = self.state.write();
        let subtree_prefix = format!("{}/", path);
        state
            .entries
            .retain(|p, _| p != path && !p.starts_with(&subtree_prefix));
    }

    /// Move a node (and its subtree, for folders) to a new path.
    pub fn rename(&self, old_path: &str, new_path: &str) {
        let mut state = self.state.write();
        let subtree_prefix = format!("{}/", old_path);
        let moved: Vec<(String, Entry)> = state
            .entries
            .iter()
            .filter(|(p, _)| p.as_str() == old_path || p.starts_with(&subtree_prefix))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        for (p, _) in &moved {
            state.entries.remove(p);
        }
        for (p, entry) in moved {
            let relocated = format!("{}{}", new_path, &p[old_path.len()..]);
            state.entries.insert(relocated, entry);
        }
    }

    /// Set which folder the host UI considers active.
    pub fn set_active_folder(&self, path: Option<&str>) {
        self.state.write().active_folder = path.map(str::to_string);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state.read().entries.contains_key(path)
    }

    fn document_from_entry(path: &str, entry: &Entry) -> Option<DocumentNode> {
        match entry {
            Entry::Document {
                created_at,
                modified_at,
                ..
            } => DocumentNode::from_path(path, *created_at, *modified_at),
            Entry::Folder => None,
        }
    }

    fn folder_snapshot(state: &State, path: &str) -> Option<FolderNode> {
        match state.entries.get(path) {
            Some(Entry::Folder) => {}
            _ => return None,
        }
        let prefix = format!("{}/", path);
        let mut children = Vec::new();
        for (child_path, entry) in state.entries.range(prefix.clone()..) {
            if !child_path.starts_with(&prefix) {
                break;
            }
            if identity::parent_path(child_path) != Some(path) {
                continue;
            }
            match entry {
                Entry::Folder => {
                    let child_count = state
                        .entries
                        .keys()
                        .filter(|p| identity::parent_path(p) == Some(child_path.as_str()))
                        .count();
                    children.push(VaultChild::Folder(FolderSummary {
                        path: child_path.clone(),
                        name: identity::file_name(child_path).to_string(),
                        child_count,
                    }));
                }
                Entry::Document { .. } => {
                    if let Some(doc) = Self::document_from_entry(child_path, entry) {
                        children.push(VaultChild::Document(doc));
                    }
                }
            }
        }
        Some(FolderNode {
            path: path.to_string(),
            name: identity::file_name(path).to_string(),
            children,
        })
    }
}

#[async_trait]
impl Vault for MemoryVault {
    fn folder(&self, path: &str) -> Option<FolderNode> {
        Self::folder_snapshot(&self.state.read(), path)
    }

    fn document(&self, path: &str) -> Option<DocumentNode> {
        let state = self.state.read();
        let entry = state.entries.get(path)?;
        Self::document_from_entry(path, entry)
    }

    fn documents(&self) -> Vec<DocumentNode> {
        let state = self.state.read();
        state
            .entries
            .iter()
            .filter_map(|(path, entry)| Self::document_from_entry(path, entry))
            .collect()
    }

    fn active_folder(&self) -> Option<FolderNode> {
        let state = self.state.read();
        let path = state.active_folder.clone()?;
        Self::folder_snapshot(&state, &path)
    }

    async fn read(&self, path: &str) -> Result<String, DashError> {
        let state = self.state.read();
        match state.entries.get(path) {
            Some(Entry::Document { content, .. }) => Ok(content.clone()),
            _ => Err(DashError::NodeNotFound(path.to_string())),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), DashError> {
        let mut state = self.state.write();
        match state.entries.get_mut(path) {
            Some(Entry::Document {
                content: existing,
                modified_at,
                ..
            }) => {
                *existing = content.to_string();
                *modified_at = Utc::now();
                Ok(())
            }
            _ => Err(DashError::NodeNotFound(path.to_string())),
        }
    }

    async fn create(&self, path: &str, content: &str) -> Result<DocumentNode, DashError> {
        if self.contains(path) {
            return Err(DashError::AlreadyExists(path.to_string()));
        }
        self.create_document(path, content);
        self.document(path)
            .ok_or_else(|| DashError::NodeNotFound(path.to_string()))
    }
}
