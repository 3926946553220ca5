//! Change classification.
//!
//! Turns raw vault mutation events into the set of dashboards to
//! regenerate and the marking operations to apply. Classification is
//! computed against current vault state at the moment the event is
//! handled; a node that vanished between event delivery and handling
//! simply produces no work.

use tracing::trace;

use crate::identity;
use crate::vault::{NodeKind, NodeRef, Vault};

/// Raw mutation event delivered by the host vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    Created(NodeRef),
    Deleted(NodeRef),
    Renamed { node: NodeRef, old_path: String },
}

/// One marking-layer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOp {
    MarkFolder(String),
    UnmarkFolder(String),
    MarkDocument(String),
    UnmarkDocument(String),
}

/// Result of classifying one mutation event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Dashboard paths to regenerate, deduplicated, in discovery order.
    pub regenerate: Vec<String>,
    /// Marking operations, in application order.
    pub marks: Vec<MarkOp>,
}

impl Classification {
    fn push_regenerate(&mut self, dashboard_path: String) {
        if !self.regenerate.contains(&dashboard_path) {
            self.regenerate.push(dashboard_path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regenerate.is_empty() && self.marks.is_empty()
    }
}

/// Classify a mutation event against current vault state.
pub fn classify(event: &MutationEvent, vault: &dyn Vault) -> Classification {
    let mut classification = Classification::default();
    match event {
        MutationEvent::Created(node) => {
            classify_structural_change(node, vault, &mut classification);
            classify_dashboard_arrival(node, vault, &mut classification);
        }
        MutationEvent::Deleted(node) => {
            classify_structural_change(node, vault, &mut classification);
            if node.kind == NodeKind::Document && identity::is_dashboard_path(&node.path) {
                if let Some(parent) = node.parent_path() {
                    classification.marks.push(MarkOp::UnmarkFolder(parent.to_string()));
                }
            }
        }
        MutationEvent::Renamed { node, old_path } => {
            classify_structural_change(node, vault, &mut classification);
            classify_dashboard_arrival(node, vault, &mut classification);
            if node.kind == NodeKind::Document && identity::is_dashboard_path(old_path) {
                if let Some(old_parent) = identity::parent_path(old_path) {
                    classification
                        .marks
                        .push(MarkOp::UnmarkFolder(old_parent.to_string()));
                    classification
                        .marks
                        .push(MarkOp::UnmarkDocument(old_path.to_string()));
                }
            }
            sweep_old_path(old_path, vault, &mut classification);
        }
    }
    trace!(?event, regenerate = classification.regenerate.len(), marks = classification.marks.len(), "Classified mutation");
    classification
}

/// A create/delete/arrival under a folder regenerates that folder's
/// dashboard, if the folder currently has one.
fn classify_structural_change(
    node: &NodeRef,
    vault: &dyn Vault,
    classification: &mut Classification,
) {
    let Some(parent) = node.parent_path() else {
        return;
    };
    let dashboard_path = identity::dashboard_path_for(parent);
    if vault.folder(parent).is_some() && vault.document(&dashboard_path).is_some() {
        classification.push_regenerate(dashboard_path);
    }
}

/// A document landing in dashboard position marks its folder and itself.
fn classify_dashboard_arrival(
    node: &NodeRef,
    vault: &dyn Vault,
    classification: &mut Classification,
) {
    if node.kind != NodeKind::Document || !identity::is_dashboard_path(&node.path) {
        return;
    }
    let Some(parent) = node.parent_path() else {
        return;
    };
    if vault.folder(parent).is_some() {
        classification.marks.push(MarkOp::MarkFolder(parent.to_string()));
        classification
            .marks
            .push(MarkOp::MarkDocument(node.path.to_string()));
    }
}

/// Rename invalidation sweep over the old path.
///
/// A rename anywhere in a path can invalidate dashboards at several levels
/// at once, because folder names embed in dashboard filenames. Every prefix
/// of the old path whose `prefix/segment.md` still exists with `prefix` a
/// live folder gets regenerated.
fn sweep_old_path(old_path: &str, vault: &dyn Vault, classification: &mut Classification) {
    for (folder_path, dashboard_path) in identity::ancestor_dashboards(old_path) {
        if vault.folder(&folder_path).is_some() && vault.document(&dashboard_path).is_some() {
            classification.push_regenerate(dashboard_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryVault;

    fn vault_with_dashboard() -> MemoryVault {
        let vault = MemoryVault::new();
        vault.create_document("Projects/Projects.md", "");
        vault.create_document("Projects/notes.md", "");
        vault.create_folder("Projects/Alpha");
        vault
    }

    #[test]
    fn create_under_dashboarded_folder_regenerates_it() {
        let vault = vault_with_dashboard();
        vault.create_document("Projects/new.md", "");
        let event = MutationEvent::Created(NodeRef::document("Projects/new.md"));

        let classification = classify(&event, &vault);
        assert_eq!(classification.regenerate, vec!["Projects/Projects.md"]);
        assert!(classification.marks.is_empty());
    }

    #[test]
    fn create_under_plain_folder_is_a_no_op() {
        let vault = MemoryVault::new();
        vault.create_document("Plain/notes.md", "");
        let event = MutationEvent::Created(NodeRef::document("Plain/notes.md"));

        let classification = classify(&event, &vault);
        assert!(classification.is_empty());
    }

    #[test]
    fn dashboard_creation_marks_folder_and_document() {
        let vault = vault_with_dashboard();
        vault.create_document("Projects/Alpha/Alpha.md", "");
        let event = MutationEvent::Created(NodeRef::document("Projects/Alpha/Alpha.md"));

        let classification = classify(&event, &vault);
        // The new dashboard's own folder now has a dashboard, so it
        // regenerates; the grandparent is untouched.
        assert_eq!(classification.regenerate, vec!["Projects/Alpha/Alpha.md"]);
        assert_eq!(
            classification.marks,
            vec![
                MarkOp::MarkFolder("Projects/Alpha".to_string()),
                MarkOp::MarkDocument("Projects/Alpha/Alpha.md".to_string()),
            ]
        );
    }

    #[test]
    fn dashboard_creation_never_touches_the_wrong_parent() {
        let vault = MemoryVault::new();
        vault.create_document("Projects/notes.md", "");
        vault.create_folder("Projects/Alpha");
        vault.create_document("Projects/Alpha/Alpha.md", "");
        let event = MutationEvent::Created(NodeRef::document("Projects/Alpha/Alpha.md"));

        let classification = classify(&event, &vault);
        assert!(!classification
            .regenerate
            .iter()
            .any(|p| p == "Projects/Projects.md"));
    }

    #[test]
    fn dashboard_deletion_unmarks_the_folder() {
        let vault = vault_with_dashboard();
        vault.remove("Projects/Projects.md");
        let event = MutationEvent::Deleted(NodeRef::document("Projects/Projects.md"));

        let classification = classify(&event, &vault);
        // The dashboard itself is gone, so nothing regenerates.
        assert!(classification.regenerate.is_empty());
        assert_eq!(
            classification.marks,
            vec![MarkOp::UnmarkFolder("Projects".to_string())]
        );
    }

    #[test]
    fn deletion_after_dashboard_removal_schedules_nothing() {
        let vault = MemoryVault::new();
        vault.create_document("Projects/notes.md", "");
        let event = MutationEvent::Deleted(NodeRef::document("Projects/other.md"));

        let classification = classify(&event, &vault);
        assert!(classification.regenerate.is_empty());
    }

    #[test]
    fn rename_sweeps_every_matching_ancestor() {
        let vault = MemoryVault::new();
        vault.create_document("a/a.md", "");
        vault.create_document("a/b/b.md", "");
        vault.create_folder("a/b/z");
        let event = MutationEvent::Renamed {
            node: NodeRef::folder("a/b/z"),
            old_path: "a/b/c".to_string(),
        };

        let classification = classify(&event, &vault);
        // New parent a/b has a dashboard; the sweep over a/b/c finds a/a.md
        // and a/b/b.md still live, and nothing at the vanished a/b/c.
        assert_eq!(
            classification.regenerate,
            vec!["a/b/b.md".to_string(), "a/a.md".to_string()]
        );
    }

    #[test]
    fn rename_into_dashboard_position_marks() {
        let vault = MemoryVault::new();
        vault.create_folder("Projects/Alpha");
        vault.create_document("Projects/Alpha/Alpha.md", "");
        let event = MutationEvent::Renamed {
            node: NodeRef::document("Projects/Alpha/Alpha.md"),
            old_path: "Projects/Alpha/draft.md".to_string(),
        };

        let classification = classify(&event, &vault);
        assert!(classification
            .marks
            .contains(&MarkOp::MarkFolder("Projects/Alpha".to_string())));
    }

    #[test]
    fn rename_out_of_dashboard_position_unmarks_old_parent() {
        let vault = MemoryVault::new();
        vault.create_folder("Projects/Alpha");
        vault.create_document("Projects/Alpha/draft.md", "");
        let event = MutationEvent::Renamed {
            node: NodeRef::document("Projects/Alpha/draft.md"),
            old_path: "Projects/Alpha/Alpha.md".to_string(),
        };

        let classification = classify(&event, &vault);
        assert!(classification
            .marks
            .contains(&MarkOp::UnmarkFolder("Projects/Alpha".to_string())));
    }

    #[test]
    fn vanished_parent_produces_no_work() {
        let vault = MemoryVault::new();
        let event = MutationEvent::Created(NodeRef::document("Gone/note.md"));
        let classification = classify(&event, &vault);
        assert!(classification.is_empty());
    }
}
