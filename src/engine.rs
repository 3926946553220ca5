//! Dashboard synchronization engine.
//!
//! Facade over the classifier, the debounced scheduler, the renderer, and
//! the marking synchronizer. Owns the pending state and the settings
//! snapshot; everything else is reached through the vault and tree-view
//! boundaries.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dispatch::{classify, MarkOp, MutationEvent};
use crate::error::DashError;
use crate::identity;
use crate::marking::{MarkingSynchronizer, TreeView};
use crate::render::{self, extract_frontmatter, RenderConfig};
use crate::schedule::UpdateScheduler;
use crate::settings::Settings;
use crate::vault::{FolderNode, Vault, VaultChild};

/// Result of the idempotent dashboard-creation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new dashboard document was created at this path.
    Created(String),
    /// The folder already had a dashboard; the host should open it.
    Existing(String),
}

impl CreateOutcome {
    pub fn path(&self) -> &str {
        match self {
            CreateOutcome::Created(path) | CreateOutcome::Existing(path) => path,
        }
    }
}

/// The synchronization engine. Construct, `initialize`, feed mutation
/// events, and `shutdown` when the host unloads.
pub struct DashboardEngine {
    vault: Arc<dyn Vault>,
    settings: Arc<RwLock<Settings>>,
    scheduler: UpdateScheduler,
    marking: MarkingSynchronizer,
}

impl DashboardEngine {
    /// Debounce and settle intervals are fixed at construction; display
    /// options may change at runtime through `apply_settings`.
    pub fn new(vault: Arc<dyn Vault>, view: Arc<dyn TreeView>, settings: Settings) -> Self {
        let scheduler = UpdateScheduler::new(settings.debounce());
        let marking = MarkingSynchronizer::new(view, settings.settle());
        Self {
            vault,
            settings: Arc::new(RwLock::new(settings)),
            scheduler,
            marking,
        }
    }

    /// Seed the marking layer: scan the whole vault for dashboards and
    /// forward the visibility toggles. Run once when the host is ready.
    pub fn initialize(&self) {
        self.marking.scan(self.vault.as_ref());
        self.marking
            .update_visibility(&self.settings.read().visibility());
        info!("Dashboard engine initialized");
    }

    /// React to one host mutation event.
    pub fn handle_event(&self, event: &MutationEvent) {
        let classification = classify(event, self.vault.as_ref());
        for dashboard_path in classification.regenerate {
            self.schedule_regeneration(dashboard_path);
        }
        for op in classification.marks {
            self.marking.apply(op);
        }
    }

    /// Create the dashboard for a folder, or report the existing one.
    pub async fn create_dashboard_for(&self, folder_path: &str) -> Result<CreateOutcome, DashError> {
        let folder = self
            .vault
            .folder(folder_path)
            .ok_or_else(|| DashError::NotAFolder(folder_path.to_string()))?;
        let dashboard_path = identity::dashboard_path_for(folder_path);
        if self.vault.document(&dashboard_path).is_some() {
            return Ok(CreateOutcome::Existing(dashboard_path));
        }

        let config = self.settings.read().render_config();
        let folder = attach_frontmatter(self.vault.as_ref(), folder, &config).await;
        let body = render::render(&folder, &config);
        self.vault.create(&dashboard_path, &body).await?;

        self.marking
            .apply(MarkOp::MarkFolder(folder_path.to_string()));
        self.marking
            .apply(MarkOp::MarkDocument(dashboard_path.clone()));
        info!(path = %dashboard_path, "Dashboard created");
        Ok(CreateOutcome::Created(dashboard_path))
    }

    /// The command surface: create (or open) the dashboard for the folder
    /// the host currently considers active. `None` when nothing is active.
    pub async fn create_dashboard_for_active_folder(
        &self,
    ) -> Result<Option<CreateOutcome>, DashError> {
        match self.vault.active_folder() {
            Some(folder) => Ok(Some(self.create_dashboard_for(&folder.path).await?)),
            None => Ok(None),
        }
    }

    /// Rendered body for a folder, for embedding into a live view.
    pub async fn render_dashboard(&self, folder_path: &str) -> Result<String, DashError> {
        let folder = self
            .vault
            .folder(folder_path)
            .ok_or_else(|| DashError::NotAFolder(folder_path.to_string()))?;
        let config = self.settings.read().render_config();
        let folder = attach_frontmatter(self.vault.as_ref(), folder, &config).await;
        Ok(render::render(&folder, &config))
    }

    /// Schedule a regeneration for every dashboard in the vault.
    pub fn update_all_dashboards(&self) {
        let mut scheduled = 0usize;
        for doc in self.vault.documents() {
            if !identity::is_dashboard_of(&doc.path, &doc.parent_path) {
                continue;
            }
            if self.vault.folder(&doc.parent_path).is_none() {
                continue;
            }
            self.schedule_regeneration(doc.path);
            scheduled += 1;
        }
        debug!(scheduled, "Scheduled refresh of all dashboards");
    }

    /// Swap in new settings, forward visibility, and refresh content.
    pub fn apply_settings(&self, settings: Settings) {
        self.marking.update_visibility(&settings.visibility());
        *self.settings.write() = settings;
        self.update_all_dashboards();
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn pending_regenerations(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn is_regeneration_pending(&self, dashboard_path: &str) -> bool {
        self.scheduler.is_pending(dashboard_path)
    }

    pub fn pending_marks(&self) -> usize {
        self.marking.pending_count()
    }

    /// Cancel every outstanding timer and pending mark. Nothing queued
    /// before this call touches the vault or the view afterwards.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        self.marking.shutdown();
        info!("Dashboard engine shut down");
    }

    fn schedule_regeneration(&self, dashboard_path: String) {
        let vault = Arc::clone(&self.vault);
        let settings = Arc::clone(&self.settings);
        let path = dashboard_path.clone();
        self.scheduler.schedule(&dashboard_path, async move {
            let config = settings.read().render_config();
            regenerate(vault, config, path).await;
        });
    }
}

/// Render + persist one dashboard from current vault state.
///
/// The folder and the dashboard are re-resolved here, at fire time, so the
/// persisted content reflects the state after the burst that triggered the
/// update. Vanished collaborators end the attempt silently; write failures
/// are logged and left for the next triggering change.
async fn regenerate(vault: Arc<dyn Vault>, config: RenderConfig, dashboard_path: String) {
    let Some(folder_path) = identity::parent_path(&dashboard_path) else {
        return;
    };
    let Some(folder) = vault.folder(folder_path) else {
        debug!(path = %dashboard_path, "Folder vanished before regeneration");
        return;
    };
    if vault.document(&dashboard_path).is_none() {
        debug!(path = %dashboard_path, "Dashboard vanished before regeneration");
        return;
    }

    let folder = attach_frontmatter(vault.as_ref(), folder, &config).await;
    let body = render::render(&folder, &config);
    match vault.write(&dashboard_path, &body).await {
        Ok(()) => debug!(path = %dashboard_path, "Dashboard regenerated"),
        Err(error) => {
            warn!(path = %dashboard_path, %error, "Dashboard write failed; will retry on next change")
        }
    }
}

/// Populate frontmatter on the folder's documents when the configuration
/// asks for it. Unreadable documents degrade to no frontmatter.
async fn attach_frontmatter(
    vault: &dyn Vault,
    mut folder: FolderNode,
    config: &RenderConfig,
) -> FolderNode {
    if !config.include_frontmatter {
        return folder;
    }
    for child in &mut folder.children {
        let VaultChild::Document(doc) = child else {
            continue;
        };
        if identity::is_dashboard_of(&doc.path, &folder.path) {
            continue;
        }
        match vault.read(&doc.path).await {
            Ok(content) => doc.frontmatter = extract_frontmatter(&content),
            Err(error) => {
                debug!(path = %doc.path, %error, "Skipping frontmatter for unreadable document")
            }
        }
    }
    folder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marking::NoopTreeView;
    use crate::vault::{MemoryVault, NodeRef};
    use std::time::Duration;
    use tokio::time::sleep;

    fn engine_over(vault: Arc<MemoryVault>) -> DashboardEngine {
        let mut settings = Settings::default();
        settings.debounce_ms = 100;
        settings.settle_ms = 10;
        DashboardEngine::new(vault, Arc::new(NoopTreeView), settings)
    }

    #[tokio::test(start_paused = true)]
    async fn create_is_idempotent() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_folder("Projects");
        let engine = engine_over(Arc::clone(&vault));

        let first = engine.create_dashboard_for("Projects").await.unwrap();
        assert_eq!(
            first,
            CreateOutcome::Created("Projects/Projects.md".to_string())
        );
        let second = engine.create_dashboard_for("Projects").await.unwrap();
        assert_eq!(
            second,
            CreateOutcome::Existing("Projects/Projects.md".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_rejects_non_folders() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_document("Projects/notes.md", "");
        let engine = engine_over(Arc::clone(&vault));

        let err = engine
            .create_dashboard_for("Projects/notes.md")
            .await
            .unwrap_err();
        assert!(matches!(err, DashError::NotAFolder(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_persists_only_the_final_state() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_document("Projects/Projects.md", "");
        let engine = engine_over(Arc::clone(&vault));

        // Burst: three documents created in quick succession.
        for name in ["a.md", "b.md", "c.md"] {
            let path = format!("Projects/{name}");
            vault.create_document(&path, "");
            engine.handle_event(&MutationEvent::Created(NodeRef::document(path)));
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(engine.pending_regenerations(), 1);

        sleep(Duration::from_millis(300)).await;
        let body = vault.read("Projects/Projects.md").await.unwrap();
        for name in ["a", "b", "c"] {
            assert!(body.contains(&format!("Projects/{name}.md")), "missing {name}");
        }
        assert_eq!(engine.pending_regenerations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_dashboard_is_skipped_silently() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_document("Projects/Projects.md", "untouched");
        let engine = engine_over(Arc::clone(&vault));

        vault.create_document("Projects/new.md", "");
        engine.handle_event(&MutationEvent::Created(NodeRef::document(
            "Projects/new.md",
        )));
        // The dashboard disappears while the timer is armed.
        vault.remove("Projects/Projects.md");

        sleep(Duration::from_millis(300)).await;
        assert!(vault.document("Projects/Projects.md").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_prevents_pending_writes() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_document("Projects/Projects.md", "before");
        let engine = engine_over(Arc::clone(&vault));

        vault.create_document("Projects/new.md", "");
        engine.handle_event(&MutationEvent::Created(NodeRef::document(
            "Projects/new.md",
        )));
        engine.shutdown();

        sleep(Duration::from_millis(300)).await;
        assert_eq!(
            vault.read("Projects/Projects.md").await.unwrap(),
            "before"
        );
        assert_eq!(engine.pending_regenerations(), 0);
        assert_eq!(engine.pending_marks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn update_all_refreshes_every_dashboard() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_document("A/A.md", "");
        vault.create_document("B/B.md", "");
        vault.create_document("B/plain.md", "");
        let engine = engine_over(Arc::clone(&vault));

        engine.update_all_dashboards();
        assert_eq!(engine.pending_regenerations(), 2);

        sleep(Duration::from_millis(300)).await;
        let body = vault.read("B/B.md").await.unwrap();
        assert!(body.contains("B/plain.md"));
    }

    #[tokio::test(start_paused = true)]
    async fn render_dashboard_reflects_current_settings() {
        let vault = Arc::new(MemoryVault::new());
        vault.create_document("Projects/notes.md", "---\nstatus: active\n---\n");
        let engine = engine_over(Arc::clone(&vault));

        let body = engine.render_dashboard("Projects").await.unwrap();
        assert!(!body.contains("frontmatter-key"));

        let mut settings = engine.settings();
        settings.include_frontmatter = true;
        settings.view_type = crate::render::ViewType::CardView;
        engine.apply_settings(settings);

        let body = engine.render_dashboard("Projects").await.unwrap();
        assert!(body.contains("<span class=\"frontmatter-key\">status:</span> active"));
    }
}
