//! Layout strategies for dashboard bodies.
//!
//! One pure entry point, `render`, dispatching on the configured view type.
//! All three layouts share the same contract: partition the folder's
//! children, exclude the folder's own dashboard document, and emit
//! navigable links whose targets are vault paths. Subfolder links target
//! the subfolder's canonical dashboard path so folder navigation lands on
//! dashboards.

use chrono::{DateTime, Utc};

use crate::identity;
use crate::render::view::{RenderConfig, ViewType};
use crate::vault::{DocumentNode, FolderNode, FolderSummary, VaultChild};

/// Render the full dashboard body for a folder.
///
/// Never fails: an empty folder produces a heading and an empty container.
pub fn render(folder: &FolderNode, config: &RenderConfig) -> String {
    let mut out = format!("# {}\n\n", folder.name);

    let welcome = config.welcome_message.replace("{folder}", &folder.name);
    if !welcome.trim().is_empty() {
        out.push_str(welcome.trim());
        out.push_str("\n\n");
    }

    out.push_str(&format!(
        "<div class=\"folder-dashboard {}\">\n",
        config.view.css_class()
    ));
    match config.view {
        ViewType::SimpleList => simple_list(&mut out, folder, config),
        ViewType::CardView => card_view(&mut out, folder, config),
        ViewType::ColumnView => column_view(&mut out, folder, config),
    }
    out.push_str("</div>\n");
    out
}

/// Subfolders and documents of `folder`, with the folder's own dashboard
/// document excluded. Exclusion is mandatory: a dashboard never lists
/// itself.
fn partition<'a>(folder: &'a FolderNode) -> (Vec<&'a FolderSummary>, Vec<&'a DocumentNode>) {
    let mut subfolders = Vec::new();
    let mut documents = Vec::new();
    for child in &folder.children {
        match child {
            VaultChild::Folder(summary) => subfolders.push(summary),
            VaultChild::Document(doc) => {
                if !identity::is_dashboard_of(&doc.path, &folder.path) {
                    documents.push(doc);
                }
            }
        }
    }
    (subfolders, documents)
}

fn link(target: &str, label: &str) -> String {
    format!(
        "<a class=\"internal-link\" href=\"{target}\" data-href=\"{target}\">{label}</a>"
    )
}

fn folder_link(summary: &FolderSummary) -> String {
    link(&identity::dashboard_path_for(&summary.path), &summary.name)
}

fn document_icon(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "📑",
        "jpg" | "jpeg" | "png" | "gif" => "🖼️",
        "mp3" | "wav" | "ogg" => "🎵",
        _ => "📄",
    }
}

/// Calendar date without a time component.
fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%x").to_string()
}

/// Inline date annotations for list-style layouts.
fn metadata_span(doc: &DocumentNode, config: &RenderConfig) -> String {
    let mut parts = Vec::new();
    if config.show_created {
        parts.push(format!("(Created: {})", format_date(&doc.created_at)));
    }
    if config.show_modified {
        parts.push(format!("(Modified: {})", format_date(&doc.modified_at)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" <span class=\"file-metadata\">{}</span>", parts.join(" "))
    }
}

/// Block-style metadata for cards: dates plus frontmatter pairs.
fn metadata_block(doc: &DocumentNode, config: &RenderConfig) -> String {
    let mut inner = String::new();
    if config.show_created {
        inner.push_str(&format!(
            "<div class=\"file-created\">Created: {}</div>",
            format_date(&doc.created_at)
        ));
    }
    if config.show_modified {
        inner.push_str(&format!(
            "<div class=\"file-modified\">Modified: {}</div>",
            format_date(&doc.modified_at)
        ));
    }
    if config.include_frontmatter {
        if let Some(pairs) = doc.frontmatter.as_ref().filter(|p| !p.is_empty()) {
            inner.push_str("<div class=\"file-frontmatter\">");
            for (key, value) in pairs {
                inner.push_str(&format!(
                    "<div><span class=\"frontmatter-key\">{key}:</span> {value}</div>"
                ));
            }
            inner.push_str("</div>");
        }
    }
    if inner.is_empty() {
        String::new()
    } else {
        format!("<div class=\"file-metadata\">{inner}</div>\n")
    }
}

fn simple_list(out: &mut String, folder: &FolderNode, config: &RenderConfig) {
    let (subfolders, documents) = partition(folder);

    if !subfolders.is_empty() {
        out.push_str("<h2>Subfolders</h2>\n<ul>\n");
        for summary in &subfolders {
            out.push_str(&format!("<li>📁 {}</li>\n", folder_link(summary)));
        }
        out.push_str("</ul>\n");
    }

    if !documents.is_empty() {
        out.push_str("<h2>Files</h2>\n<ul>\n");
        for doc in &documents {
            out.push_str(&format!(
                "<li>{} {}{}</li>\n",
                document_icon(&doc.extension),
                link(&doc.path, &doc.basename),
                metadata_span(doc, config)
            ));
        }
        out.push_str("</ul>\n");
    }
}

fn card_view(out: &mut String, folder: &FolderNode, config: &RenderConfig) {
    for child in &folder.children {
        match child {
            VaultChild::Folder(summary) => {
                out.push_str(&format!(
                    "<div class=\"card folder-card\">\n\
                     <div class=\"card-title\">📁 {}</div>\n\
                     <div class=\"card-content\">Folder with {} items</div>\n\
                     </div>\n",
                    folder_link(summary),
                    summary.child_count
                ));
            }
            VaultChild::Document(doc) => {
                if identity::is_dashboard_of(&doc.path, &folder.path) {
                    continue;
                }
                out.push_str(&format!(
                    "<div class=\"card file-card\">\n\
                     <div class=\"card-title\">{} {}</div>\n\
                     {}</div>\n",
                    document_icon(&doc.extension),
                    link(&doc.path, &doc.basename),
                    metadata_block(doc, config)
                ));
            }
        }
    }
}

fn column_view(out: &mut String, folder: &FolderNode, config: &RenderConfig) {
    let (subfolders, documents) = partition(folder);

    if !subfolders.is_empty() {
        out.push_str("<div class=\"column folders-column\">\n<h3>Folders</h3>\n<ul>\n");
        for summary in &subfolders {
            out.push_str(&format!("<li>📁 {}</li>\n", folder_link(summary)));
        }
        out.push_str("</ul>\n</div>\n");
    }

    if !documents.is_empty() {
        out.push_str("<div class=\"column files-column\">\n<h3>Files</h3>\n<ul>\n");
        for doc in &documents {
            out.push_str(&format!(
                "<li>{} {}{}</li>\n",
                document_icon(&doc.extension),
                link(&doc.path, &doc.basename),
                metadata_span(doc, config)
            ));
        }
        out.push_str("</ul>\n</div>\n");
    }
}
