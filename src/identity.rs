//! Path and identity model for the dashboard relation.
//!
//! A document is the dashboard of a folder exactly when it sits directly
//! inside that folder and its basename equals the folder's name. The
//! relation is derived from paths alone and is recomputed on every lookup;
//! nothing here touches the vault or caches results.

/// Last path segment of a slash-delimited vault path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name without its extension. `"a/b/Note.md"` → `"Note"`.
pub fn basename(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Extension of the last segment, without the dot. Empty when absent.
pub fn extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx + 1..],
    }
}

/// Parent path of a vault path, or `None` at the vault root.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// True iff the document at `document_path` is the dashboard of the folder
/// at `folder_path`. Comparison is byte-exact: case-sensitive and
/// unicode-preserving, so `projects/Projects.md` is not a dashboard of
/// `projects`.
pub fn is_dashboard_of(document_path: &str, folder_path: &str) -> bool {
    parent_path(document_path) == Some(folder_path)
        && basename(document_path) == file_name(folder_path)
}

/// True iff the path sits in dashboard position relative to its own parent:
/// basename equal to the parent folder's name. Root-level documents have no
/// parent folder and are never dashboards.
pub fn is_dashboard_path(document_path: &str) -> bool {
    match parent_path(document_path) {
        Some(parent) if !parent.is_empty() => basename(document_path) == file_name(parent),
        _ => false,
    }
}

/// Canonical dashboard path for a folder: `folder/<foldername>.md`.
pub fn dashboard_path_for(folder_path: &str) -> String {
    format!("{}/{}.md", folder_path, file_name(folder_path))
}

/// Candidate dashboards along every prefix of `path`, shallowest first.
///
/// For `a/b/c` this yields `(a, a/a.md)`, `(a/b, a/b/b.md)`,
/// `(a/b/c, a/b/c/c.md)`. The sweep is a plain loop over accumulated
/// prefixes; existence checks belong to the caller. Used to invalidate
/// every dashboard whose filename embeds a folder name touched by a rename.
pub fn ancestor_dashboards(path: &str) -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    let mut prefix = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        candidates.push((prefix.clone(), format!("{}/{}.md", prefix, segment)));
    }
    candidates
}
