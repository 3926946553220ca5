//! Tolerant frontmatter extraction.
//!
//! Best-effort key/value scan of a leading `---` delimited block. This is
//! deliberately not a YAML parser: each line is split on its first colon,
//! both sides trimmed, and anything that does not fit that shape is
//! skipped. A document without a well-formed block has no frontmatter.

use std::collections::BTreeMap;

/// Extract frontmatter pairs from document content.
///
/// Returns `None` when the document does not open with a delimited block or
/// the closing delimiter is missing. Malformed lines inside the block are
/// skipped, so a block of only malformed lines yields an empty map.
pub fn extract_frontmatter(content: &str) -> Option<BTreeMap<String, String>> {
    let mut lines = content.lines();
    if lines.next()?.trim_end() != "---" {
        return None;
    }

    let mut pairs = BTreeMap::new();
    let mut closed = false;
    for line in lines {
        if line.trim_end() == "---" {
            closed = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.insert(key.to_string(), value.trim().to_string());
    }

    closed.then_some(pairs)
}
