//! View selection and render-time configuration.

use serde::{Deserialize, Serialize};

/// Dashboard layout variant. A closed set: each variant maps to one render
/// strategy in `layout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
    #[default]
    SimpleList,
    CardView,
    ColumnView,
}

impl ViewType {
    /// CSS class used on the dashboard container.
    pub fn css_class(self) -> &'static str {
        match self {
            ViewType::SimpleList => "simple-list",
            ViewType::CardView => "card-view",
            ViewType::ColumnView => "column-view",
        }
    }
}

/// Immutable snapshot of the options consulted at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub view: ViewType,
    pub include_frontmatter: bool,
    pub show_created: bool,
    pub show_modified: bool,
    /// Template shown under the heading; `{folder}` expands to the folder
    /// name. Blank templates are omitted entirely.
    pub welcome_message: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            view: ViewType::default(),
            include_frontmatter: false,
            show_created: false,
            show_modified: false,
            welcome_message: "*This is a dynamic dashboard for the \"{folder}\" folder.*"
                .to_string(),
        }
    }
}
