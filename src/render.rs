//! Content renderer: folder snapshot + configuration → dashboard body.

mod frontmatter;
mod layout;
mod view;

pub use frontmatter::extract_frontmatter;
pub use layout::render;
pub use view::{RenderConfig, ViewType};
