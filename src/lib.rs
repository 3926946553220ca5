//! Folderdash: Synchronized Folder Dashboards
//!
//! Maintains a live "dashboard" note for folders in a hierarchical document
//! vault: a folder's dashboard is the document named after the folder
//! inside it, and its content is a regenerated listing of the folder's
//! children. The engine classifies vault mutations, debounces regeneration
//! per dashboard, renders deterministically from current folder state, and
//! keeps the tree view's dashboard markers reconciled.

pub mod cli;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod logging;
pub mod marking;
pub mod render;
pub mod schedule;
pub mod settings;
pub mod vault;
pub mod watch;
