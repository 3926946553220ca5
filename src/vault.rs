//! Vault domain: node snapshots, the host boundary trait, and adapters.

mod contract;
mod fs;
mod memory;
mod node;

pub use contract::Vault;
pub use fs::FsVault;
pub use memory::MemoryVault;
pub use node::{DocumentNode, FolderNode, FolderSummary, NodeKind, NodeRef, VaultChild};
