//! Read-only views over recorded entries: a prefix tree and the tables
//! derived from it. Nothing here touches the recording registries.

pub mod table;
pub mod tree;

pub use table::Table;
pub use tree::{EntryTree, Lookup};
