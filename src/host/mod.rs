//! Collaborator interfaces the bridge consumes, plus in-memory implementations of them.

/// In-memory nodes, row sources and effects.
pub mod synthetic;
/// Effect, node and row-source traits.
pub mod traits;
