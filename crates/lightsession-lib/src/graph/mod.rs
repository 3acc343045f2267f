//! Conversation-window selection over a parent-linked node graph.
//!
//! The pipeline runs in three steps, each in its own submodule:
//!
//! 1. [`chain::build_chain`] walks parent links from the current node back to
//!    the root and returns the path root-first.
//! 2. [`turns::build_groups`] splits that path into turns, i.e. maximal runs of
//!    the same author role.
//! 3. [`projector::trim`] keeps the last N turns and rebuilds a mapping whose
//!    parent/child links only point at retained nodes.
//!
//! Everything here is a pure function of its inputs; no state survives a call.

pub mod chain;
pub mod projector;
pub mod turns;

pub use chain::{build_chain, MAX_CHAIN_STEPS};
pub use projector::{project_mapping, retention_start, trim, trim_value, trim_with_report, TrimReport};
pub use turns::{
    build_groups, build_groups_with, is_excluded_role, AuthorRole, RoleClassifier, TurnGroup,
    EXCLUDED_ROLES,
};
