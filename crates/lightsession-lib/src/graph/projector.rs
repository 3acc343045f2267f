//! Projection of a conversation onto its last N turns.
//!
//! [`trim`] is the single entry point used by both call sites (response
//! rewriting and offline trimming). Every failure path answers `None`, which
//! callers must treat as "leave the original payload untouched".

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::chain::build_chain;
use super::turns::{build_groups, TurnGroup};
use crate::model::conversation_node::ConversationMapping;
use crate::model::payload::ConversationPayload;

/// Summary of one successful trim, for logging and CLI output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrimReport {
    /// Nodes in the input mapping.
    pub original_nodes: usize,
    /// Nodes in the output mapping.
    pub retained_nodes: usize,
    /// Length of the root-to-current chain.
    pub chain_len: usize,
    /// Turn groups found along the chain.
    pub group_count: usize,
    /// First retained chain position.
    pub start_index: usize,
}

/// Chain position where the retention window starts.
///
/// With `groups.len() <= keep_last_n` the whole chain is kept (start 0);
/// otherwise the window starts at the first of the last `keep_last_n` groups.
/// Returns `None` when there are no groups or `keep_last_n` is zero.
pub fn retention_start(groups: &[TurnGroup], keep_last_n: usize) -> Option<usize> {
    if groups.is_empty() || keep_last_n == 0 {
        return None;
    }
    if groups.len() <= keep_last_n {
        return Some(0);
    }
    groups
        .get(groups.len() - keep_last_n)
        .map(|group| group.start_index)
}

/// Build a mapping holding only the nodes listed in `kept`, with parent and
/// children links restricted to that set. Ids in `kept` that are absent from
/// `mapping` are skipped.
pub fn project_mapping(mapping: &ConversationMapping, kept: &[String]) -> ConversationMapping {
    let keep_ids: HashSet<&str> = kept.iter().map(String::as_str).collect();
    kept.iter()
        .filter_map(|id| {
            mapping
                .get(id)
                .map(|node| (id.clone(), node.relinked(|other| keep_ids.contains(other))))
        })
        .collect()
}

/// Keep only the last `keep_last_n` turns of `payload`.
///
/// Returns `None` when the payload has no mapping or current node, when the
/// chain or the turn groups come out empty, or when `keep_last_n` is zero.
pub fn trim(payload: &ConversationPayload, keep_last_n: usize) -> Option<ConversationPayload> {
    trim_with_report(payload, keep_last_n).map(|(trimmed, _)| trimmed)
}

/// [`trim`], also returning a [`TrimReport`].
pub fn trim_with_report(
    payload: &ConversationPayload,
    keep_last_n: usize,
) -> Option<(ConversationPayload, TrimReport)> {
    let mapping = payload.mapping.as_ref().filter(|m| !m.is_empty())?;
    let current = payload.current_node.as_deref().filter(|c| !c.is_empty())?;

    let chain = build_chain(mapping, current);
    if chain.is_empty() {
        debug!(current, "current node not found in mapping; nothing to trim");
        return None;
    }

    let groups = build_groups(&chain, mapping);
    let Some(start_index) = retention_start(&groups, keep_last_n) else {
        debug!(
            chain_len = chain.len(),
            groups = groups.len(),
            keep_last_n,
            "no retention window; nothing to trim"
        );
        return None;
    };

    let kept = &chain[start_index..];
    let next_mapping = project_mapping(mapping, kept);

    // The chain ends at `current`, so it is normally retained; fall back to
    // the deepest chain node so the pointer always lands inside the mapping.
    let next_current = if kept.iter().any(|id| id == current) {
        current.to_owned()
    } else {
        chain.last()?.clone()
    };

    let report = TrimReport {
        original_nodes: mapping.len(),
        retained_nodes: next_mapping.len(),
        chain_len: chain.len(),
        group_count: groups.len(),
        start_index,
    };
    debug!(
        keep_last_n,
        original = report.original_nodes,
        retained = report.retained_nodes,
        groups = report.group_count,
        "trimmed conversation"
    );

    let trimmed = ConversationPayload {
        mapping: Some(next_mapping),
        current_node: Some(next_current),
        extra: payload.extra.clone(),
    };
    Some((trimmed, report))
}

/// [`trim`] over raw JSON. A value that is not a conversation payload
/// answers `None`, like any other untrimmable input.
pub fn trim_value(value: &Value, keep_last_n: usize) -> Option<Value> {
    let payload = ConversationPayload::deserialize(value).ok()?;
    let trimmed = trim(&payload, keep_last_n)?;
    serde_json::to_value(trimmed).ok()
}
