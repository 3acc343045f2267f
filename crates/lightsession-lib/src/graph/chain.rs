use std::collections::HashSet;

use tracing::trace;

use crate::model::conversation_node::ConversationMapping;

/// Upper bound on parent hops taken by [`build_chain`].
pub const MAX_CHAIN_STEPS: usize = 1000;

/// Walk parent links from `current_id` towards the root and return the path
/// root-first, so index 0 is the root-most reachable ancestor and the last
/// element is `current_id`.
///
/// The walk stops at the first of: an empty or missing parent, a parent id
/// not present in `mapping`, an id already visited (cycle), or
/// [`MAX_CHAIN_STEPS`] hops. Stopping early yields a truncated chain, not an
/// error. An unknown `current_id` yields an empty chain.
pub fn build_chain<'a>(mapping: &'a ConversationMapping, current_id: &'a str) -> Vec<String> {
    let mut visited: HashSet<&'a str> = HashSet::new();
    let mut chain: Vec<String> = Vec::new();
    let mut cursor: Option<&'a str> = Some(current_id).filter(|id| !id.is_empty());

    while let Some(id) = cursor {
        if chain.len() >= MAX_CHAIN_STEPS {
            trace!(current_id, steps = chain.len(), "chain truncated at step ceiling");
            break;
        }
        let Some(node) = mapping.get(id) else {
            break;
        };
        if !visited.insert(id) {
            trace!(current_id, revisited = id, "cycle detected while building chain");
            break;
        }
        chain.push(id.to_owned());
        cursor = node.parent_id();
    }

    chain.reverse();
    chain
}
