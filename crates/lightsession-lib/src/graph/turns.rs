use serde::Serialize;

use crate::model::conversation_node::{ConversationMapping, ConversationNode};

/// Roles that never form or extend a turn group.
pub const EXCLUDED_ROLES: [&str; 3] = ["system", "tool", "thinking"];

pub fn is_excluded_role(role: &str) -> bool {
    EXCLUDED_ROLES.contains(&role)
}

/// Strategy for reading a node's author role.
///
/// The grouping logic only needs `role_of`; the source of the role (message
/// metadata, or some presentation-level heuristic) stays behind this trait.
pub trait RoleClassifier {
    fn role_of<'n>(&self, node: &'n ConversationNode) -> Option<&'n str>;
}

/// Reads `message.author.role`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorRole;

impl RoleClassifier for AuthorRole {
    fn role_of<'n>(&self, node: &'n ConversationNode) -> Option<&'n str> {
        node.author_role()
    }
}

/// A maximal run of chain positions sharing one author role.
///
/// `start_index` and `end_index` are inclusive positions in the chain. The
/// span may cover skipped positions (excluded or role-less nodes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnGroup {
    pub start_index: usize,
    pub end_index: usize,
    pub role: String,
}

impl TurnGroup {
    /// Number of chain positions covered, skipped positions included.
    pub fn span(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Group `chain` into turns using the message author role.
pub fn build_groups(chain: &[String], mapping: &ConversationMapping) -> Vec<TurnGroup> {
    build_groups_with(chain, mapping, &AuthorRole)
}

/// Group `chain` into turns using `classifier` to read roles.
///
/// Positions with no role, or with a role in [`EXCLUDED_ROLES`], are skipped
/// and do not reset the last seen role. Consequently two runs of the same role
/// separated only by skipped positions merge into one group.
pub fn build_groups_with<C>(
    chain: &[String],
    mapping: &ConversationMapping,
    classifier: &C,
) -> Vec<TurnGroup>
where
    C: RoleClassifier + ?Sized,
{
    let mut groups: Vec<TurnGroup> = Vec::new();
    let mut last_role: Option<&str> = None;

    for (index, id) in chain.iter().enumerate() {
        let Some(role) = mapping.get(id).and_then(|node| classifier.role_of(node)) else {
            continue;
        };
        if is_excluded_role(role) {
            continue;
        }

        if last_role == Some(role) {
            if let Some(group) = groups.last_mut() {
                group.end_index = index;
                continue;
            }
        }

        groups.push(TurnGroup {
            start_index: index,
            end_index: index,
            role: role.to_owned(),
        });
        last_role = Some(role);
    }

    groups
}
