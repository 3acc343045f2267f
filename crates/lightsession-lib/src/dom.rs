//! Removal planning for rendered message elements.
//!
//! The page side supplies message elements in document order, each with the
//! role declared on the element (if any) and the role it was classified as.
//! This module decides which of them to remove; finding and classifying the
//! elements, and removing them, belong to the host.
//!
//! Unlike the graph projection this counts individual messages, not turns.
//! The two views are tuned separately and may disagree on what is visible.

use serde::{Deserialize, Serialize};

/// One rendered message element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageElement {
    /// Role declared by the element itself, if any.
    pub declared_role: Option<String>,
    /// Role assigned by the host's classifier ("user", "assistant", "unknown", ...).
    pub role: Option<String>,
}

impl MessageElement {
    pub fn declared(role: &str) -> Self {
        Self {
            declared_role: Some(role.to_string()),
            role: Some(role.to_string()),
        }
    }

    pub fn inferred(role: &str) -> Self {
        Self {
            declared_role: None,
            role: Some(role.to_string()),
        }
    }

    fn is_conversational(&self) -> bool {
        matches!(self.role.as_deref(), Some("user" | "assistant"))
    }
}

/// Where counting starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Start one message before the first declared user message (or at the
    /// first declared assistant message when no user message is declared).
    #[default]
    FirstUserMessage,
    /// Count every conversational message.
    Beginning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomWindowPlanner {
    pub keep_last_n: usize,
    pub anchor: Anchor,
}

impl DomWindowPlanner {
    pub fn new(keep_last_n: usize) -> Self {
        Self {
            keep_last_n,
            anchor: Anchor::default(),
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Indices into `elements` to remove, in document order.
    ///
    /// Only `user`/`assistant` elements are ever counted or removed. Nothing
    /// is removed while the counted messages fit in `keep_last_n`.
    pub fn plan_removals(&self, elements: &[MessageElement]) -> Vec<usize> {
        let valid: Vec<usize> = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.is_conversational())
            .map(|(index, _)| index)
            .collect();

        let start = match self.anchor {
            Anchor::Beginning => 0,
            Anchor::FirstUserMessage => anchor_position(&valid, elements),
        };
        let considered = &valid[start..];

        if considered.len() <= self.keep_last_n {
            return Vec::new();
        }
        considered[..considered.len() - self.keep_last_n].to_vec()
    }
}

/// Position within `valid` where counting starts for [`Anchor::FirstUserMessage`].
fn anchor_position(valid: &[usize], elements: &[MessageElement]) -> usize {
    let declared = |position: usize, role: &str| {
        elements[valid[position]].declared_role.as_deref() == Some(role)
    };

    if let Some(first_user) = (0..valid.len()).find(|&p| declared(p, "user")) {
        return first_user.saturating_sub(1);
    }
    (0..valid.len())
        .find(|&p| declared(p, "assistant"))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(pairs: usize) -> Vec<MessageElement> {
        (0..pairs)
            .flat_map(|_| [MessageElement::declared("user"), MessageElement::declared("assistant")])
            .collect()
    }

    #[test]
    fn removes_oldest_messages_beyond_window() {
        let elements = conversation(3);
        assert_eq!(DomWindowPlanner::new(4).plan_removals(&elements), vec![0, 1]);
        assert_eq!(DomWindowPlanner::new(1).plan_removals(&elements), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn nothing_removed_when_within_window() {
        let elements = conversation(2);
        assert!(DomWindowPlanner::new(4).plan_removals(&elements).is_empty());
        assert!(DomWindowPlanner::new(10).plan_removals(&elements).is_empty());
        assert!(DomWindowPlanner::new(1).plan_removals(&[]).is_empty());
    }

    #[test]
    fn non_conversational_elements_are_never_removed() {
        let elements = vec![
            MessageElement::inferred("unknown"),
            MessageElement::declared("user"),
            MessageElement::declared("system"),
            MessageElement::declared("assistant"),
            MessageElement::declared("user"),
            MessageElement::declared("assistant"),
        ];
        assert_eq!(DomWindowPlanner::new(2).plan_removals(&elements), vec![1, 3]);
    }

    #[test]
    fn anchor_protects_messages_before_the_first_declared_user() {
        // Two inferred assistant messages precede the first declared user
        // message; counting starts one message before it.
        let elements = vec![
            MessageElement::inferred("assistant"),
            MessageElement::inferred("assistant"),
            MessageElement::declared("user"),
            MessageElement::declared("assistant"),
            MessageElement::declared("user"),
            MessageElement::declared("assistant"),
        ];
        assert_eq!(DomWindowPlanner::new(2).plan_removals(&elements), vec![1, 2, 3]);

        let plain = DomWindowPlanner::new(2).with_anchor(Anchor::Beginning);
        assert_eq!(plain.plan_removals(&elements), vec![0, 1, 2, 3]);
    }

    #[test]
    fn anchor_falls_back_to_first_declared_assistant() {
        let elements = vec![
            MessageElement::inferred("user"),
            MessageElement::declared("assistant"),
            MessageElement::inferred("user"),
            MessageElement::declared("assistant"),
        ];
        assert_eq!(DomWindowPlanner::new(1).plan_removals(&elements), vec![1, 2]);
    }

    #[test]
    fn undeclared_conversation_counts_from_the_beginning() {
        let elements = vec![
            MessageElement::inferred("user"),
            MessageElement::inferred("assistant"),
            MessageElement::inferred("user"),
        ];
        assert_eq!(DomWindowPlanner::new(1).plan_removals(&elements), vec![0, 1]);
    }
}
