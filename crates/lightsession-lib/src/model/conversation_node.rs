// Every field the window logic does not interpret is carried in a flattened
// `extra` map so a projected node serialises back with its original payload.
use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient::{self, deserialize_from_fields};

/// Author block of a node's message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Author {
    /// Role classification ("user", "assistant", "system", "tool", "thinking", ...).
    /// A non-string value reads as absent and is kept in `extra`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Author {
    pub(crate) fn from_fields(mut fields: Map<String, Value>) -> Self {
        Self {
            role: lenient::take_string(&mut fields, "role"),
            extra: fields,
        }
    }
}

deserialize_from_fields!(Author);

/// Message payload attached to a node. Only `author` is interpreted; a
/// non-object `author` reads as absent and is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeMessage {
    pub(crate) fn from_fields(mut fields: Map<String, Value>) -> Self {
        Self {
            author: lenient::take_object(&mut fields, "author").map(Author::from_fields),
            extra: fields,
        }
    }
}

deserialize_from_fields!(NodeMessage);

/// One node of the conversation graph.
///
/// `parent`, `children` and `message` are all optional on the wire: a missing
/// or non-string parent reads as `None`, missing or non-array children read as
/// an empty list. A non-string `id` and a non-object `message` (`null`
/// included) read as absent but are kept in `extra` and written back as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub parent: Option<String>,
    pub children: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<NodeMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

deserialize_from_fields!(ConversationNode);

impl ConversationNode {
    pub(crate) fn from_fields(mut fields: Map<String, Value>) -> Self {
        let id = lenient::take_string(&mut fields, "id");
        let parent = match fields.remove("parent") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let children = fields
            .remove("children")
            .map(lenient::string_list)
            .unwrap_or_default();
        let message = lenient::take_object(&mut fields, "message").map(NodeMessage::from_fields);
        Self {
            id,
            parent,
            children,
            message,
            extra: fields,
        }
    }

    /// Create a bare node carrying only its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Builder: set the parent reference.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder: set the child references.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: attach a message authored by `role`.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.message = Some(NodeMessage {
            author: Some(Author {
                role: Some(role.into()),
                extra: Map::new(),
            }),
            extra: Map::new(),
        });
        self
    }

    /// Parent id, treating an empty string the same as no parent.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref().filter(|p| !p.is_empty())
    }

    /// `message.author.role`, if present and non-empty.
    pub fn author_role(&self) -> Option<&str> {
        self.message
            .as_ref()?
            .author
            .as_ref()?
            .role
            .as_deref()
            .filter(|r| !r.is_empty())
    }

    /// Copy of this node whose parent and children are restricted to ids
    /// accepted by `keep`. A rejected parent becomes `None`.
    pub fn relinked<F>(&self, keep: F) -> ConversationNode
    where
        F: Fn(&str) -> bool,
    {
        ConversationNode {
            id: self.id.clone(),
            parent: self.parent_id().filter(|p| keep(p)).map(str::to_owned),
            children: self
                .children
                .iter()
                .filter(|c| keep(c.as_str()))
                .cloned()
                .collect(),
            message: self.message.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Keyed collection of conversation nodes.
///
/// Backed by an ordered map so iteration and serialisation are deterministic.
/// Links between nodes are not validated: dangling parents, missing children
/// and cycles are all representable. Entries that are not JSON objects are
/// not nodes; they are invisible to lookups but serialise back unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationMapping {
    nodes: BTreeMap<String, ConversationNode>,
    malformed: BTreeMap<String, Value>,
}

impl ConversationMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_fields(entries: Map<String, Value>) -> Self {
        let mut mapping = Self::new();
        for (id, entry) in entries {
            match entry {
                Value::Object(fields) => {
                    mapping.nodes.insert(id, ConversationNode::from_fields(fields));
                }
                other => {
                    mapping.malformed.insert(id, other);
                }
            }
        }
        mapping
    }

    /// Insert `node` under `id`, replacing any node or malformed entry there.
    pub fn insert(&mut self, id: impl Into<String>, node: ConversationNode) {
        let id = id.into();
        self.malformed.remove(&id);
        self.nodes.insert(id, node);
    }

    pub fn get(&self, id: &str) -> Option<&ConversationNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of well-formed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Keys whose entries were not JSON objects.
    pub fn malformed_ids(&self) -> impl Iterator<Item = &str> {
        self.malformed.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConversationNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }
}

impl Serialize for ConversationMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Entry<'a> {
            Node(&'a ConversationNode),
            Raw(&'a Value),
        }

        let entries: BTreeMap<&str, Entry<'_>> = self
            .nodes
            .iter()
            .map(|(id, node)| (id.as_str(), Entry::Node(node)))
            .chain(self.malformed.iter().map(|(id, raw)| (id.as_str(), Entry::Raw(raw))))
            .collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (id, entry) in &entries {
            map.serialize_entry(id, entry)?;
        }
        map.end()
    }
}

deserialize_from_fields!(ConversationMapping);

impl FromIterator<(String, ConversationNode)> for ConversationMapping {
    fn from_iter<T: IntoIterator<Item = (String, ConversationNode)>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
            malformed: BTreeMap::new(),
        }
    }
}

impl FromIterator<ConversationNode> for ConversationMapping {
    /// Collect nodes keyed by their own `id`; nodes without an id are dropped.
    fn from_iter<T: IntoIterator<Item = ConversationNode>>(iter: T) -> Self {
        Self {
            nodes: iter
                .into_iter()
                .filter_map(|node| node.id.clone().map(|id| (id, node)))
                .collect(),
            malformed: BTreeMap::new(),
        }
    }
}
