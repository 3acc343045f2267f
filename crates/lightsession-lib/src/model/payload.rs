use serde::Serialize;
use serde_json::{Map, Value};

use super::conversation_node::ConversationMapping;
use super::lenient::{self, deserialize_from_fields};
use crate::error::Result;

/// A conversation-history document: the node mapping, the pointer to the
/// current node, and any other top-level fields (title, timestamps, ...)
/// which are passed through untouched.
///
/// A non-object `mapping` or non-string `current_node` reads as absent (so
/// the payload is untrimmable) and is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<ConversationMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

deserialize_from_fields!(ConversationPayload);

impl ConversationPayload {
    pub(crate) fn from_fields(mut fields: Map<String, Value>) -> Self {
        Self {
            mapping: lenient::take_object(&mut fields, "mapping")
                .map(ConversationMapping::from_fields),
            current_node: lenient::take_string(&mut fields, "current_node"),
            extra: fields,
        }
    }

    pub fn new(mapping: ConversationMapping, current_node: impl Into<String>) -> Self {
        Self {
            mapping: Some(mapping),
            current_node: Some(current_node.into()),
            extra: Map::new(),
        }
    }

    /// Parse a payload from raw JSON bytes (e.g. a response body).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialise to compact JSON bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Number of nodes in the mapping (0 when the mapping is absent).
    pub fn node_count(&self) -> usize {
        self.mapping.as_ref().map_or(0, ConversationMapping::len)
    }
}
