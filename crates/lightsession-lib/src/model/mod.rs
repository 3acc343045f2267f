pub mod conversation_node;
mod lenient;
pub mod payload;
