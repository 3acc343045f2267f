//! Library entry point for LightSession: keep long chat conversations light by
//! retaining only the most recent turns.
//!
//! The core lives in [`graph`]: a conversation is a parent-linked node
//! mapping plus a `current_node` pointer, and [`graph::trim`] projects it onto
//! its last N turns with every parent/child link kept consistent. Around it:
//!
//! - [`settings`] normalises the user-facing settings record,
//! - [`rewrite`] applies the trim to intercepted history responses,
//! - [`dom`] plans which rendered message elements to drop.
//!
//! This file also provides helpers to read and write payload files, used by
//! the CLI.

// Public modules
pub mod dom;
pub mod error;
pub mod graph;
pub mod model;
pub mod rewrite;
pub mod settings;
pub mod utils;

// Re-export primary types for ergonomic use.
pub use error::{LightSessionError, Result};
pub use graph::{trim, trim_value, trim_with_report, TrimReport, TurnGroup};
pub use model::{
    conversation_node::{ConversationMapping, ConversationNode},
    payload::ConversationPayload,
};
pub use settings::LightSessionSettings;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Load a conversation payload from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its contents do not
/// deserialize into a [`ConversationPayload`] (for example a non-object
/// `mapping`).
pub fn load_payload_json(path: &Path) -> Result<ConversationPayload> {
    let file = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(file)?)
}

/// Save a payload to a JSON file, pretty-printed when `pretty` is set.
pub fn save_payload_json(payload: &ConversationPayload, path: &Path, pretty: bool) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, payload)?;
    } else {
        serde_json::to_writer(&mut writer, payload)?;
    }
    writer.flush()?;
    Ok(())
}
