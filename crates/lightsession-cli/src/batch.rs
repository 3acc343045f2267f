// Trimming of conversation files on disk. Each file is an independent job; a
// file that cannot be trimmed is emitted unchanged, mirroring how the network
// rewriter passes untrimmable responses through.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lightsession::{trim_with_report, ConversationPayload, TrimReport};
use rayon::prelude::*;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub(crate) struct TrimOptions {
    /// Turns to keep, already resolved from settings/flags.
    pub(crate) window: usize,
    pub(crate) pretty: bool,
}

#[derive(Debug)]
pub(crate) struct FileOutcome {
    pub(crate) input: PathBuf,
    /// Bytes to write: the trimmed JSON, or the original bytes on pass-through.
    pub(crate) output: Vec<u8>,
    /// `None` when the file was passed through untouched.
    pub(crate) report: Option<TrimReport>,
}

impl FileOutcome {
    pub(crate) fn summary(&self) -> String {
        match &self.report {
            Some(r) => format!(
                "{}: kept {} of {} nodes ({} turns on the current branch, window starts at {})",
                self.input.display(),
                r.retained_nodes,
                r.original_nodes,
                r.group_count,
                r.start_index
            ),
            None => format!("{}: passed through unchanged", self.input.display()),
        }
    }
}

/// Trim already-read file contents.
pub(crate) fn trim_bytes(input: &Path, bytes: Vec<u8>, options: TrimOptions) -> Result<FileOutcome> {
    let payload = match ConversationPayload::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(input = %input.display(), error = %err, "not a conversation payload; passing through");
            return Ok(FileOutcome {
                input: input.to_path_buf(),
                output: bytes,
                report: None,
            });
        }
    };

    let Some((trimmed, report)) = trim_with_report(&payload, options.window) else {
        debug!(input = %input.display(), "nothing to trim; passing through");
        return Ok(FileOutcome {
            input: input.to_path_buf(),
            output: bytes,
            report: None,
        });
    };

    let output = if options.pretty {
        serde_json::to_vec_pretty(&trimmed)
    } else {
        serde_json::to_vec(&trimmed)
    }
    .with_context(|| format!("serialising trimmed {}", input.display()))?;

    Ok(FileOutcome {
        input: input.to_path_buf(),
        output,
        report: Some(report),
    })
}

/// Read and trim one file.
pub(crate) fn trim_file(input: &Path, options: TrimOptions) -> Result<FileOutcome> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    trim_bytes(input, bytes, options)
}

/// Trim several files in parallel, preserving input order in the result.
pub(crate) fn trim_files(inputs: &[PathBuf], options: TrimOptions) -> Result<Vec<FileOutcome>> {
    inputs
        .par_iter()
        .map(|input| trim_file(input, options))
        .collect()
}

/// Destination for `input` inside `out_dir`, keeping the file name.
pub(crate) fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => out_dir.join(name),
        None => out_dir.join("conversation.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn options(window: usize) -> TrimOptions {
        TrimOptions {
            window,
            pretty: false,
        }
    }

    fn conversation_bytes() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "current_node": "a2",
            "mapping": {
                "u1": { "id": "u1", "parent": null, "children": ["a1"], "message": { "author": { "role": "user" } } },
                "a1": { "id": "a1", "parent": "u1", "children": ["u2"], "message": { "author": { "role": "assistant" } } },
                "u2": { "id": "u2", "parent": "a1", "children": ["a2"], "message": { "author": { "role": "user" } } },
                "a2": { "id": "a2", "parent": "u2", "children": [], "message": { "author": { "role": "assistant" } } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn trims_a_conversation() {
        let outcome = trim_bytes(Path::new("c.json"), conversation_bytes(), options(2)).unwrap();
        let report = outcome.report.as_ref().expect("trimmed");
        assert_eq!(report.retained_nodes, 2);

        let value: Value = serde_json::from_slice(&outcome.output).unwrap();
        assert!(value["mapping"].get("u2").is_some());
        assert!(value["mapping"].get("a1").is_none());
        assert!(outcome.summary().contains("kept 2 of 4 nodes"));
    }

    #[test]
    fn non_payloads_pass_through_byte_for_byte() {
        let raw = b"[1, 2, 3]".to_vec();
        let outcome = trim_bytes(Path::new("list.json"), raw.clone(), options(2)).unwrap();
        assert!(outcome.report.is_none());
        assert_eq!(outcome.output, raw);

        let raw = br#"{ "mapping": {}, "current_node": "x" }"#.to_vec();
        let outcome = trim_bytes(Path::new("empty.json"), raw.clone(), options(2)).unwrap();
        assert!(outcome.report.is_none());
        assert_eq!(outcome.output, raw);
        assert!(outcome.summary().ends_with("passed through unchanged"));
    }

    #[test]
    fn parallel_batch_keeps_input_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut inputs = Vec::new();
        for i in 0..4 {
            let path = dir.path().join(format!("c{i}.json"));
            fs::write(&path, conversation_bytes())?;
            inputs.push(path);
        }
        let outcomes = trim_files(&inputs, options(1))?;
        let order: Vec<&PathBuf> = outcomes.iter().map(|o| &o.input).collect();
        assert_eq!(order, inputs.iter().collect::<Vec<_>>());
        assert!(outcomes.iter().all(|o| o.report.is_some()));
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = trim_file(Path::new("/definitely/not/here.json"), options(1)).unwrap_err();
        assert!(err.to_string().contains("reading"));
    }

    #[test]
    fn output_path_keeps_file_name() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/in/chat.json")),
            PathBuf::from("/out/chat.json")
        );
    }
}
