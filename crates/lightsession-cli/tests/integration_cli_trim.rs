use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::process::Command;

/// Integration test: run the `lightsession` binary against files on disk.
///
/// The fixture is a short conversation with a system prompt and a trailing
/// tool call, so both the turn grouping and the link repair are exercised
/// end-to-end through the CLI.
fn fixture() -> Value {
    json!({
        "title": "cli fixture",
        "current_node": "t1",
        "mapping": {
            "root": { "id": "root", "parent": null, "children": ["u1"], "message": { "author": { "role": "system" } } },
            "u1": { "id": "u1", "parent": "root", "children": ["a1"], "message": { "author": { "role": "user" } } },
            "a1": { "id": "a1", "parent": "u1", "children": ["a2"], "message": { "author": { "role": "assistant" } } },
            "a2": { "id": "a2", "parent": "a1", "children": ["u2"], "message": { "author": { "role": "assistant" } } },
            "u2": { "id": "u2", "parent": "a2", "children": ["a3"], "message": { "author": { "role": "user" } } },
            "a3": { "id": "a3", "parent": "u2", "children": ["t1"], "message": { "author": { "role": "assistant" } } },
            "t1": { "id": "t1", "parent": "a3", "children": [], "message": { "author": { "role": "tool" } } }
        }
    })
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lightsession"))
}

#[test]
fn trim_single_file_to_stdout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("chat.json");
    fs::write(&input, serde_json::to_vec(&fixture())?)?;

    let output = bin().arg("trim").arg(&input).args(["--keep", "2"]).output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value: Value = serde_json::from_slice(&output.stdout)?;
    let mut kept: Vec<&String> = value["mapping"].as_object().unwrap().keys().collect();
    kept.sort();
    assert_eq!(kept, vec!["a3", "t1", "u2"]);
    assert_eq!(value["title"], json!("cli fixture"));
    assert_eq!(value["current_node"], json!("t1"));
    Ok(())
}

#[test]
fn trim_many_files_into_out_dir() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = dir.path().join("settings.json");
    fs::write(
        &settings,
        serde_json::to_vec(&json!({ "lightsession_settings": { "enabled": true, "keepLastN": 1 } }))?,
    )?;
    let chat = dir.path().join("chat.json");
    fs::write(&chat, serde_json::to_vec(&fixture())?)?;
    let other = dir.path().join("other.json");
    fs::write(&other, b"{\"not\": \"a conversation\"}")?;
    let out_dir = dir.path().join("out");

    let output = bin()
        .arg("trim")
        .arg(&chat)
        .arg(&other)
        .arg("--settings")
        .arg(&settings)
        .arg("--out-dir")
        .arg(&out_dir)
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let trimmed: Value = serde_json::from_slice(&fs::read(out_dir.join("chat.json"))?)?;
    let mut kept: Vec<&String> = trimmed["mapping"].as_object().unwrap().keys().collect();
    kept.sort();
    assert_eq!(kept, vec!["a3", "t1"]);

    // Untrimmable input is copied byte for byte.
    assert_eq!(fs::read(out_dir.join("other.json"))?, b"{\"not\": \"a conversation\"}");
    Ok(())
}

#[test]
fn multiple_inputs_without_out_dir_fail() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    fs::write(&a, b"{}")?;
    fs::write(&b, b"{}")?;

    let output = bin().arg("trim").arg(&a).arg(&b).output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--out-dir"));
    Ok(())
}

#[test]
fn inspect_reports_groups_as_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("chat.json");
    fs::write(&input, serde_json::to_vec(&fixture())?)?;

    let output = bin()
        .arg("inspect")
        .arg(&input)
        .args(["--keep", "2", "--json"])
        .output()?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["chain"].as_array().map(Vec::len), Some(7));
    assert_eq!(value["groups"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["start_index"], json!(4));
    assert_eq!(value["groups"][1], json!({ "start_index": 2, "end_index": 3, "role": "assistant" }));
    Ok(())
}
