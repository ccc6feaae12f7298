//! Command line integration tests.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn atlas_url(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_atlas-url"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut child_stdin = child.stdin.take().unwrap();
        child_stdin.write_all(stdin.unwrap_or_default().as_bytes()).unwrap();
    }
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A path in the system temporary directory, unique to this test process.
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("atlas-url-{}-{name}", std::process::id()))
}

#[test]
fn encode_camera_from_stdin() {
    let output = atlas_url(
        &["encode", "--type", "Camera", "-"],
        Some(r#"{ "projection": "CARTESIAN", "center": { "x": 1.5, "y": -2.0 } }"#),
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    // base64 of 01 01 02 00 00 c0 3f 00 00 00 c0 00
    assert_eq!(stdout(&output), "AQECAADAPwAAAMAA\n");
}

#[test]
fn decode_camera() {
    let output = atlas_url(&["decode", "--type", "Camera", "AQECAADAPwAAAMAA"], None);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let json = serde_json::from_str::<serde_json::Value>(&stdout(&output)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "projection": "CARTESIAN", "center": { "x": 1.5, "y": -2.0 } }),
    );
}

#[test]
fn empty_payload() {
    let output = atlas_url(&["encode", "-"], Some("{}"));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "AA%3D%3D\n");

    let output = atlas_url(&["decode", "AA%3D%3D"], None);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "{}");
}

#[test]
fn encode_with_custom_schema() {
    let schema = temp_path("gene.kiwi");
    std::fs::write(&schema, "message Gene { string symbol = 1; }").unwrap();

    let output = atlas_url(
        &["encode", "--schema", schema.to_str().unwrap(), "--type", "Gene", "-"],
        Some(r#"{ "symbol": "Gfap" }"#),
    );
    std::fs::remove_file(&schema).unwrap();
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    // 01 04 'G' 'f' 'a' 'p' 00
    assert_eq!(stdout(&output), "AQRHZmFwAA%3D%3D\n");
}

#[test]
fn encode_rejects_unknown_fields() {
    let output = atlas_url(&["encode", "--type", "Gene", "-"], Some(r#"{ "name": "Gfap" }"#));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("`Gene` has no field named `name`"), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn decode_rejects_truncated_tokens() {
    let output = atlas_url(&["decode", "--type", "Camera", "AQECAADAPw%3D%3D"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to decode `Camera`"), "{}", stderr(&output));
}

#[test]
fn decode_rejects_malformed_tokens() {
    let output = atlas_url(&["decode", "AA="], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not valid base64"), "{}", stderr(&output));
}

#[test]
fn missing_input_file() {
    let output = atlas_url(&["check", "--schema", "does/not/exist.kiwi"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("couldn't read `does/not/exist.kiwi`"), "{}", stderr(&output));
}

#[test]
fn annotation_table() {
    let output_file = temp_path("annotations.json");
    let dendrogram = r#"{
        "annotations": [
            { "cell_set_accession": "CS20230722_SUBC_313", "labelset": "Subclass", "cell_label": "313 Astro-Epen" },
            { "cell_set_accession": "CS20230722_NT_01", "labelset": "neurotransmitter", "cell_label": "Glut" }
        ]
    }"#;

    let output = atlas_url(&["annotations", "-", output_file.to_str().unwrap()], Some(dendrogram));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stderr(&output).contains("payload table with 1 entries written"), "{}", stderr(&output));

    let table = std::fs::read_to_string(&output_file).unwrap();
    std::fs::remove_file(&output_file).unwrap();
    let table = serde_json::from_str::<std::collections::BTreeMap<String, String>>(&table).unwrap();
    assert_eq!(table.keys().collect::<Vec<_>>(), ["CS20230722_SUBC_313"]);

    let output = atlas_url(&["decode", &table["CS20230722_SUBC_313"]], None);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let payload = serde_json::from_str::<serde_json::Value>(&stdout(&output)).unwrap();
    assert_eq!(payload["layout"], "Quadruple");
    assert_eq!(payload["frames"].as_array().map(Vec::len), Some(4));
    assert_eq!(
        payload["frames"][0]["metadataFilters"][2],
        serde_json::json!({
            "categoryId": "SQ6WJO0GNUJGFU8LHVV",
            "selectedValues": ["313 Astro-Epen"],
        }),
    );
    assert_eq!(payload["frames"][0]["colorBy"]["value"], "SQ6WJO0GNUJGFU8LHVV");
}

#[test]
fn gene_table() {
    let output_file = temp_path("genes.json");
    let genes = "Cell_label\tLabelset\tMarkers_label\tdefined_class\n\
                 313 Astro-Epen\tSubclass\tGfap,Aqp4\tMS_0001\n";

    let output = atlas_url(&["genes", "-", output_file.to_str().unwrap()], Some(genes));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let table = std::fs::read_to_string(&output_file).unwrap();
    std::fs::remove_file(&output_file).unwrap();
    let table = serde_json::from_str::<std::collections::BTreeMap<String, String>>(&table).unwrap();

    let output = atlas_url(&["decode", &table["MS_0001"]], None);
    let payload = serde_json::from_str::<serde_json::Value>(&stdout(&output)).unwrap();
    assert_eq!(
        payload["frames"][3]["genes"],
        serde_json::json!([{ "symbol": "Gfap" }, { "symbol": "Aqp4" }]),
    );
}

#[test]
fn gene_table_without_key_column() {
    let output_file = temp_path("genes-missing-column.json");
    let output = atlas_url(
        &["genes", "-", output_file.to_str().unwrap()],
        Some("Cell_label\tLabelset\tMarkers_label\n"),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no `defined_class` column"), "{}", stderr(&output));
    assert!(!output_file.exists());
}
