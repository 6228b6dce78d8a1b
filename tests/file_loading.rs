//! Exercises the file-based entry point end to end: real files on disk,
//! read through [`cdsc::ingest::CsnOnlyLoader`], following a `using from`
//! directive across files the way a multi-file project would.

use cdsc::ingest::{CsnOnlyLoader, FileCache};
use cdsc::{CompileOptions, compile_sync};

#[test]
fn compile_sync_follows_a_using_from_directive_across_two_files() {
    let dir = tempfile::tempdir().expect("create temp project dir");

    let common_path = dir.path().join("common.csn");
    std::fs::write(
        &common_path,
        r#"{
            "definitions": {
                "sap.common.Managed": {
                    "kind": "aspect",
                    "elements": { "createdAt": { "type": "cds.Timestamp" } }
                }
            }
        }"#,
    )
    .expect("write common.csn");

    let main_path = dir.path().join("main.csn");
    std::fs::write(
        &main_path,
        r#"{
            "definitions": {
                "my.bookshop.Orders": {
                    "kind": "entity",
                    "includes": ["sap.common.Managed"],
                    "elements": { "ID": { "key": true, "type": "cds.Integer" } }
                }
            }
        }"#,
    )
    .expect("write main.csn");

    let mut cache = FileCache::new();
    let model = compile_sync(
        vec![main_path, common_path],
        dir.path(),
        CompileOptions::default(),
        &mut cache,
        &CsnOnlyLoader,
    )
    .expect("compilation should succeed across both files");

    let orders_id = *model
        .definitions
        .get(&std::rc::Rc::from("my.bookshop.Orders"))
        .expect("Orders entity should be present");
    assert!(model.node(orders_id).elements.get(&std::rc::Rc::from("createdAt")).is_some());
}

#[test]
fn compile_sync_reports_a_load_error_for_a_missing_file() {
    let dir = tempfile::tempdir().expect("create temp project dir");
    let missing = dir.path().join("does-not-exist.csn");

    let mut cache = FileCache::new();
    let result = compile_sync(
        vec![missing],
        dir.path(),
        CompileOptions::default(),
        &mut cache,
        &CsnOnlyLoader,
    );
    assert!(matches!(result, Err(cdsc::CompileError::Load { .. })));
}

/// Confirms a project directory walked with `walkdir` (the way a real
/// caller would discover `.csn` files) yields a deterministic, sorted file
/// list independent of directory iteration order.
#[test]
fn walking_a_project_directory_finds_every_csn_file_in_sorted_order() {
    let dir = tempfile::tempdir().expect("create temp project dir");
    for name in ["b.csn", "a.csn", "c.csn"] {
        std::fs::write(dir.path().join(name), "{\"definitions\": {}}").unwrap();
    }

    let mut found: Vec<String> = walkdir::WalkDir::new(dir.path())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "csn"))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    found.sort();

    assert_eq!(found, vec!["a.csn", "b.csn", "c.csn"]);
}
