//! Tests for loading and chunking documents from a directory.

use std::fs;

use docqa_rag::{RagError, load_documents, process_documents};

fn sample_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b_cooking.txt"), "Boil water. Add pasta.").unwrap();
    fs::write(dir.path().join("a_ml.txt"), "M".repeat(450)).unwrap();
    fs::write(dir.path().join("notes.md"), "not a document").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested").join("deep.txt"), "skipped").unwrap();
    dir
}

#[test]
fn only_top_level_text_files_are_loaded_in_name_order() {
    let dir = sample_dir();
    let docs = load_documents(dir.path()).unwrap();

    let sources: Vec<&str> = docs.iter().map(|d| d.metadata.source.as_str()).collect();
    assert_eq!(sources, vec!["a_ml.txt", "b_cooking.txt"]);
    assert_eq!(docs[1].content, "Boil water. Add pasta.");
    assert!(docs[1].metadata.path.ends_with("b_cooking.txt"));
}

#[test]
fn empty_directory_has_no_documents() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_documents(dir.path()).unwrap().is_empty());
    assert!(process_documents(dir.path(), 100, 10).unwrap().is_empty());
}

#[test]
fn processing_chunks_every_document() {
    let dir = sample_dir();
    let chunks = process_documents(dir.path(), 200, 50).unwrap();

    // 450 chars with step 150: windows at 0, 150, 300 (the last reaches the end).
    let ml: Vec<_> = chunks.iter().filter(|c| c.metadata.source == "a_ml.txt").collect();
    assert_eq!(ml.len(), 3);
    assert!(ml.iter().all(|c| c.metadata.total_chunks == 3));
    assert_eq!(ml.iter().map(|c| c.metadata.chunk_index).collect::<Vec<_>>(), vec![0, 1, 2]);

    let cooking: Vec<_> = chunks.iter().filter(|c| c.metadata.source == "b_cooking.txt").collect();
    assert_eq!(cooking.len(), 1);
    assert_eq!(cooking[0].content, "Boil water. Add pasta.");
}

#[test]
fn invalid_window_is_rejected_before_reading() {
    let err = process_documents("/definitely/not/a/dir", 100, 100).unwrap_err();
    assert!(matches!(err, RagError::Validation(_)));
}

#[test]
fn missing_directory_is_an_io_error() {
    let err = load_documents("/definitely/not/a/dir").unwrap_err();
    assert!(matches!(err, RagError::Io { ref path, .. } if path.ends_with("dir")));
}
