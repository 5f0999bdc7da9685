//! Input validation for the concatenator.
//!
//! None of these touch FFmpeg: the files are empty placeholders, and
//! validation must reject bad inputs before anything is decoded.

use std::fs::File;
use std::path::PathBuf;

use vidkit::validation::validate_inputs;
use vidkit::{Concatenator, SUPPORTED_EXTENSIONS, VidkitError, has_supported_extension};

fn touch(directory: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = directory.path().join(name);
    File::create(&path).expect("create placeholder");
    path
}

#[test]
fn every_listed_extension_is_accepted() {
    for extension in SUPPORTED_EXTENSIONS {
        assert!(has_supported_extension(format!("clip.{extension}")));
        assert!(has_supported_extension(format!(
            "clip.{}",
            extension.to_ascii_uppercase()
        )));
    }
}

#[test]
fn existing_supported_files_pass() {
    let directory = tempfile::tempdir().expect("temp dir");
    let inputs = [touch(&directory, "a.mp4"), touch(&directory, "b.MKV")];
    validate_inputs(&inputs).expect("valid inputs");
}

#[test]
fn missing_file_is_reported_by_path() {
    let directory = tempfile::tempdir().expect("temp dir");
    let present = touch(&directory, "a.mp4");
    let missing = directory.path().join("missing.mp4");

    let error = validate_inputs(&[present, missing.clone()]).unwrap_err();
    match &error {
        VidkitError::FileOpen { path, .. } => assert_eq!(path, &missing),
        other => panic!("expected FileOpen, got {other:?}"),
    }
    assert!(error.to_string().contains("does not exist"), "{error}");
}

#[test]
fn unsupported_extension_is_rejected() {
    let directory = tempfile::tempdir().expect("temp dir");
    let inputs = [touch(&directory, "a.mp4"), touch(&directory, "notes.txt")];

    let error = validate_inputs(&inputs).unwrap_err();
    assert!(matches!(error, VidkitError::UnsupportedExtension { .. }));
    assert!(
        error.to_string().ends_with("has an unsupported extension."),
        "{error}"
    );
}

#[test]
fn first_problem_wins() {
    let directory = tempfile::tempdir().expect("temp dir");
    let bad_extension = touch(&directory, "a.gif");
    let missing = directory.path().join("b.mp4");

    let error = validate_inputs(&[bad_extension, missing]).unwrap_err();
    assert!(matches!(error, VidkitError::UnsupportedExtension { .. }));
}

#[test]
fn concatenator_validates_before_decoding() {
    let directory = tempfile::tempdir().expect("temp dir");
    let output = directory.path().join("out.mp4");
    let result = Concatenator::new(&output)
        .input(touch(&directory, "a.mp4"))
        .input(touch(&directory, "b.doc"))
        .run();

    assert!(matches!(result, Err(VidkitError::UnsupportedExtension { .. })));
    assert!(!output.exists(), "nothing should be written on validation failure");
}
