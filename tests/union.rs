//! Concatenation integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use vidkit::{Concatenator, MediaProbe};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_mkv_path() -> &'static str {
    "tests/fixtures/sample_video_small.mkv"
}

#[test]
fn join_two_copies() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("twice.mp4");
    let report = Concatenator::new(&output)
        .inputs([path, path])
        .run()
        .expect("concatenate");

    assert_eq!(report.inputs, 2);
    assert!(report.video_frames > 0);
    assert!(report.audio_samples > 0);

    let source = MediaProbe::probe(path).unwrap().duration.as_secs_f64();
    let joined = MediaProbe::probe(&output).unwrap();
    let seconds = joined.duration.as_secs_f64();
    assert!(
        (seconds - 2.0 * source).abs() < 0.5,
        "joined {seconds:.3}s from two {source:.3}s inputs"
    );
    assert_eq!(joined.audio_tracks.len(), 1);
}

#[test]
fn mixed_inputs_take_the_first_size() {
    let first = sample_video_path();
    let second = sample_mkv_path();
    if !Path::new(first).exists() || !Path::new(second).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("mixed.mp4");
    Concatenator::new(&output)
        .input(first)
        .input(second)
        .run()
        .expect("concatenate");

    let expected = MediaProbe::probe(first).unwrap().video.unwrap();
    let video = MediaProbe::probe(&output).unwrap().video.unwrap();
    assert_eq!((video.width, video.height), (expected.width, expected.height));
    assert_eq!(video.codec, "h264");
}

#[test]
fn single_input_is_reencoded() {
    let path = sample_mkv_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("single.mp4");
    let report = Concatenator::new(&output).input(path).run().expect("concatenate");

    assert_eq!(report.inputs, 1);
    assert!(output.exists());
}
