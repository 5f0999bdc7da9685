//! Compressor integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;
use std::time::Duration;

use vidkit::{
    Bitrate, COMPRESSED_AUDIO_BITRATE, CompressionTarget, Compressor, MediaProbe,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn plan_with_bitrate_keeps_it() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let target = CompressionTarget::Bitrate(Bitrate::from_kilobits(400));
    let plan = Compressor::new(path, "unused.mp4", target).plan().unwrap();

    assert_eq!(plan.video_bitrate, Bitrate::from_kilobits(400));
    assert_eq!(plan.audio_bitrate, COMPRESSED_AUDIO_BITRATE);
    assert!(plan.estimate.is_none());
    assert!(plan.duration > Duration::from_secs(4));
}

#[test]
fn plan_with_size_uses_whole_kilobits() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let plan = Compressor::new(path, "unused.mp4", CompressionTarget::FileSize(2.0))
        .plan()
        .unwrap();
    let estimate = plan.estimate.expect("size targets carry an estimate");

    assert_eq!(plan.video_bitrate.bits_per_second() % 1000, 0);
    assert_eq!(
        plan.video_bitrate.kilobits(),
        estimate.video_bitrate.kilobits()
    );
    assert!(estimate.available_video_mb > 0.0);
}

#[test]
fn plan_does_not_write() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("never.mp4");
    let _plan = Compressor::new(path, &output, CompressionTarget::FileSize(2.0))
        .plan()
        .unwrap();
    assert!(!output.exists());
}

#[test]
fn compress_to_bitrate() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("small.mp4");
    let target = CompressionTarget::Bitrate(Bitrate::from_kilobits(200));
    let _plan = Compressor::new(path, &output, target).run().expect("compress");

    let source = MediaProbe::probe(path).unwrap();
    let result = MediaProbe::probe(&output).unwrap();

    let source_video = source.video.unwrap();
    let result_video = result.video.expect("video survives");
    assert_eq!(result_video.width, source_video.width);
    assert_eq!(result_video.height, source_video.height);
    assert_eq!(result.audio_tracks.len(), 1);

    let drift = result.duration.as_secs_f64() - source.duration.as_secs_f64();
    assert!(drift.abs() < 0.5, "duration drifted by {drift:.3}s");
}

#[test]
fn compress_to_size_lands_near_target() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("sized.mp4");
    let target_mb = 1.0;
    let _plan = Compressor::new(path, &output, CompressionTarget::FileSize(target_mb))
        .run()
        .expect("compress");

    // Rate control on a five second clip is loose; only catch gross misses.
    let written = std::fs::metadata(&output).unwrap().len() as f64 / (1024.0 * 1024.0);
    assert!(written > 0.0);
    assert!(written < target_mb * 3.0, "wrote {written:.2}MB");
}

#[test]
fn encode_follows_an_existing_plan() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("planned.mp4");
    let compressor = Compressor::new(path, &output, CompressionTarget::FileSize(1.0));
    let plan = compressor.plan().unwrap();

    let report = compressor
        .encode(&plan, &vidkit::JobOptions::default())
        .expect("encode");

    assert_eq!(report.inputs, 1);
    assert!(report.video_frames > 0);
    let drift = report.duration.as_secs_f64() - plan.duration.as_secs_f64();
    assert!(drift.abs() < 0.5, "encoded {drift:.3}s off the planned duration");
}
