//! Error types for the `vidkit` crate.
//!
//! This module defines [`VidkitError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the context a user
//! needs to act on the failure: file paths, the offending text, or the
//! numbers that made a size target impossible.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `vidkit` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VidkitError {
    /// A numeric argument was non-positive or not finite.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested output size cannot hold the audio track plus the
    /// container overhead reserve for this duration.
    #[error(
        "Target size {target_mb}MB too small for this video \
         (audio needs {audio_mb:.2}MB, container overhead reserves {overhead_mb:.2}MB)"
    )]
    InfeasibleTarget {
        /// The requested output size in megabytes.
        target_mb: f64,
        /// Megabytes consumed by the audio track.
        audio_mb: f64,
        /// Megabytes reserved for container overhead.
        overhead_mb: f64,
    },

    /// A bitrate string could not be parsed.
    #[error("Bitrate value '{0}' is not valid. Use format like '1000' or '1000k'.")]
    InvalidBitrate(String),

    /// A timecode string could not be parsed.
    #[error("Invalid time format: {0}")]
    InvalidTimecode(String),

    /// A range's start value is greater than or equal to its end value.
    #[error("Invalid range: start ({start}) must be less than end ({end})")]
    InvalidRange {
        /// The start of the range.
        start: String,
        /// The end of the range.
        end: String,
    },

    /// The requested timestamp lies beyond the media duration.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// A media file could not be opened or created.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path of the file.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// An input file does not carry one of the supported video extensions.
    #[error("The file '{}' has an unsupported extension.", path.display())]
    UnsupportedExtension {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in {}", path.display())]
    NoVideoStream {
        /// Path of the file.
        path: PathBuf,
    },

    /// The file does not contain an audio stream.
    #[error("No audio stream found in {}", path.display())]
    NoAudioStream {
        /// Path of the file.
        path: PathBuf,
    },

    /// No encoder with the requested name or codec is available in the
    /// linked FFmpeg build.
    #[error("Encoder not available: {0}")]
    EncoderNotFound(String),

    /// A video packet could not be decoded.
    #[error("Failed to decode video: {0}")]
    VideoDecodeError(String),

    /// Video encoding failed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// An audio packet could not be decoded.
    #[error("Failed to decode audio: {0}")]
    AudioDecodeError(String),

    /// Audio encoding failed.
    #[error("Failed to encode audio: {0}")]
    AudioEncodeError(String),

    /// Packet-level stream copy failed.
    #[error("Stream copy error: {0}")]
    StreamCopyError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for VidkitError {
    fn from(error: FfmpegError) -> Self {
        VidkitError::FfmpegError(error.to_string())
    }
}
