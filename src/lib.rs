//! # vidkit
//!
//! Compress, trim, and join video files, with the heavy lifting done by
//! FFmpeg through the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate.
//!
//! The crate backs three command-line tools (`compressor`, `trimmer`, and
//! `union`) and exposes the same operations as a library.
//!
//! ## Quick Start
//!
//! ### Fit a Video Into a Size Budget
//!
//! ```no_run
//! use vidkit::{CompressionTarget, Compressor};
//!
//! let plan = Compressor::new("lecture.mp4", "lecture-small.mp4", CompressionTarget::FileSize(50.0))
//!     .run()?;
//! println!("Encoded at {}", plan.video_bitrate);
//! # Ok::<(), vidkit::VidkitError>(())
//! ```
//!
//! ### Estimate Without Encoding
//!
//! ```
//! use vidkit::{AudioStreamDescriptor, EstimateRequest, estimate_video_bitrate};
//!
//! let request = EstimateRequest::new(60.0, 10.0)
//!     .with_audio(AudioStreamDescriptor::with_bit_rate(192_000));
//! let estimate = estimate_video_bitrate(&request)?;
//! assert_eq!(estimate.video_bitrate.bits_per_second(), 1_094_253);
//! # Ok::<(), vidkit::VidkitError>(())
//! ```
//!
//! ### Cut a Clip
//!
//! ```no_run
//! use vidkit::{TrimRange, Trimmer, parse_timecode};
//!
//! let range = TrimRange::between(parse_timecode("00:01:30")?, parse_timecode("00:02:30")?)?;
//! Trimmer::new("match.mkv", "goal.mkv", range).run()?;
//! # Ok::<(), vidkit::VidkitError>(())
//! ```
//!
//! ### Join Videos
//!
//! ```no_run
//! use vidkit::Concatenator;
//!
//! Concatenator::new("trip.mp4")
//!     .inputs(["day1.mp4", "day2.mov"])
//!     .run()?;
//! # Ok::<(), vidkit::VidkitError>(())
//! ```
//!
//! ## Features
//!
//! - **Size-targeted compression**: derive a video bitrate from a target
//!   file size, the duration, and the source audio track
//! - **Lossless trimming**: stream copy between two timecodes, snapping to
//!   the preceding keyframe
//! - **Concatenation**: re-encode any number of inputs to H.264/AAC,
//!   scaling to the first input and padding missing audio with silence
//! - **Progress & cancellation**: [`ProgressCallback`] and
//!   [`CancellationToken`] through [`JobOptions`]
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. See the
//! README for platform-specific instructions.

mod audio;
pub mod bitrate;
pub mod compress;
pub mod configuration;
mod conversion;
mod encode;
pub mod error;
pub mod estimate;
pub mod ffmpeg;
pub mod metadata;
pub mod probe;
pub mod progress;
pub mod timecode;
pub mod transcode;
pub mod trim;
pub mod union;
pub mod validation;

pub use bitrate::Bitrate;
pub use compress::{COMPRESSED_AUDIO_BITRATE, CompressionPlan, CompressionTarget, Compressor};
pub use configuration::JobOptions;
pub use encode::EncoderChoice;
pub use error::VidkitError;
pub use estimate::{
    AudioStreamDescriptor, BitrateEstimate, BitrateWarning, EstimateRequest,
    estimate_video_bitrate,
};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::{AudioMetadata, MediaMetadata, VideoMetadata};
pub use probe::MediaProbe;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use timecode::{format_timecode, parse_timecode};
pub use transcode::{TranscodeReport, Transcoder};
pub use trim::{TrimRange, TrimReport, Trimmer};
pub use union::Concatenator;
pub use validation::{SUPPORTED_EXTENSIONS, has_supported_extension};
