//! Media metadata types.
//!
//! This module defines the structures returned by
//! [`MediaProbe::probe`](crate::MediaProbe::probe). They are plain owned
//! values with no ties to an open demuxer.

use std::time::Duration;

use crate::estimate::AudioStreamDescriptor;

/// Container-level metadata plus per-stream details.
///
/// # Example
///
/// ```no_run
/// use vidkit::MediaProbe;
///
/// let metadata = MediaProbe::probe("input.mp4")?;
/// println!("Duration: {:?}", metadata.duration);
/// println!("Format: {}", metadata.format);
/// # Ok::<(), vidkit::VidkitError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Best video stream, if the file has one.
    pub video: Option<VideoMetadata>,
    /// Audio streams in file order.
    pub audio_tracks: Vec<AudioMetadata>,
    /// Total container duration. Zero when the container does not report one.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

impl MediaMetadata {
    /// The first audio stream, if any.
    pub fn first_audio(&self) -> Option<&AudioMetadata> {
        self.audio_tracks.first()
    }

    /// Estimator input describing the first audio stream.
    ///
    /// A bit rate of zero means the container did not report one, and a
    /// channel count of zero means the layout is unknown; both are treated
    /// as absent. Returns `None` when the file has no audio at all.
    pub fn audio_descriptor(&self) -> Option<AudioStreamDescriptor> {
        self.first_audio().map(|audio| AudioStreamDescriptor {
            bit_rate: (audio.bit_rate > 0).then_some(audio.bit_rate),
            channels: (audio.channels > 0).then_some(audio.channels),
        })
    }
}

/// Metadata for a video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second (approximate for variable frame rates).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}

/// Metadata for an audio stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct AudioMetadata {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of channels. Zero when unknown.
    pub channels: u16,
    /// Codec name (e.g. `"aac"`, `"opus"`).
    pub codec: String,
    /// Bit rate in bits per second. Zero when not reported.
    pub bit_rate: u64,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}
