//! Lightweight media file probing.
//!
//! [`MediaProbe`] opens a file, reads what the compressor and the other
//! tools need to plan their work, and closes the demuxer again.

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::error::VidkitError;
use crate::metadata::{AudioMetadata, MediaMetadata, VideoMetadata};

/// Lightweight media file probe.
///
/// # Example
///
/// ```no_run
/// use vidkit::MediaProbe;
///
/// let metadata = MediaProbe::probe("input.mp4")?;
/// if let Some(video) = &metadata.video {
///     println!("Video: {}x{} @ {:.2} fps", video.width, video.height, video.frames_per_second);
/// }
/// # Ok::<(), vidkit::VidkitError>(())
/// ```
pub struct MediaProbe;

impl MediaProbe {
    /// Probe a media file and return its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`VidkitError::FileOpen`] if the file does not exist or
    /// cannot be recognised as a media file.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaMetadata, VidkitError> {
        let path = path.as_ref();
        log::debug!("Probing {}", path.display());

        let input_context = open_input(path)?;
        Ok(read_metadata(&input_context, path))
    }

    /// Probe multiple media files.
    ///
    /// Files that cannot be probed produce an `Err` entry rather than
    /// aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<MediaMetadata, VidkitError>> {
        paths.iter().map(Self::probe).collect()
    }
}

/// Initialise FFmpeg and open a demuxer for `path`.
pub(crate) fn open_input(path: &Path) -> Result<Input, VidkitError> {
    crate::ffmpeg::initialize()?;

    if !path.exists() {
        return Err(VidkitError::FileOpen {
            path: path.to_path_buf(),
            reason: "File does not exist".to_string(),
        });
    }

    ffmpeg_next::format::input(&path).map_err(|error| VidkitError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

/// Read metadata from an already opened demuxer.
///
/// Streams whose codec parameters cannot be interpreted are skipped with a
/// warning instead of failing the whole probe.
pub(crate) fn read_metadata(input_context: &Input, path: &Path) -> MediaMetadata {
    let duration_microseconds = input_context.duration();
    let duration = if duration_microseconds > 0 {
        Duration::from_micros(duration_microseconds as u64)
    } else {
        Duration::ZERO
    };

    let format = input_context.format().name().to_string();

    let video = input_context.streams().best(Type::Video).and_then(|stream| {
        let index = stream.index();
        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video());
        let decoder = match decoder {
            Ok(decoder) => decoder,
            Err(error) => {
                log::warn!(
                    "Skipping unreadable video stream {index} in {}: {error}",
                    path.display()
                );
                return None;
            }
        };

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            0.0
        };

        Some(VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            stream_index: index,
        })
    });

    let mut audio_tracks = Vec::new();
    for stream in input_context.streams() {
        if stream.parameters().medium() != Type::Audio {
            continue;
        }

        let index = stream.index();
        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().audio());
        let decoder = match decoder {
            Ok(decoder) => decoder,
            Err(error) => {
                log::warn!(
                    "Skipping unreadable audio stream {index} in {}: {error}",
                    path.display()
                );
                continue;
            }
        };

        audio_tracks.push(AudioMetadata {
            sample_rate: decoder.rate(),
            channels: decoder.channels(),
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            bit_rate: decoder.bit_rate() as u64,
            stream_index: index,
        });
    }

    MediaMetadata {
        video,
        audio_tracks,
        duration,
        format,
    }
}
