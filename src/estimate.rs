//! Filesize-constrained video bitrate estimation.
//!
//! Given a target output size, the source duration, and what is known about
//! the source's audio track, [`estimate_video_bitrate`] works out the video
//! bitrate that makes the re-encoded file land close to the requested size.
//!
//! The budget is split three ways: the audio track keeps its bitrate, a flat
//! [`CONTAINER_OVERHEAD_FRACTION`] of the target is set aside for muxing
//! overhead, and whatever remains is spread evenly over the duration as
//! video bitrate. Results below [`MIN_VIDEO_BITRATE`] are raised to the
//! floor and flagged with [`BitrateWarning::BelowFloor`].
//!
//! # Example
//!
//! ```
//! use vidkit::{EstimateRequest, estimate_video_bitrate};
//!
//! // Ten minutes of video with no audio information, squeezed into 50 MB.
//! let estimate = estimate_video_bitrate(&EstimateRequest::new(600.0, 50.0))?;
//! assert_eq!(estimate.video_bitrate.to_string(), "515k");
//! assert!(estimate.warning.is_none());
//! # Ok::<(), vidkit::VidkitError>(())
//! ```

use crate::bitrate::Bitrate;
use crate::error::VidkitError;

/// Audio bitrate assumed when the source has no audio stream information.
pub const DEFAULT_AUDIO_BITRATE: u64 = 128_000;

/// Audio bitrate assumed per channel when only the channel count is known.
pub const AUDIO_BITRATE_PER_CHANNEL: u64 = 64_000;

/// Share of the target size reserved for container and muxing overhead.
pub const CONTAINER_OVERHEAD_FRACTION: f64 = 0.08;

/// Lowest video bitrate handed to the encoder, in bits per second.
pub const MIN_VIDEO_BITRATE: u64 = 100_000;

/// Bytes in one megabyte as used for size targets (binary megabyte).
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

const BITS_PER_MEGABYTE: f64 = 8.0 * BYTES_PER_MEGABYTE;

/// What is known about the source's first audio stream.
///
/// Produced by [`MediaMetadata::audio_descriptor`](crate::MediaMetadata::audio_descriptor)
/// or built by hand. An explicit bitrate wins over a channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioStreamDescriptor {
    /// Bitrate reported by the container, in bits per second.
    pub bit_rate: Option<u64>,
    /// Number of audio channels.
    pub channels: Option<u16>,
}

impl AudioStreamDescriptor {
    /// A descriptor carrying an explicit bitrate.
    pub fn with_bit_rate(bit_rate: u64) -> Self {
        Self {
            bit_rate: Some(bit_rate),
            channels: None,
        }
    }

    /// A descriptor carrying only a channel count.
    pub fn with_channels(channels: u16) -> Self {
        Self {
            bit_rate: None,
            channels: Some(channels),
        }
    }

    /// The audio bitrate the estimator will assume for this stream.
    pub fn assumed_bit_rate(&self) -> u64 {
        match (self.bit_rate, self.channels) {
            (Some(bit_rate), _) => bit_rate,
            (None, Some(channels)) => AUDIO_BITRATE_PER_CHANNEL * u64::from(channels),
            (None, None) => DEFAULT_AUDIO_BITRATE,
        }
    }
}

/// Inputs to [`estimate_video_bitrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateRequest {
    /// Source duration in seconds. Must be positive.
    pub duration_seconds: f64,
    /// First audio stream of the source, if the source has one.
    pub audio: Option<AudioStreamDescriptor>,
    /// Requested output size in megabytes. Must be positive.
    pub target_size_mb: f64,
}

impl EstimateRequest {
    /// A request for a source with no audio information.
    pub fn new(duration_seconds: f64, target_size_mb: f64) -> Self {
        Self {
            duration_seconds,
            audio: None,
            target_size_mb,
        }
    }

    /// Attach the source's audio stream descriptor.
    #[must_use]
    pub fn with_audio(mut self, audio: AudioStreamDescriptor) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// Advisory signal attached to an otherwise usable estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BitrateWarning {
    /// The computed bitrate fell below [`MIN_VIDEO_BITRATE`] and was raised
    /// to the floor. The output will overshoot the size target.
    BelowFloor {
        /// The bitrate the arithmetic produced, in bits per second.
        computed: u64,
    },
}

/// Result of a successful estimate, including the intermediate budget.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct BitrateEstimate {
    /// Video bitrate to encode with. Never below [`MIN_VIDEO_BITRATE`].
    pub video_bitrate: Bitrate,
    /// Audio bitrate assumed for the source track, in bits per second.
    pub audio_bit_rate: u64,
    /// Megabytes consumed by the audio track.
    pub audio_size_mb: f64,
    /// Megabytes reserved for container overhead.
    pub overhead_mb: f64,
    /// Megabytes left for the video track.
    pub available_video_mb: f64,
    /// Set when the result was clamped to the floor.
    pub warning: Option<BitrateWarning>,
}

/// Compute the video bitrate that fits a source into `target_size_mb`.
///
/// # Errors
///
/// - [`VidkitError::InvalidInput`] if the duration or the target size is
///   not a positive, finite number.
/// - [`VidkitError::InfeasibleTarget`] if the audio footprint plus the
///   overhead reserve already fill the target.
pub fn estimate_video_bitrate(request: &EstimateRequest) -> Result<BitrateEstimate, VidkitError> {
    let duration = request.duration_seconds;
    let target = request.target_size_mb;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(VidkitError::InvalidInput(format!(
            "duration must be a positive number of seconds, got {duration}"
        )));
    }
    if !target.is_finite() || target <= 0.0 {
        return Err(VidkitError::InvalidInput(format!(
            "target size must be a positive number of megabytes, got {target}"
        )));
    }

    let audio_bit_rate = request
        .audio
        .map(|audio| audio.assumed_bit_rate())
        .unwrap_or(DEFAULT_AUDIO_BITRATE);

    let audio_size_mb = (audio_bit_rate as f64 * duration) / BITS_PER_MEGABYTE;
    let overhead_mb = target * CONTAINER_OVERHEAD_FRACTION;
    let available_video_mb = target - audio_size_mb - overhead_mb;

    if available_video_mb <= 0.0 {
        return Err(VidkitError::InfeasibleTarget {
            target_mb: target,
            audio_mb: audio_size_mb,
            overhead_mb,
        });
    }

    let computed = ((available_video_mb * BITS_PER_MEGABYTE) / duration) as u64;

    let (bits_per_second, warning) = if computed < MIN_VIDEO_BITRATE {
        log::warn!(
            "Calculated bitrate ({}k) is too low for reasonable quality, using {}k",
            computed / 1000,
            MIN_VIDEO_BITRATE / 1000
        );
        (MIN_VIDEO_BITRATE, Some(BitrateWarning::BelowFloor { computed }))
    } else {
        (computed, None)
    };

    log::debug!(
        "Estimated {bits_per_second} bps for {target}MB over {duration}s \
         (audio {audio_size_mb:.3}MB, overhead {overhead_mb:.3}MB)"
    );

    Ok(BitrateEstimate {
        video_bitrate: Bitrate::from_bits_per_second(bits_per_second),
        audio_bit_rate,
        audio_size_mb,
        overhead_mb,
        available_video_mb,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bps(request: EstimateRequest) -> u64 {
        estimate_video_bitrate(&request)
            .unwrap()
            .video_bitrate
            .bits_per_second()
    }

    #[test]
    fn ten_minutes_into_fifty_megabytes() {
        let estimate = estimate_video_bitrate(&EstimateRequest::new(600.0, 50.0)).unwrap();
        assert_eq!(estimate.audio_bit_rate, DEFAULT_AUDIO_BITRATE);
        assert!((estimate.audio_size_mb - 9.1552734375).abs() < 1e-9);
        assert!((estimate.overhead_mb - 4.0).abs() < 1e-9);
        assert!((estimate.available_video_mb - 36.8447265625).abs() < 1e-9);
        assert_eq!(estimate.video_bitrate.bits_per_second(), 515_126);
        assert_eq!(estimate.video_bitrate.to_string(), "515k");
        assert_eq!(estimate.warning, None);
    }

    #[test]
    fn stereo_hour_into_five_megabytes_is_infeasible() {
        let request =
            EstimateRequest::new(3600.0, 5.0).with_audio(AudioStreamDescriptor::with_channels(2));
        match estimate_video_bitrate(&request) {
            Err(VidkitError::InfeasibleTarget {
                target_mb,
                audio_mb,
                ..
            }) => {
                assert_eq!(target_mb, 5.0);
                assert!(audio_mb > target_mb);
            }
            other => panic!("expected InfeasibleTarget, got {other:?}"),
        }
    }

    #[test]
    fn clamps_to_floor_with_warning() {
        let estimate = estimate_video_bitrate(&EstimateRequest::new(7200.0, 200.0)).unwrap();
        assert_eq!(estimate.video_bitrate.bits_per_second(), MIN_VIDEO_BITRATE);
        assert_eq!(
            estimate.warning,
            Some(BitrateWarning::BelowFloor { computed: 86_375 })
        );
        assert_eq!(estimate.video_bitrate.to_string(), "100k");
    }

    #[test]
    fn explicit_bit_rate_beats_channels() {
        let audio = AudioStreamDescriptor {
            bit_rate: Some(192_000),
            channels: Some(6),
        };
        assert_eq!(audio.assumed_bit_rate(), 192_000);
        assert_eq!(AudioStreamDescriptor::with_channels(6).assumed_bit_rate(), 384_000);
        assert_eq!(AudioStreamDescriptor::default().assumed_bit_rate(), DEFAULT_AUDIO_BITRATE);
    }

    #[test]
    fn audio_footprint_matches_formula() {
        let request =
            EstimateRequest::new(60.0, 10.0).with_audio(AudioStreamDescriptor::with_bit_rate(192_000));
        let estimate = estimate_video_bitrate(&request).unwrap();
        let expected = 192_000.0 * 60.0 / (8.0 * 1024.0 * 1024.0);
        assert!((estimate.audio_size_mb - expected).abs() < 1e-12);
        assert_eq!(estimate.video_bitrate.bits_per_second(), 1_094_253);
    }

    #[test]
    fn rejects_non_positive_inputs() {
        for (duration, target) in [(0.0, 10.0), (-5.0, 10.0), (60.0, 0.0), (60.0, -1.0)] {
            let result = estimate_video_bitrate(&EstimateRequest::new(duration, target));
            assert!(
                matches!(result, Err(VidkitError::InvalidInput(_))),
                "({duration}, {target}) should be rejected"
            );
        }
        let result = estimate_video_bitrate(&EstimateRequest::new(f64::NAN, 10.0));
        assert!(matches!(result, Err(VidkitError::InvalidInput(_))));
    }

    #[test]
    fn monotonic_in_target_size() {
        let mut previous = 0;
        for target in [20.0, 25.0, 40.0, 80.0, 160.0, 1000.0] {
            let current = bps(EstimateRequest::new(600.0, target));
            assert!(current >= previous, "{target}MB gave {current} < {previous}");
            previous = current;
        }
    }

    #[test]
    fn decreasing_in_duration() {
        let mut previous = u64::MAX;
        for duration in [30.0, 60.0, 300.0, 600.0, 1200.0] {
            let current = bps(EstimateRequest::new(duration, 200.0));
            assert!(current <= previous, "{duration}s gave {current} > {previous}");
            previous = current;
        }
    }

    #[test]
    fn overhead_alone_never_fits() {
        // Tiny target where the 8% reserve plus audio exceeds the budget.
        let result = estimate_video_bitrate(&EstimateRequest::new(120.0, 1.0));
        assert!(matches!(result, Err(VidkitError::InfeasibleTarget { .. })));
    }
}
