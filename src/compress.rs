//! Re-encoding a file to a bitrate or a size target.
//!
//! [`Compressor`] resolves a [`CompressionTarget`] into a concrete
//! [`CompressionPlan`] (probing the input and running the estimator when the
//! target is a file size), then re-encodes through the [`Transcoder`] with
//! the output container's default encoders.
//!
//! # Example
//!
//! ```no_run
//! use vidkit::{CompressionTarget, Compressor};
//!
//! let compressor = Compressor::new("input.mp4", "small.mp4", CompressionTarget::FileSize(25.0));
//! let plan = compressor.plan()?;
//! println!("Encoding at {}", plan.video_bitrate);
//! compressor.encode(&plan, &vidkit::JobOptions::default())?;
//! # Ok::<(), vidkit::VidkitError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bitrate::Bitrate;
use crate::configuration::JobOptions;
use crate::error::VidkitError;
use crate::estimate::{BitrateEstimate, EstimateRequest, estimate_video_bitrate};
use crate::probe::MediaProbe;
use crate::progress::OperationType;
use crate::transcode::{TranscodeReport, Transcoder};

/// Audio bitrate of every compressed output.
pub const COMPRESSED_AUDIO_BITRATE: Bitrate = Bitrate::from_kilobits(128);

/// What the compressor should aim for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionTarget {
    /// Encode video at this bitrate.
    Bitrate(Bitrate),
    /// Pick the video bitrate that lands the output near this many
    /// megabytes.
    FileSize(f64),
}

impl CompressionTarget {
    /// Build a target from the compressor's command-line arguments.
    ///
    /// A file size takes precedence over a bitrate when both are given.
    ///
    /// # Errors
    ///
    /// [`VidkitError::InvalidInput`] when neither is given,
    /// [`VidkitError::InvalidBitrate`] for unparseable bitrate text.
    pub fn from_arguments(bitrate: Option<&str>, filesize: Option<f64>) -> Result<Self, VidkitError> {
        match (filesize, bitrate) {
            (Some(megabytes), _) => Ok(CompressionTarget::FileSize(megabytes)),
            (None, Some(text)) => Ok(CompressionTarget::Bitrate(text.parse()?)),
            (None, None) => Err(VidkitError::InvalidInput(
                "Either bitrate or filesize must be specified.".to_string(),
            )),
        }
    }
}

/// The bitrates a compression will use.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct CompressionPlan {
    /// Video bitrate handed to the encoder.
    pub video_bitrate: Bitrate,
    /// Audio bitrate handed to the encoder.
    pub audio_bitrate: Bitrate,
    /// Input duration as reported by the container.
    pub duration: Duration,
    /// Estimator output, present for file size targets.
    pub estimate: Option<BitrateEstimate>,
}

/// Re-encodes one file at a lower bitrate.
#[derive(Debug, Clone)]
pub struct Compressor {
    input: PathBuf,
    output: PathBuf,
    target: CompressionTarget,
}

impl Compressor {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(
        input: P1,
        output: P2,
        target: CompressionTarget,
    ) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            target,
        }
    }

    pub fn target(&self) -> CompressionTarget {
        self.target
    }

    /// Probe the input and work out the bitrates, without encoding.
    ///
    /// # Errors
    ///
    /// - [`VidkitError::FileOpen`] if the input cannot be opened.
    /// - [`VidkitError::NoVideoStream`] if it has no video.
    /// - [`VidkitError::InvalidInput`] if a size target is requested for a
    ///   file whose duration is unknown.
    /// - [`VidkitError::InfeasibleTarget`] if the size target cannot hold the
    ///   audio track.
    pub fn plan(&self) -> Result<CompressionPlan, VidkitError> {
        let metadata = MediaProbe::probe(&self.input)?;
        if metadata.video.is_none() {
            return Err(VidkitError::NoVideoStream {
                path: self.input.clone(),
            });
        }

        match self.target {
            CompressionTarget::Bitrate(video_bitrate) => Ok(CompressionPlan {
                video_bitrate,
                audio_bitrate: COMPRESSED_AUDIO_BITRATE,
                duration: metadata.duration,
                estimate: None,
            }),
            CompressionTarget::FileSize(megabytes) => {
                if metadata.duration.is_zero() {
                    return Err(VidkitError::InvalidInput(format!(
                        "cannot size {}: the container reports no duration",
                        self.input.display()
                    )));
                }

                let mut request =
                    EstimateRequest::new(metadata.duration.as_secs_f64(), megabytes);
                if let Some(audio) = metadata.audio_descriptor() {
                    request = request.with_audio(audio);
                }
                let estimate = estimate_video_bitrate(&request)?;

                log::info!(
                    "Calculated bitrate for {megabytes}MB target: {}",
                    estimate.video_bitrate
                );

                Ok(CompressionPlan {
                    // The encoder gets whole kilobits, as the bitrate is displayed.
                    video_bitrate: Bitrate::from_kilobits(estimate.video_bitrate.kilobits()),
                    audio_bitrate: COMPRESSED_AUDIO_BITRATE,
                    duration: metadata.duration,
                    estimate: Some(estimate),
                })
            }
        }
    }

    /// Plan and re-encode without progress reporting or cancellation.
    pub fn run(&self) -> Result<CompressionPlan, VidkitError> {
        self.run_with_options(&JobOptions::default())
    }

    /// Plan and re-encode, reporting progress and honouring cancellation.
    ///
    /// The output file is overwritten if it exists.
    pub fn run_with_options(&self, options: &JobOptions) -> Result<CompressionPlan, VidkitError> {
        let plan = self.plan()?;
        self.encode(&plan, options)?;
        Ok(plan)
    }

    /// Re-encode according to a plan from [`plan`](Self::plan), without
    /// probing the input again.
    ///
    /// The output file is overwritten if it exists.
    ///
    /// # Errors
    ///
    /// Any error from [`Transcoder::run_with_options`].
    pub fn encode(
        &self,
        plan: &CompressionPlan,
        options: &JobOptions,
    ) -> Result<TranscodeReport, VidkitError> {
        log::info!(
            "Compressing {} -> {} (video {}, audio {})",
            self.input.display(),
            self.output.display(),
            plan.video_bitrate,
            plan.audio_bitrate
        );

        Transcoder::new(&self.output)
            .input(&self.input)
            .video_bitrate(plan.video_bitrate)
            .audio_bitrate(plan.audio_bitrate)
            .operation(OperationType::Compression)
            .run_with_options(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesize_wins_over_bitrate() {
        let target = CompressionTarget::from_arguments(Some("800k"), Some(10.0)).unwrap();
        assert_eq!(target, CompressionTarget::FileSize(10.0));
    }

    #[test]
    fn bare_bitrate_is_kilobits() {
        let target = CompressionTarget::from_arguments(Some("1000"), None).unwrap();
        assert_eq!(
            target,
            CompressionTarget::Bitrate(Bitrate::from_bits_per_second(1_000_000))
        );
    }

    #[test]
    fn one_target_is_required() {
        let error = CompressionTarget::from_arguments(None, None).unwrap_err();
        assert!(matches!(error, VidkitError::InvalidInput(_)));

        let error = CompressionTarget::from_arguments(Some("fast"), None).unwrap_err();
        assert!(matches!(error, VidkitError::InvalidBitrate(_)));
    }

    #[test]
    fn plan_of_missing_file_fails_to_open() {
        let compressor = Compressor::new(
            "/nonexistent/input.mp4",
            "out.mp4",
            CompressionTarget::FileSize(10.0),
        );
        assert!(matches!(compressor.plan(), Err(VidkitError::FileOpen { .. })));
    }

    #[test]
    fn encode_of_missing_file_fails_to_open() {
        let plan = CompressionPlan {
            video_bitrate: Bitrate::from_kilobits(500),
            audio_bitrate: COMPRESSED_AUDIO_BITRATE,
            duration: Duration::from_secs(10),
            estimate: None,
        };
        let compressor = Compressor::new(
            "/nonexistent/input.mp4",
            "out.mp4",
            CompressionTarget::Bitrate(plan.video_bitrate),
        );
        let result = compressor.encode(&plan, &JobOptions::default());
        assert!(matches!(result, Err(VidkitError::FileOpen { .. })));
    }
}
