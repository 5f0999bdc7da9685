//! Joining several videos into one.
//!
//! [`Concatenator`] validates its inputs, then re-encodes them back to back
//! into a single H.264/AAC file. Every input must carry both video and
//! audio. Frames are scaled to the first input's resolution.
//!
//! # Example
//!
//! ```no_run
//! use vidkit::Concatenator;
//!
//! let report = Concatenator::new("merged.mp4")
//!     .inputs(["intro.mp4", "talk.mkv", "outro.avi"])
//!     .run()?;
//! println!("{:?} of video", report.duration);
//! # Ok::<(), vidkit::VidkitError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::configuration::JobOptions;
use crate::encode::EncoderChoice;
use crate::error::VidkitError;
use crate::progress::OperationType;
use crate::transcode::{TranscodeReport, Transcoder};
use crate::validation::validate_inputs;

/// Video encoder used for joined output.
pub const CONCAT_VIDEO_ENCODER: &str = "libx264";

/// Audio encoder used for joined output.
pub const CONCAT_AUDIO_ENCODER: &str = "aac";

/// Builder for a concatenation.
#[derive(Debug, Clone)]
pub struct Concatenator {
    output: PathBuf,
    inputs: Vec<PathBuf>,
}

impl Concatenator {
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            inputs: Vec::new(),
        }
    }

    /// Append an input.
    pub fn input<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Append several inputs, in playback order.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.inputs
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn input_paths(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Check the inputs without touching FFmpeg.
    ///
    /// # Errors
    ///
    /// See [`validate_inputs`].
    pub fn validate(&self) -> Result<(), VidkitError> {
        validate_inputs(&self.inputs)
    }

    /// Join the inputs without progress reporting or cancellation.
    pub fn run(&self) -> Result<TranscodeReport, VidkitError> {
        self.run_with_options(&JobOptions::default())
    }

    /// Join the inputs, reporting progress and honouring cancellation.
    ///
    /// The output file is overwritten if it exists.
    ///
    /// # Errors
    ///
    /// Validation errors from [`validate`](Self::validate), then
    /// [`VidkitError::NoVideoStream`] or [`VidkitError::NoAudioStream`] for
    /// an input missing either stream, and any transcoding error.
    pub fn run_with_options(&self, options: &JobOptions) -> Result<TranscodeReport, VidkitError> {
        self.validate()?;

        log::info!("Merging {} videos", self.inputs.len());

        Transcoder::new(&self.output)
            .inputs(&self.inputs)
            .video_encoder(EncoderChoice::named(CONCAT_VIDEO_ENCODER))
            .audio_encoder(EncoderChoice::named(CONCAT_AUDIO_ENCODER))
            .require_audio(true)
            .operation(OperationType::Concatenation)
            .run_with_options(options)
    }
}
