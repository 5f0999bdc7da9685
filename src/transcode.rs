//! Decode and re-encode one or more inputs into a single output.
//!
//! [`Transcoder`] is the engine behind both the compressor (one input,
//! container default encoders, bitrate target) and the concatenator (many
//! inputs, H.264 + AAC). Inputs are played back to back: each starts where
//! the previous one ended, video is scaled to the first input's size, and
//! audio gaps are filled with silence.
//!
//! # Example
//!
//! ```no_run
//! use vidkit::{Bitrate, EncoderChoice, Transcoder};
//!
//! let report = Transcoder::new("joined.mp4")
//!     .input("part1.mp4")
//!     .input("part2.mp4")
//!     .video_encoder(EncoderChoice::named("libx264"))
//!     .audio_encoder(EncoderChoice::named("aac"))
//!     .audio_bitrate("128k".parse::<Bitrate>()?)
//!     .run()?;
//! println!("{} frames written", report.video_frames);
//! # Ok::<(), vidkit::VidkitError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::format::context::{Input, Output};
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::Rational;

use crate::audio::{AudioLane, AudioLayout};
use crate::bitrate::Bitrate;
use crate::configuration::JobOptions;
use crate::conversion::{pts_to_seconds, seconds_to_duration};
use crate::encode::{EncoderChoice, VideoLane, VideoLayout, resolve_encoder};
use crate::error::VidkitError;
use crate::probe::{MediaProbe, open_input};
use crate::progress::{OperationType, ProgressTracker};

const FALLBACK_FRAME_RATE: Rational = Rational(25, 1);

/// What a finished transcode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeReport {
    /// Number of input files processed.
    pub inputs: usize,
    /// Video frames sent to the encoder.
    pub video_frames: u64,
    /// Audio samples (per channel) sent to the encoder. Zero without audio.
    pub audio_samples: u64,
    /// Length of the output timeline.
    pub duration: Duration,
}

/// Builder for a decode/re-encode run.
///
/// Defaults: container default encoders, encoder default bitrates, audio
/// optional, progress reported as [`OperationType::Compression`].
#[derive(Debug, Clone)]
pub struct Transcoder {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    video_encoder: EncoderChoice,
    video_bitrate: Option<Bitrate>,
    audio_encoder: EncoderChoice,
    audio_bitrate: Option<Bitrate>,
    require_audio: bool,
    operation: OperationType,
}

impl Transcoder {
    /// Start a transcode writing to `output`. The container is chosen from
    /// the output file extension.
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            video_encoder: EncoderChoice::ContainerDefault,
            video_bitrate: None,
            audio_encoder: EncoderChoice::ContainerDefault,
            audio_bitrate: None,
            require_audio: false,
            operation: OperationType::Compression,
        }
    }

    /// Append an input.
    pub fn input<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Append several inputs, in order.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.inputs
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn video_encoder(mut self, choice: EncoderChoice) -> Self {
        self.video_encoder = choice;
        self
    }

    /// Target video bitrate. Without one the encoder picks its default.
    pub fn video_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.video_bitrate = Some(bitrate);
        self
    }

    pub fn audio_encoder(mut self, choice: EncoderChoice) -> Self {
        self.audio_encoder = choice;
        self
    }

    pub fn audio_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.audio_bitrate = Some(bitrate);
        self
    }

    /// Fail with [`VidkitError::NoAudioStream`] when an input has no audio,
    /// instead of filling its span with silence.
    pub fn require_audio(mut self, required: bool) -> Self {
        self.require_audio = required;
        self
    }

    /// Operation kind reported to progress callbacks.
    pub fn operation(mut self, operation: OperationType) -> Self {
        self.operation = operation;
        self
    }

    /// Run without progress reporting or cancellation.
    pub fn run(&self) -> Result<TranscodeReport, VidkitError> {
        self.run_with_options(&JobOptions::default())
    }

    /// Run, reporting progress and honouring cancellation from `options`.
    ///
    /// The output file is overwritten if it exists.
    ///
    /// # Errors
    ///
    /// [`VidkitError::InvalidInput`] without inputs, [`VidkitError::FileOpen`]
    /// for unreadable inputs or an uncreatable output,
    /// [`VidkitError::NoVideoStream`] / [`VidkitError::NoAudioStream`] for
    /// inputs missing required streams, [`VidkitError::EncoderNotFound`],
    /// codec errors, and [`VidkitError::Cancelled`].
    pub fn run_with_options(&self, options: &JobOptions) -> Result<TranscodeReport, VidkitError> {
        let Some(first_path) = self.inputs.first() else {
            return Err(VidkitError::InvalidInput(
                "at least one input is required".to_string(),
            ));
        };

        let mut total = Duration::ZERO;
        for path in &self.inputs {
            total += MediaProbe::probe(path)?.duration;
        }

        log::info!(
            "Transcoding {} input(s) into {} ({})",
            self.inputs.len(),
            self.output.display(),
            describe_duration(total)
        );

        let first_input = open_input(first_path)?;
        let video_layout = video_layout(&first_input, first_path)?;
        let audio_layout = audio_layout(&first_input);
        if self.require_audio && audio_layout.is_none() {
            return Err(VidkitError::NoAudioStream {
                path: first_path.clone(),
            });
        }

        let mut output = ffmpeg_next::format::output(&self.output).map_err(|error| {
            VidkitError::FileOpen {
                path: self.output.clone(),
                reason: error.to_string(),
            }
        })?;

        let video_codec = resolve_encoder(
            &self.video_encoder,
            output.format().codec(&self.output, Type::Video),
            Id::H264,
        )?;
        let mut video_lane =
            VideoLane::open(&mut output, video_codec, video_layout, self.video_bitrate)?;

        let mut audio_lane = match audio_layout {
            Some(layout) => {
                let audio_codec = resolve_encoder(
                    &self.audio_encoder,
                    output.format().codec(&self.output, Type::Audio),
                    Id::AAC,
                )?;
                Some(AudioLane::open(
                    &mut output,
                    audio_codec,
                    layout,
                    self.audio_bitrate,
                )?)
            }
            None => {
                log::debug!("First input has no audio; output will be video only");
                None
            }
        };

        output
            .write_header()
            .map_err(|error| VidkitError::FfmpegError(format!("cannot write header: {error}")))?;
        video_lane.bind(&output)?;
        if let Some(lane) = audio_lane.as_mut() {
            lane.bind(&output)?;
        }

        let mut tracker = options.tracker(self.operation, Some(total));
        let mut offset = 0.0;
        let mut pending_first = Some(first_input);

        for path in &self.inputs {
            options.check_cancelled()?;
            let input = match pending_first.take() {
                Some(input) => input,
                None => open_input(path)?,
            };

            let mut segment = Segment {
                path,
                output: &mut output,
                video: &mut video_lane,
                audio: audio_lane.as_mut(),
                tracker: &mut tracker,
                options,
                offset,
            };
            let length = segment.process(input, self.require_audio)?;
            log::debug!(
                "{} contributed {length:.3}s starting at {offset:.3}s",
                path.display()
            );
            offset += length;
        }

        let video_frames = video_lane.finish(&mut output)?;
        let audio_samples = match audio_lane.as_mut() {
            Some(lane) => {
                lane.pad_to(offset, &mut output)?;
                lane.finish(&mut output)?
            }
            None => 0,
        };

        output
            .write_trailer()
            .map_err(|error| VidkitError::FfmpegError(format!("cannot write trailer: {error}")))?;

        tracker.finish();

        let report = TranscodeReport {
            inputs: self.inputs.len(),
            video_frames,
            audio_samples,
            duration: seconds_to_duration(offset),
        };
        log::info!(
            "Wrote {} ({} frames, {:.2}s)",
            self.output.display(),
            report.video_frames,
            offset
        );
        Ok(report)
    }
}

fn describe_duration(total: Duration) -> String {
    if total.is_zero() {
        "unknown duration".to_string()
    } else {
        crate::timecode::format_timecode(total)
    }
}

fn usable_rate(rate: Rational) -> Option<Rational> {
    (rate.numerator() > 0 && rate.denominator() > 0).then_some(rate)
}

fn video_layout(input: &Input, path: &Path) -> Result<VideoLayout, VidkitError> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| VidkitError::NoVideoStream {
            path: path.to_path_buf(),
        })?;

    let decoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(|error| VidkitError::VideoDecodeError(error.to_string()))?;

    let frame_rate = usable_rate(stream.avg_frame_rate())
        .or_else(|| usable_rate(stream.rate()))
        .unwrap_or(FALLBACK_FRAME_RATE);

    Ok(VideoLayout {
        width: decoder.width(),
        height: decoder.height(),
        frame_rate,
        time_base: frame_rate.invert(),
    })
}

fn audio_layout(input: &Input) -> Option<AudioLayout> {
    let stream = input.streams().best(Type::Audio)?;
    let decoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().audio())
        .ok()?;
    Some(AudioLayout {
        sample_rate: decoder.rate(),
        channels: decoder.channels(),
    })
}

/// One input being appended to the output timeline.
struct Segment<'a> {
    path: &'a Path,
    output: &'a mut Output,
    video: &'a mut VideoLane,
    audio: Option<&'a mut AudioLane>,
    tracker: &'a mut ProgressTracker,
    options: &'a JobOptions,
    offset: f64,
}

/// Maps an input's video timestamps onto the output timeline.
struct VideoClock {
    time_base: Rational,
    frame_duration: f64,
    first: Option<i64>,
    end: f64,
}

impl VideoClock {
    /// Seconds from the start of this input for a frame stamped `timestamp`.
    fn place(&mut self, timestamp: Option<i64>) -> f64 {
        let relative = match (timestamp, self.first) {
            (Some(ts), Some(first)) => pts_to_seconds(ts - first, self.time_base).max(0.0),
            (Some(ts), None) => {
                self.first = Some(ts);
                0.0
            }
            (None, _) => self.end,
        };
        self.end = self.end.max(relative + self.frame_duration);
        relative
    }
}

impl Segment<'_> {
    /// Decode the whole input into the lanes. Returns its length in seconds.
    fn process(&mut self, mut input: Input, require_audio: bool) -> Result<f64, VidkitError> {
        let (video_index, mut video_decoder, mut clock) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| VidkitError::NoVideoStream {
                    path: self.path.to_path_buf(),
                })?;
            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| VidkitError::VideoDecodeError(error.to_string()))?;
            let frame_rate = usable_rate(stream.avg_frame_rate()).unwrap_or(FALLBACK_FRAME_RATE);
            let clock = VideoClock {
                time_base: stream.time_base(),
                frame_duration: pts_to_seconds(1, frame_rate.invert()),
                first: None,
                end: 0.0,
            };
            (stream.index(), decoder, clock)
        };

        let audio_source = match input.streams().best(Type::Audio) {
            Some(stream) if self.audio.is_some() => {
                let decoder = CodecContext::from_parameters(stream.parameters())
                    .and_then(|context| context.decoder().audio())
                    .map_err(|error| VidkitError::AudioDecodeError(error.to_string()))?;
                Some((stream.index(), decoder))
            }
            None if require_audio => {
                return Err(VidkitError::NoAudioStream {
                    path: self.path.to_path_buf(),
                });
            }
            _ => None,
        };
        let (audio_index, mut audio_decoder) = match audio_source {
            Some((index, decoder)) => (Some(index), Some(decoder)),
            None => (None, None),
        };

        if let (Some(lane), Some(decoder)) = (self.audio.as_deref_mut(), audio_decoder.as_ref()) {
            lane.begin_input(decoder, self.offset, self.output)?;
        } else if self.audio.is_some() {
            log::warn!(
                "{} has no audio; its span will be silent",
                self.path.display()
            );
        }

        let mut video_frame = VideoFrame::empty();
        let mut audio_frame = AudioFrame::empty();

        for (stream, packet) in input.packets() {
            self.options.check_cancelled()?;
            let index = stream.index();

            if index == video_index {
                if let Err(error) = video_decoder.send_packet(&packet) {
                    log::warn!("Skipping undecodable video packet: {error}");
                    continue;
                }
                self.receive_video(&mut video_decoder, &mut video_frame, &mut clock)?;
            } else if Some(index) == audio_index {
                let Some(decoder) = audio_decoder.as_mut() else {
                    continue;
                };
                if let Err(error) = decoder.send_packet(&packet) {
                    log::warn!("Skipping undecodable audio packet: {error}");
                    continue;
                }
                self.receive_audio(decoder, &mut audio_frame)?;
            } else {
                continue;
            }

            let audio_position = self
                .audio
                .as_deref()
                .map_or(0.0, AudioLane::position_seconds);
            let position = (self.offset + clock.end).max(audio_position);
            self.tracker.advance_to(seconds_to_duration(position));
        }

        if video_decoder.send_eof().is_ok() {
            self.receive_video(&mut video_decoder, &mut video_frame, &mut clock)?;
        }

        let mut audio_length = 0.0;
        if let Some(decoder) = audio_decoder.as_mut() {
            if decoder.send_eof().is_ok() {
                self.receive_audio(decoder, &mut audio_frame)?;
            }
            if let Some(lane) = self.audio.as_deref_mut() {
                audio_length = lane.end_input(self.output)?;
            }
        }

        Ok(clock.end.max(audio_length))
    }

    fn receive_video(
        &mut self,
        decoder: &mut ffmpeg_next::decoder::Video,
        frame: &mut VideoFrame,
        clock: &mut VideoClock,
    ) -> Result<(), VidkitError> {
        while decoder.receive_frame(frame).is_ok() {
            let relative = clock.place(frame.timestamp().or(frame.pts()));
            self.video
                .push_frame(frame, self.offset + relative, self.output)?;
        }
        Ok(())
    }

    fn receive_audio(
        &mut self,
        decoder: &mut ffmpeg_next::decoder::Audio,
        frame: &mut AudioFrame,
    ) -> Result<(), VidkitError> {
        while decoder.receive_frame(frame).is_ok() {
            if let Some(lane) = self.audio.as_deref_mut() {
                lane.push_frame(frame, self.output)?;
            }
        }
        Ok(())
    }
}
