//! Lossless trimming by stream copy.
//!
//! [`Trimmer`] copies the best video and best audio stream of a file
//! between two points in time without re-encoding. Because packets are
//! copied verbatim the cut can only begin on a keyframe: the output starts
//! at the last keyframe at or before the requested start.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidkit::{TrimRange, Trimmer};
//!
//! let range = TrimRange::between(Duration::from_secs(90), Duration::from_secs(150))?;
//! let report = Trimmer::new("input.mp4", "clip.mp4", range).run()?;
//! println!("{} packets copied", report.packets);
//! # Ok::<(), vidkit::VidkitError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::codec::Id;
use ffmpeg_next::media::Type;
use ffmpeg_next::Rational;

use crate::configuration::JobOptions;
use crate::conversion::{
    duration_to_seek_timestamp, pts_to_seconds, seconds_to_duration, seconds_to_stream_timestamp,
};
use crate::error::VidkitError;
use crate::probe::open_input;
use crate::progress::OperationType;
use crate::timecode::{format_timecode, parse_timecode};

/// The part of the input to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimRange {
    /// Keep `start..end`.
    Between {
        /// Where the kept range begins.
        start: Duration,
        /// Where the kept range ends. Always after `start`.
        end: Duration,
    },
    /// Keep the first `Duration` of the input.
    Leading(Duration),
}

impl TrimRange {
    /// Keep `start..end`.
    ///
    /// # Errors
    ///
    /// [`VidkitError::InvalidRange`] unless `end > start`.
    pub fn between(start: Duration, end: Duration) -> Result<Self, VidkitError> {
        if end <= start {
            return Err(VidkitError::InvalidRange {
                start: format_timecode(start),
                end: format_timecode(end),
            });
        }
        Ok(TrimRange::Between { start, end })
    }

    /// Keep the first `duration` of the input.
    ///
    /// # Errors
    ///
    /// [`VidkitError::InvalidInput`] for a zero duration.
    pub fn leading(duration: Duration) -> Result<Self, VidkitError> {
        if duration.is_zero() {
            return Err(VidkitError::InvalidInput(
                "trim duration must be greater than zero".to_string(),
            ));
        }
        Ok(TrimRange::Leading(duration))
    }

    /// Build a range from the trimmer's command-line arguments.
    ///
    /// At least one argument is required, `start` and `end` must be given
    /// together, and `duration` cannot be combined with either.
    ///
    /// ```
    /// use std::time::Duration;
    /// use vidkit::TrimRange;
    ///
    /// let range = TrimRange::from_arguments(Some("00:01:30"), Some("2:30"), None)?;
    /// assert_eq!(range.start(), Duration::from_secs(90));
    /// assert_eq!(range.length(), Duration::from_secs(60));
    /// # Ok::<(), vidkit::VidkitError>(())
    /// ```
    pub fn from_arguments(
        start: Option<&str>,
        end: Option<&str>,
        duration: Option<&str>,
    ) -> Result<Self, VidkitError> {
        match (start, end, duration) {
            (None, None, None) => Err(VidkitError::InvalidInput(
                "At least one of start time, end time, or duration must be specified.".to_string(),
            )),
            (_, _, Some(_)) if start.is_some() || end.is_some() => Err(VidkitError::InvalidInput(
                "Duration parameters cannot be used with start/end time parameters.".to_string(),
            )),
            (None, None, Some(duration)) => Self::leading(parse_timecode(duration)?),
            (Some(start), Some(end), None) => {
                Self::between(parse_timecode(start)?, parse_timecode(end)?)
            }
            _ => Err(VidkitError::InvalidInput(
                "Both start time and end time must be specified together.".to_string(),
            )),
        }
    }

    /// Where the kept range begins in the input.
    pub fn start(&self) -> Duration {
        match *self {
            TrimRange::Between { start, .. } => start,
            TrimRange::Leading(_) => Duration::ZERO,
        }
    }

    /// Where the kept range ends in the input.
    pub fn end(&self) -> Duration {
        match *self {
            TrimRange::Between { end, .. } => end,
            TrimRange::Leading(duration) => duration,
        }
    }

    /// Length of the kept range.
    pub fn length(&self) -> Duration {
        self.end().saturating_sub(self.start())
    }
}

/// What a finished trim produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimReport {
    /// Packets copied to the output.
    pub packets: u64,
    /// Input position of the first copied packet. At or before the
    /// requested start because cuts snap back to a keyframe.
    pub actual_start: Duration,
    /// Span covered by the copied packets.
    pub duration: Duration,
}

/// Copies a time range of one file into another without re-encoding.
#[derive(Debug, Clone)]
pub struct Trimmer {
    input: PathBuf,
    output: PathBuf,
    range: TrimRange,
}

struct CopiedStream {
    input_index: usize,
    output_index: usize,
    input_time_base: Rational,
    output_time_base: Rational,
    done: bool,
}

impl Trimmer {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(input: P1, output: P2, range: TrimRange) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            range,
        }
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    /// Trim without progress reporting or cancellation.
    pub fn run(&self) -> Result<TrimReport, VidkitError> {
        self.run_with_options(&JobOptions::default())
    }

    /// Trim, reporting progress and honouring cancellation from `options`.
    ///
    /// The output file is overwritten if it exists.
    ///
    /// # Errors
    ///
    /// - [`VidkitError::FileOpen`] if the input is missing or unreadable, or
    ///   the output cannot be created.
    /// - [`VidkitError::InvalidTimestamp`] if the range starts at or after
    ///   the end of the input.
    /// - [`VidkitError::NoVideoStream`] if the input has neither video nor
    ///   audio to copy.
    /// - [`VidkitError::StreamCopyError`] if seeking or muxing fails.
    /// - [`VidkitError::Cancelled`] if cancellation was requested.
    pub fn run_with_options(&self, options: &JobOptions) -> Result<TrimReport, VidkitError> {
        let mut input_context = open_input(&self.input)?;

        let duration_microseconds = input_context.duration();
        if duration_microseconds > 0 {
            let input_duration = Duration::from_micros(duration_microseconds as u64);
            if self.range.start() >= input_duration {
                return Err(VidkitError::InvalidTimestamp(self.range.start()));
            }
        }

        let selected: Vec<usize> = [Type::Video, Type::Audio]
            .into_iter()
            .filter_map(|kind| input_context.streams().best(kind).map(|stream| stream.index()))
            .collect();
        if selected.is_empty() {
            return Err(VidkitError::NoVideoStream {
                path: self.input.clone(),
            });
        }

        let mut output_context =
            ffmpeg_next::format::output(&self.output).map_err(|e| VidkitError::FileOpen {
                path: self.output.clone(),
                reason: format!("Failed to create output: {e}"),
            })?;

        let mut copied: Vec<CopiedStream> = Vec::with_capacity(selected.len());
        let mut base_seconds = 0.0;
        for &input_index in &selected {
            let Some(stream) = input_context.stream(input_index) else {
                continue;
            };
            let mut out_stream = output_context
                .add_stream(ffmpeg_next::encoder::find(Id::None))
                .map_err(|e| VidkitError::StreamCopyError(format!("cannot add stream: {e}")))?;
            out_stream.set_parameters(stream.parameters());
            // The input's codec tag may be meaningless in the output container.
            unsafe {
                (*out_stream.parameters().as_mut_ptr()).codec_tag = 0;
            }

            if copied.is_empty() && stream.start_time() != ffmpeg_sys_next::AV_NOPTS_VALUE {
                base_seconds = pts_to_seconds(stream.start_time(), stream.time_base());
            }

            copied.push(CopiedStream {
                input_index,
                output_index: out_stream.index(),
                input_time_base: stream.time_base(),
                output_time_base: stream.time_base(),
                done: false,
            });
        }

        output_context
            .write_header()
            .map_err(|e| VidkitError::StreamCopyError(format!("cannot write header: {e}")))?;
        for entry in &mut copied {
            if let Some(stream) = output_context.stream(entry.output_index) {
                entry.output_time_base = stream.time_base();
            }
        }

        let start_seconds = base_seconds + self.range.start().as_secs_f64();
        let end_seconds = base_seconds + self.range.end().as_secs_f64();

        if !self.range.start().is_zero() {
            let target = duration_to_seek_timestamp(seconds_to_duration(start_seconds));
            input_context
                .seek(target, ..target)
                .map_err(|e| VidkitError::StreamCopyError(format!("seek failed: {e}")))?;
        }

        log::info!(
            "Trimming {} [{} - {}] into {}",
            self.input.display(),
            format_timecode(self.range.start()),
            format_timecode(self.range.end()),
            self.output.display()
        );

        let mut tracker = options.tracker(OperationType::Trimming, Some(self.range.length()));
        let mut shift_seconds: Option<f64> = None;
        let mut last_seconds = 0.0f64;
        let mut packets: u64 = 0;

        for (stream, mut packet) in input_context.packets() {
            options.check_cancelled()?;

            let Some(entry) = copied
                .iter_mut()
                .find(|entry| entry.input_index == stream.index())
            else {
                continue;
            };
            if entry.done {
                continue;
            }

            let Some(timestamp) = packet.dts().or(packet.pts()) else {
                log::debug!("Dropping packet without timestamps on stream {}", entry.input_index);
                continue;
            };
            let seconds = pts_to_seconds(timestamp, entry.input_time_base);

            if seconds >= end_seconds {
                entry.done = true;
                log::debug!("Stream {} reached the end of the range", entry.input_index);
                if copied.iter().all(|entry| entry.done) {
                    break;
                }
                continue;
            }

            let shift = *shift_seconds.get_or_insert_with(|| {
                log::debug!(
                    "First copied packet at {seconds:.3}s (requested {start_seconds:.3}s)"
                );
                seconds
            });
            let shift_ticks = seconds_to_stream_timestamp(shift, entry.input_time_base);

            packet.set_pts(packet.pts().map(|pts| pts - shift_ticks));
            packet.set_dts(packet.dts().map(|dts| dts - shift_ticks));
            packet.set_stream(entry.output_index);
            packet.rescale_ts(entry.input_time_base, entry.output_time_base);
            packet.set_position(-1);
            packet
                .write_interleaved(&mut output_context)
                .map_err(|e| VidkitError::StreamCopyError(format!("write packet failed: {e}")))?;
            packets += 1;

            last_seconds = last_seconds.max(seconds - shift);
            tracker.advance_to(seconds_to_duration(last_seconds));
        }

        output_context
            .write_trailer()
            .map_err(|e| VidkitError::StreamCopyError(format!("cannot write trailer: {e}")))?;
        tracker.finish();

        if packets == 0 {
            log::warn!("No packets fell inside the requested range");
        }

        Ok(TrimReport {
            packets,
            actual_start: seconds_to_duration(shift_seconds.unwrap_or(start_seconds) - base_seconds),
            duration: seconds_to_duration(last_seconds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_requires_increasing_bounds() {
        let error = TrimRange::between(Duration::from_secs(10), Duration::from_secs(10)).unwrap_err();
        assert!(matches!(error, VidkitError::InvalidRange { .. }));
        assert!(TrimRange::between(Duration::from_secs(10), Duration::from_secs(11)).is_ok());
    }

    #[test]
    fn leading_rejects_zero() {
        assert!(TrimRange::leading(Duration::ZERO).is_err());
        let range = TrimRange::leading(Duration::from_secs(5)).unwrap();
        assert_eq!(range.start(), Duration::ZERO);
        assert_eq!(range.end(), Duration::from_secs(5));
    }

    #[test]
    fn argument_rules() {
        assert!(TrimRange::from_arguments(None, None, None).is_err());
        assert!(TrimRange::from_arguments(Some("10"), None, None).is_err());
        assert!(TrimRange::from_arguments(None, Some("10"), None).is_err());
        assert!(TrimRange::from_arguments(Some("1"), Some("2"), Some("3")).is_err());
        assert!(TrimRange::from_arguments(Some("1"), None, Some("3")).is_err());

        let leading = TrimRange::from_arguments(None, None, Some("01:00")).unwrap();
        assert_eq!(leading, TrimRange::Leading(Duration::from_secs(60)));
    }

    #[test]
    fn argument_messages() {
        let error = TrimRange::from_arguments(Some("5"), None, None).unwrap_err();
        assert!(error.to_string().contains("together"), "{error}");

        let error = TrimRange::from_arguments(None, Some("5"), Some("2")).unwrap_err();
        assert!(error.to_string().contains("cannot be used"), "{error}");
    }
}
