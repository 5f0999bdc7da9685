//! Video side of the transcoding pipeline.
//!
//! [`VideoLane`] owns the output video encoder. Decoded frames from any
//! input are scaled to the output size and pixel format, stamped with the
//! output timeline position, encoded, and written to the muxer.

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::codec::flag::Flags as CodecFlags;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Codec, Packet, Rational, picture};

use crate::bitrate::Bitrate;
use crate::conversion::seconds_to_stream_timestamp;
use crate::error::VidkitError;

/// How to pick an encoder for one output stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncoderChoice {
    /// Whatever FFmpeg considers the default for the output container
    /// (H.264 for MP4/MKV, for example).
    #[default]
    ContainerDefault,
    /// A specific encoder by FFmpeg name, such as `"libx264"` or `"aac"`.
    Named(String),
}

impl EncoderChoice {
    /// Choose an encoder by name.
    pub fn named(name: impl Into<String>) -> Self {
        EncoderChoice::Named(name.into())
    }
}

/// Resolve an [`EncoderChoice`] to a concrete FFmpeg encoder.
///
/// A named encoder that is missing from the FFmpeg build falls back to any
/// encoder for `fallback` with a warning, matching how the `libx264`
/// default degrades on builds without x264.
pub(crate) fn resolve_encoder(
    choice: &EncoderChoice,
    container_default: Id,
    fallback: Id,
) -> Result<Codec, VidkitError> {
    match choice {
        EncoderChoice::Named(name) => {
            if let Some(codec) = ffmpeg_next::encoder::find_by_name(name) {
                return Ok(codec);
            }
            let codec = ffmpeg_next::encoder::find(fallback)
                .ok_or_else(|| VidkitError::EncoderNotFound(name.clone()))?;
            log::warn!(
                "Encoder '{name}' is not available, falling back to '{}'",
                codec.name()
            );
            Ok(codec)
        }
        EncoderChoice::ContainerDefault => {
            let id = if container_default == Id::None {
                fallback
            } else {
                container_default
            };
            ffmpeg_next::encoder::find(id)
                .ok_or_else(|| VidkitError::EncoderNotFound(format!("{id:?}")))
        }
    }
}

/// Geometry and timing of the first input's video stream, used to
/// configure the output encoder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VideoLayout {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub time_base: Rational,
}

pub(crate) struct VideoLane {
    encoder: ffmpeg_next::encoder::Video,
    stream_index: usize,
    encoder_time_base: Rational,
    output_time_base: Rational,
    width: u32,
    height: u32,
    format: Pixel,
    scaler: Option<(ScalerKey, ScalingContext)>,
    last_pts: Option<i64>,
    frames_encoded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalerKey {
    format: Pixel,
    width: u32,
    height: u32,
}

impl VideoLane {
    /// Add a video stream to `output` and open its encoder.
    ///
    /// Must be called before the output header is written.
    pub(crate) fn open(
        output: &mut Output,
        codec: Codec,
        layout: VideoLayout,
        bitrate: Option<Bitrate>,
    ) -> Result<Self, VidkitError> {
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let format = codec
            .video()
            .ok()
            .and_then(|video| video.formats())
            .and_then(|mut formats| formats.next())
            .unwrap_or(Pixel::YUV420P);

        // Most encoders reject odd dimensions with chroma subsampling.
        let width = layout.width & !1;
        let height = layout.height & !1;
        if width == 0 || height == 0 {
            return Err(VidkitError::VideoEncodeError(format!(
                "invalid frame size {}x{}",
                layout.width, layout.height
            )));
        }

        let mut stream = output
            .add_stream(codec)
            .map_err(|e| VidkitError::VideoEncodeError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| {
                VidkitError::VideoEncodeError(format!("cannot create video encoder: {e}"))
            })?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(format);
        encoder.set_time_base(layout.time_base);
        encoder.set_frame_rate(Some(layout.frame_rate));
        if let Some(bitrate) = bitrate {
            encoder.set_bit_rate(bitrate.bits_per_second() as usize);
        }
        if needs_global_header {
            encoder.set_flags(CodecFlags::GLOBAL_HEADER);
        }

        let encoder = encoder.open_as(codec).map_err(|e| {
            VidkitError::VideoEncodeError(format!("cannot open encoder '{}': {e}", codec.name()))
        })?;

        stream.set_parameters(&encoder);
        stream.set_time_base(layout.time_base);

        log::debug!(
            "Video encoder {} {}x{} {:?} tb={} bitrate={}",
            codec.name(),
            width,
            height,
            format,
            layout.time_base,
            bitrate.map_or_else(|| "default".to_string(), |b| b.to_string()),
        );

        Ok(Self {
            encoder,
            stream_index,
            encoder_time_base: layout.time_base,
            output_time_base: layout.time_base,
            width,
            height,
            format,
            scaler: None,
            last_pts: None,
            frames_encoded: 0,
        })
    }

    /// Pick up the time base the muxer settled on in `write_header`.
    pub(crate) fn bind(&mut self, output: &Output) -> Result<(), VidkitError> {
        self.output_time_base = output
            .stream(self.stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| VidkitError::VideoEncodeError("output stream vanished".to_string()))?;
        Ok(())
    }

    /// Encode one decoded frame positioned `seconds` into the output.
    pub(crate) fn push_frame(
        &mut self,
        frame: &VideoFrame,
        seconds: f64,
        output: &mut Output,
    ) -> Result<(), VidkitError> {
        let key = ScalerKey {
            format: frame.format(),
            width: frame.width(),
            height: frame.height(),
        };

        if self.scaler.as_ref().is_none_or(|(cached, _)| *cached != key) {
            log::debug!(
                "Scaling {}x{} {:?} -> {}x{} {:?}",
                key.width,
                key.height,
                key.format,
                self.width,
                self.height,
                self.format
            );
            let context = ScalingContext::get(
                key.format,
                key.width,
                key.height,
                self.format,
                self.width,
                self.height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|e| VidkitError::VideoEncodeError(format!("cannot create scaler: {e}")))?;
            self.scaler = Some((key, context));
        }

        // A fresh frame per picture: encoders with lookahead may still hold
        // references to earlier buffers.
        let mut scaled = VideoFrame::empty();
        if let Some((_, scaler)) = self.scaler.as_mut() {
            scaler
                .run(frame, &mut scaled)
                .map_err(|e| VidkitError::VideoEncodeError(format!("scaling failed: {e}")))?;
        }

        let mut pts = seconds_to_stream_timestamp(seconds.max(0.0), self.encoder_time_base);
        if let Some(last) = self.last_pts
            && pts <= last
        {
            pts = last + 1;
        }
        self.last_pts = Some(pts);

        scaled.set_pts(Some(pts));
        scaled.set_kind(picture::Type::None);

        self.encoder
            .send_frame(&scaled)
            .map_err(|e| VidkitError::VideoEncodeError(format!("send_frame failed: {e}")))?;
        self.frames_encoded += 1;

        self.drain(output)
    }

    /// Flush the encoder and write any buffered packets.
    pub(crate) fn finish(&mut self, output: &mut Output) -> Result<u64, VidkitError> {
        self.encoder
            .send_eof()
            .map_err(|e| VidkitError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        self.drain(output)?;
        Ok(self.frames_encoded)
    }

    fn drain(&mut self, output: &mut Output) -> Result<(), VidkitError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.output_time_base);
            packet
                .write_interleaved(output)
                .map_err(|e| VidkitError::VideoEncodeError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }
}
