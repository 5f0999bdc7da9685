//! Audio side of the transcoding pipeline.
//!
//! Decoded audio from every input is resampled to the encoder's format,
//! rate and layout, queued in a [`SampleFifo`], and cut into frames of the
//! size the encoder expects. Gaps between inputs are filled with silence
//! so audio stays aligned with video across joins.

use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::codec::flag::Flags as CodecFlags;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Sample};
use ffmpeg_next::frame::Audio as AudioFrame;
use ffmpeg_next::software::resampling::Context as ResamplingContext;
use ffmpeg_next::{ChannelLayout, Codec, Packet, Rational};

use crate::bitrate::Bitrate;
use crate::error::VidkitError;

/// Chunk size for encoders that accept any frame size (PCM and friends).
const DEFAULT_CHUNK_SAMPLES: usize = 1024;

/// Extra room in resampler output frames for the resampler's own delay.
const RESAMPLE_HEADROOM: usize = 512;

/// Channel layout used for an output with `channels` channels.
pub(crate) fn layout_for_channels(channels: u16) -> (ChannelLayout, u16) {
    match channels {
        1 => (ChannelLayout::MONO, 1),
        6 => (ChannelLayout::_5POINT1, 6),
        8 => (ChannelLayout::_7POINT1, 8),
        _ => (ChannelLayout::STEREO, 2),
    }
}

/// Byte-level FIFO of interleaved or planar audio samples.
///
/// One buffer per plane. `unit` is the byte size of one sample in one
/// plane: the sample size for planar formats, sample size times channel
/// count for packed ones.
#[derive(Debug)]
pub(crate) struct SampleFifo {
    planes: Vec<Vec<u8>>,
    unit: usize,
    silence: u8,
}

impl SampleFifo {
    pub(crate) fn new(planes: usize, unit: usize, silence: u8) -> Self {
        Self {
            planes: vec![Vec::new(); planes.max(1)],
            unit: unit.max(1),
            silence,
        }
    }

    fn for_format(format: Sample, channels: u16) -> Self {
        let channels = usize::from(channels.max(1));
        let silence = if matches!(format, Sample::U8(_)) { 0x80 } else { 0 };
        if format.is_planar() {
            Self::new(channels, format.bytes(), silence)
        } else {
            Self::new(1, format.bytes() * channels, silence)
        }
    }

    /// Samples currently queued.
    pub(crate) fn len(&self) -> usize {
        self.planes[0].len() / self.unit
    }

    pub(crate) fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Append `samples` samples from each plane of `data`.
    ///
    /// Planes beyond the FIFO's plane count are ignored; missing planes are
    /// filled with silence.
    pub(crate) fn push(&mut self, data: &[&[u8]], samples: usize) {
        let bytes = samples * self.unit;
        for (index, plane) in self.planes.iter_mut().enumerate() {
            match data.get(index) {
                Some(source) if source.len() >= bytes => plane.extend_from_slice(&source[..bytes]),
                _ => plane.resize(plane.len() + bytes, self.silence),
            }
        }
    }

    pub(crate) fn push_silence(&mut self, samples: usize) {
        let bytes = samples * self.unit;
        for plane in &mut self.planes {
            plane.resize(plane.len() + bytes, self.silence);
        }
    }

    /// Remove up to `samples` samples from the front of every plane.
    pub(crate) fn pop(&mut self, samples: usize) -> Vec<Vec<u8>> {
        let bytes = samples.min(self.len()) * self.unit;
        self.planes
            .iter_mut()
            .map(|plane| plane.drain(..bytes).collect())
            .collect()
    }
}

/// Sample rate and channel count of the first input's audio, used to
/// configure the output encoder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AudioLayout {
    pub sample_rate: u32,
    pub channels: u16,
}

pub(crate) struct AudioLane {
    encoder: ffmpeg_next::encoder::Audio,
    stream_index: usize,
    encoder_time_base: Rational,
    output_time_base: Rational,
    format: Sample,
    layout: ChannelLayout,
    rate: u32,
    frame_samples: usize,
    fifo: SampleFifo,
    resampler: Option<ResamplingContext>,
    samples_sent: u64,
    input_start: u64,
}

impl AudioLane {
    /// Add an audio stream to `output` and open its encoder.
    ///
    /// Must be called before the output header is written.
    pub(crate) fn open(
        output: &mut Output,
        codec: Codec,
        layout: AudioLayout,
        bitrate: Option<Bitrate>,
    ) -> Result<Self, VidkitError> {
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let audio_codec = codec.audio().map_err(|e| {
            VidkitError::AudioEncodeError(format!("'{}' is not an audio encoder: {e}", codec.name()))
        })?;

        let format = audio_codec
            .formats()
            .and_then(|mut formats| formats.next())
            .unwrap_or(Sample::F32(ffmpeg_next::format::sample::Type::Planar));

        let rate = match audio_codec.rates() {
            Some(rates) => closest_rate(rates, layout.sample_rate),
            None => layout.sample_rate,
        };
        if rate == 0 {
            return Err(VidkitError::AudioEncodeError(
                "input reports a sample rate of 0".to_string(),
            ));
        }

        let (channel_layout, channels) = layout_for_channels(layout.channels);
        let time_base = Rational(1, rate as i32);

        let mut stream = output
            .add_stream(codec)
            .map_err(|e| VidkitError::AudioEncodeError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::new_with_codec(codec)
            .encoder()
            .audio()
            .map_err(|e| {
                VidkitError::AudioEncodeError(format!("cannot create audio encoder: {e}"))
            })?;

        encoder.set_rate(rate as i32);
        encoder.set_channel_layout(channel_layout);
        encoder.set_format(format);
        encoder.set_time_base(time_base);
        if let Some(bitrate) = bitrate {
            encoder.set_bit_rate(bitrate.bits_per_second() as usize);
        }
        if needs_global_header {
            encoder.set_flags(CodecFlags::GLOBAL_HEADER);
        }

        let encoder = encoder.open_as(codec).map_err(|e| {
            VidkitError::AudioEncodeError(format!("cannot open encoder '{}': {e}", codec.name()))
        })?;

        stream.set_parameters(&encoder);
        stream.set_time_base(time_base);

        let frame_samples = match encoder.frame_size() {
            0 => DEFAULT_CHUNK_SAMPLES,
            size => size as usize,
        };

        log::debug!(
            "Audio encoder {} {} Hz {} ch {:?} frame={} bitrate={}",
            codec.name(),
            rate,
            channels,
            format,
            frame_samples,
            bitrate.map_or_else(|| "default".to_string(), |b| b.to_string()),
        );

        Ok(Self {
            encoder,
            stream_index,
            encoder_time_base: time_base,
            output_time_base: time_base,
            format,
            layout: channel_layout,
            rate,
            frame_samples,
            fifo: SampleFifo::for_format(format, channels),
            resampler: None,
            samples_sent: 0,
            input_start: 0,
        })
    }

    /// Pick up the time base the muxer settled on in `write_header`.
    pub(crate) fn bind(&mut self, output: &Output) -> Result<(), VidkitError> {
        self.output_time_base = output
            .stream(self.stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| VidkitError::AudioEncodeError("output stream vanished".to_string()))?;
        Ok(())
    }

    /// Output position in seconds, counting queued samples.
    pub(crate) fn position_seconds(&self) -> f64 {
        self.queued_total() as f64 / f64::from(self.rate)
    }

    fn queued_total(&self) -> u64 {
        self.samples_sent + self.fifo.len() as u64
    }

    /// Prepare for a new input whose audio is decoded by `decoder`.
    ///
    /// The input starts `offset_seconds` into the output; any gap since the
    /// previous input is filled with silence.
    pub(crate) fn begin_input(
        &mut self,
        decoder: &ffmpeg_next::decoder::Audio,
        offset_seconds: f64,
        output: &mut Output,
    ) -> Result<(), VidkitError> {
        self.pad_to(offset_seconds, output)?;

        let resampler = ResamplingContext::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            self.format,
            self.layout,
            self.rate,
        )
        .map_err(|e| VidkitError::AudioEncodeError(format!("cannot create resampler: {e}")))?;
        self.resampler = Some(resampler);
        self.input_start = self.queued_total();
        Ok(())
    }

    /// Queue silence until the output reaches `seconds`.
    pub(crate) fn pad_to(&mut self, seconds: f64, output: &mut Output) -> Result<(), VidkitError> {
        let target = (seconds.max(0.0) * f64::from(self.rate)) as u64;
        let queued = self.queued_total();
        if target > queued {
            let missing = (target - queued) as usize;
            log::debug!("Padding {missing} samples of silence");
            self.fifo.push_silence(missing);
            self.emit_full_frames(output)?;
        }
        Ok(())
    }

    /// Resample and queue one decoded frame, encoding every full frame.
    pub(crate) fn push_frame(
        &mut self,
        frame: &AudioFrame,
        output: &mut Output,
    ) -> Result<(), VidkitError> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Err(VidkitError::AudioEncodeError(
                "audio frame received before input setup".to_string(),
            ));
        };

        let capacity = frame.samples() * self.rate as usize / frame.rate().max(1) as usize
            + RESAMPLE_HEADROOM;
        let mut resampled = AudioFrame::new(self.format, capacity, self.layout);
        resampler
            .run(frame, &mut resampled)
            .map_err(|e| VidkitError::AudioEncodeError(format!("resampling failed: {e}")))?;

        self.queue(&resampled);
        self.emit_full_frames(output)
    }

    /// Drain the current input's resampler.
    ///
    /// Returns how many seconds of audio this input contributed.
    pub(crate) fn end_input(&mut self, output: &mut Output) -> Result<f64, VidkitError> {
        if let Some(mut resampler) = self.resampler.take() {
            let mut tail = AudioFrame::new(self.format, RESAMPLE_HEADROOM * 8, self.layout);
            match resampler.flush(&mut tail) {
                Ok(_) => self.queue(&tail),
                Err(error) => log::debug!("Resampler flush returned {error}"),
            }
        }
        self.emit_full_frames(output)?;

        let contributed = self.queued_total().saturating_sub(self.input_start);
        Ok(contributed as f64 / f64::from(self.rate))
    }

    /// Encode any remaining samples, padding the last frame with silence,
    /// then flush the encoder.
    pub(crate) fn finish(&mut self, output: &mut Output) -> Result<u64, VidkitError> {
        let remainder = self.fifo.len() % self.frame_samples;
        if remainder != 0 {
            self.fifo.push_silence(self.frame_samples - remainder);
        }
        self.emit_full_frames(output)?;

        self.encoder
            .send_eof()
            .map_err(|e| VidkitError::AudioEncodeError(format!("send_eof failed: {e}")))?;
        self.drain(output)?;
        Ok(self.samples_sent)
    }

    fn queue(&mut self, frame: &AudioFrame) {
        let samples = frame.samples();
        if samples == 0 {
            return;
        }
        let planes: Vec<&[u8]> = (0..self.fifo.plane_count().min(frame.planes()))
            .map(|index| frame.data(index))
            .collect();
        self.fifo.push(&planes, samples);
    }

    fn emit_full_frames(&mut self, output: &mut Output) -> Result<(), VidkitError> {
        while self.fifo.len() >= self.frame_samples {
            let planes = self.fifo.pop(self.frame_samples);

            let mut frame = AudioFrame::new(self.format, self.frame_samples, self.layout);
            frame.set_rate(self.rate);
            for (index, plane) in planes.iter().enumerate() {
                frame.data_mut(index)[..plane.len()].copy_from_slice(plane);
            }
            frame.set_pts(Some(self.samples_sent as i64));
            self.samples_sent += self.frame_samples as u64;

            self.encoder
                .send_frame(&frame)
                .map_err(|e| VidkitError::AudioEncodeError(format!("send_frame failed: {e}")))?;
            self.drain(output)?;
        }
        Ok(())
    }

    fn drain(&mut self, output: &mut Output) -> Result<(), VidkitError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.output_time_base);
            packet
                .write_interleaved(output)
                .map_err(|e| VidkitError::AudioEncodeError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }
}

fn closest_rate(rates: impl Iterator<Item = i32>, wanted: u32) -> u32 {
    let wanted = i64::from(wanted);
    rates
        .filter(|&rate| rate > 0)
        .min_by_key(|&rate| (i64::from(rate) - wanted).abs())
        .map_or(wanted as u32, |rate| rate as u32)
}
