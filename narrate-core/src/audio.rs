//! Audio decoding for transcription input, using FFmpeg

use crate::error::{NarrateError, Result};
use ffmpeg_next as ffmpeg;
use std::path::Path;
use std::sync::OnceLock;
use tokio::task;
use tracing::warn;

/// Sample rate Whisper models expect
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Initialize FFmpeg once per process and silence its native logging
pub(crate) fn ensure_ffmpeg_initialized() -> Result<()> {
    static INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

    match INIT.get_or_init(|| {
        ffmpeg::init().map(|()| unsafe {
            ffmpeg::sys::av_log_set_level(ffmpeg::sys::AV_LOG_QUIET);
        })
    }) {
        Ok(()) => Ok(()),
        Err(e) => Err(NarrateError::MediaRead(format!(
            "Failed to initialize FFmpeg: {}",
            e
        ))),
    }
}

/// Audio data structure
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Raw audio samples (f32, mono, 16kHz)
    pub samples: Vec<f32>,
    /// Sample rate
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f32,
}

/// Audio processor using FFmpeg
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioProcessor;

impl AudioProcessor {
    /// Create a new audio processor
    pub fn new() -> Self {
        Self
    }

    /// Load an audio file and convert it to the format expected by Whisper
    pub async fn load_audio<P: AsRef<Path>>(&self, path: P) -> Result<AudioData> {
        let path = path.as_ref().to_path_buf();

        // Run FFmpeg processing in a blocking task to avoid stalling the runtime
        task::spawn_blocking(move || Self::load_audio_sync(&path))
            .await
            .map_err(|e| NarrateError::MediaRead(format!("Task join error: {}", e)))?
    }

    /// Synchronous audio loading implementation
    fn load_audio_sync(path: &Path) -> Result<AudioData> {
        ensure_ffmpeg_initialized()?;

        if !path.exists() {
            return Err(NarrateError::MediaRead(format!(
                "Audio file not found: {}",
                path.display()
            )));
        }

        let mut ictx = ffmpeg::format::input(&path)
            .map_err(|e| NarrateError::MediaRead(format!("Failed to open audio file: {}", e)))?;

        let input = ictx
            .streams()
            .best(ffmpeg::media::Type::Audio)
            .ok_or_else(|| NarrateError::MediaRead("No audio stream found".to_string()))?;

        let stream_index = input.index();

        let context_decoder = ffmpeg::codec::context::Context::from_parameters(input.parameters())
            .map_err(|e| {
                NarrateError::MediaRead(format!("Failed to create decoder context: {}", e))
            })?;

        let mut decoder = context_decoder
            .decoder()
            .audio()
            .map_err(|e| NarrateError::MediaRead(format!("Failed to get audio decoder: {}", e)))?;

        let mut samples = Vec::new();
        let mut frame = ffmpeg::frame::Audio::empty();
        let mut resampler = FrameResampler::new(
            ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Packed),
            ffmpeg::channel_layout::ChannelLayout::MONO,
            WHISPER_SAMPLE_RATE,
        );

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            match decoder.send_packet(&packet) {
                Ok(()) => {
                    while decoder.receive_frame(&mut frame).is_ok() {
                        resampler.push(&frame, |out| collect_f32(out, &mut samples))?;
                    }
                }
                // Skip corrupted packets and keep decoding
                Err(ffmpeg::Error::InvalidData) => {
                    warn!("Skipping invalid packet in stream {}", stream_index);
                    continue;
                }
                Err(e) => {
                    return Err(NarrateError::MediaRead(format!(
                        "Failed to send packet to decoder: {}",
                        e
                    )))
                }
            }
        }

        // Flush the decoder, keep whatever decoded so far if flushing fails
        match decoder.send_eof() {
            Ok(()) => {
                while decoder.receive_frame(&mut frame).is_ok() {
                    resampler.push(&frame, |out| collect_f32(out, &mut samples))?;
                }
            }
            Err(e) => warn!("Failed to flush decoder, continuing: {}", e),
        }

        if samples.is_empty() {
            return Err(NarrateError::MediaRead(
                "No audio data could be extracted from file - file may be corrupted or unsupported"
                    .to_string(),
            ));
        }

        let duration = samples.len() as f32 / WHISPER_SAMPLE_RATE as f32;

        Ok(AudioData {
            samples,
            sample_rate: WHISPER_SAMPLE_RATE,
            duration,
        })
    }
}

fn collect_f32(resampled: &ffmpeg::frame::Audio, samples: &mut Vec<f32>) {
    let sample_count = resampled.samples();
    let data = resampled.data(0);
    unsafe {
        let ptr = data.as_ptr() as *const f32;
        samples.extend_from_slice(std::slice::from_raw_parts(ptr, sample_count));
    }
}

/// Resampler that converts decoded frames to a fixed output format,
/// recreating the FFmpeg context whenever the input properties change.
pub(crate) struct FrameResampler {
    context: Option<ffmpeg::software::resampling::context::Context>,
    input: Option<(
        ffmpeg::format::Sample,
        ffmpeg::channel_layout::ChannelLayout,
        u32,
    )>,
    out_format: ffmpeg::format::Sample,
    out_layout: ffmpeg::channel_layout::ChannelLayout,
    out_rate: u32,
    output: ffmpeg::frame::Audio,
}

impl FrameResampler {
    pub(crate) fn new(
        out_format: ffmpeg::format::Sample,
        out_layout: ffmpeg::channel_layout::ChannelLayout,
        out_rate: u32,
    ) -> Self {
        Self {
            context: None,
            input: None,
            out_format,
            out_layout,
            out_rate,
            output: ffmpeg::frame::Audio::empty(),
        }
    }

    /// Resample one decoded frame and hand the converted frame to `sink`
    pub(crate) fn push<F>(&mut self, frame: &ffmpeg::frame::Audio, sink: F) -> Result<()>
    where
        F: FnOnce(&ffmpeg::frame::Audio),
    {
        let layout = if frame.channel_layout().channels() == 0 {
            // Some decoders leave the layout unset, derive it from the channel count
            match frame.channels() {
                1 => ffmpeg::channel_layout::ChannelLayout::MONO,
                2 => ffmpeg::channel_layout::ChannelLayout::STEREO,
                n => ffmpeg::channel_layout::ChannelLayout::default(n as i32),
            }
        } else {
            frame.channel_layout()
        };

        let key = (frame.format(), layout, frame.rate());
        if self.context.is_none() || self.input != Some(key) {
            self.context = Some(
                ffmpeg::software::resampling::context::Context::get(
                    frame.format(),
                    layout,
                    frame.rate(),
                    self.out_format,
                    self.out_layout,
                    self.out_rate,
                )
                .map_err(|e| {
                    NarrateError::MediaRead(format!("Failed to create resampler: {}", e))
                })?,
            );
            self.input = Some(key);
        }

        if let Some(ctx) = self.context.as_mut() {
            match ctx.run(frame, &mut self.output) {
                Ok(_) => sink(&self.output),
                Err(e) => {
                    // Frame properties changed mid-stream, drop the frame and rebuild next time
                    warn!("Skipping frame due to resampling error: {}", e);
                    self.context = None;
                    self.input = None;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_error() {
        let processor = AudioProcessor::new();
        let result = processor.load_audio("nonexistent_file.wav").await;
        assert!(matches!(result, Err(NarrateError::MediaRead(_))));
    }
}
