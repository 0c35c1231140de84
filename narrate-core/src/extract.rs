//! Audio extraction: pull the audio track out of a video container into a PCM WAV file

use crate::audio::{ensure_ffmpeg_initialized, FrameResampler, WHISPER_SAMPLE_RATE};
use crate::error::{NarrateError, Result};
use ffmpeg_next as ffmpeg;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tokio::task;
use tracing::{info, warn};

/// Extract the audio track of a video file into a 16 kHz mono 16-bit PCM WAV file.
///
/// The destination is created or overwritten. Source-side failures (missing or
/// corrupt file, no audio stream) are [`NarrateError::MediaRead`]; failures to
/// write the destination are [`NarrateError::MediaWrite`].
pub async fn extract_audio<P, Q>(video_path: P, wav_path: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let video_path = video_path.as_ref().to_path_buf();
    let wav_path = wav_path.as_ref().to_path_buf();

    task::spawn_blocking(move || extract_audio_sync(&video_path, &wav_path))
        .await
        .map_err(|e| NarrateError::MediaRead(format!("Task join error: {}", e)))?
}

fn extract_audio_sync(video_path: &Path, wav_path: &Path) -> Result<()> {
    ensure_ffmpeg_initialized()?;

    if !video_path.exists() {
        return Err(NarrateError::MediaRead(format!(
            "Video file not found: {}",
            video_path.display()
        )));
    }

    info!("Extracting audio from {}", video_path.display());

    let mut ictx = ffmpeg::format::input(&video_path)
        .map_err(|e| NarrateError::MediaRead(format!("Failed to open video file: {}", e)))?;

    let input = ictx
        .streams()
        .best(ffmpeg::media::Type::Audio)
        .ok_or_else(|| {
            NarrateError::MediaRead(format!(
                "No audio stream found in {}",
                video_path.display()
            ))
        })?;

    let stream_index = input.index();

    let context_decoder = ffmpeg::codec::context::Context::from_parameters(input.parameters())
        .map_err(|e| {
            NarrateError::MediaRead(format!("Failed to create decoder context: {}", e))
        })?;

    let mut decoder = context_decoder
        .decoder()
        .audio()
        .map_err(|e| NarrateError::MediaRead(format!("Failed to get audio decoder: {}", e)))?;

    let mut writer = WavWriter::create(
        wav_path,
        WavSpec {
            channels: 1,
            sample_rate: WHISPER_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )
    .map_err(|e| {
        NarrateError::MediaWrite(format!(
            "Failed to create {}: {}",
            wav_path.display(),
            e
        ))
    })?;

    let mut frame = ffmpeg::frame::Audio::empty();
    let mut resampler = FrameResampler::new(
        ffmpeg::format::Sample::I16(ffmpeg::format::sample::Type::Packed),
        ffmpeg::channel_layout::ChannelLayout::MONO,
        WHISPER_SAMPLE_RATE,
    );
    let mut write_error: Option<hound::Error> = None;
    let mut written = 0u64;

    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        match decoder.send_packet(&packet) {
            Ok(()) => {
                while decoder.receive_frame(&mut frame).is_ok() {
                    resampler.push(&frame, |out| {
                        written += write_i16_frame(out, &mut writer, &mut write_error)
                    })?;
                    if let Some(e) = write_error.take() {
                        return Err(NarrateError::MediaWrite(format!(
                            "Failed to write {}: {}",
                            wav_path.display(),
                            e
                        )));
                    }
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

    match decoder.send_eof() {
        Ok(()) => {
            while decoder.receive_frame(&mut frame).is_ok() {
                resampler.push(&frame, |out| {
                    written += write_i16_frame(out, &mut writer, &mut write_error)
                })?;
                if let Some(e) = write_error.take() {
                    return Err(NarrateError::MediaWrite(format!(
                        "Failed to write {}: {}",
                        wav_path.display(),
                        e
                    )));
                }
            }
        }
        Err(e) => warn!("Failed to flush decoder, continuing: {}", e),
    }

    if written == 0 {
        return Err(NarrateError::MediaRead(format!(
            "No audio data could be extracted from {}",
            video_path.display()
        )));
    }

    writer.finalize().map_err(|e| {
        NarrateError::MediaWrite(format!("Failed to finalize {}: {}", wav_path.display(), e))
    })?;

    info!(
        "Audio saved to {} ({:.2}s)",
        wav_path.display(),
        written as f32 / WHISPER_SAMPLE_RATE as f32
    );

    Ok(())
}

/// Write one resampled i16 frame, reporting the first writer error through `error`.
/// Returns the number of samples written.
fn write_i16_frame<W>(
    resampled: &ffmpeg::frame::Audio,
    writer: &mut WavWriter<W>,
    error: &mut Option<hound::Error>,
) -> u64
where
    W: std::io::Write + std::io::Seek,
{
    let sample_count = resampled.samples();
    let data = resampled.data(0);
    let slice = unsafe {
        std::slice::from_raw_parts(data.as_ptr() as *const i16, sample_count)
    };

    for &sample in slice {
        if let Err(e) = writer.write_sample(sample) {
            *error = Some(e);
            break;
        }
    }

    sample_count as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_video_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_audio("nonexistent_video.mp4", dir.path().join("out.wav")).await;
        assert!(matches!(result, Err(NarrateError::MediaRead(_))));
    }

    #[tokio::test]
    async fn test_non_media_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not_a_video.mp4");
        std::fs::write(&bogus, b"definitely not a container").unwrap();

        let result = extract_audio(&bogus, dir.path().join("out.wav")).await;
        assert!(matches!(result, Err(NarrateError::MediaRead(_))));
    }
}
