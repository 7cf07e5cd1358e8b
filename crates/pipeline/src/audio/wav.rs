//! WAV input and output

use std::io::Cursor;
use std::path::Path;

use vietvoice_core::{FinalWaveform, InputError, ResourceError, Result};

use super::resample::resample;

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn audio_error(path: &Path, e: impl std::fmt::Display) -> ResourceError {
    ResourceError::Audio {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Encode a waveform as an in-memory 16-bit mono WAV
pub fn encode_wav(waveform: &FinalWaveform) -> Result<Vec<u8>> {
    if waveform.is_empty() {
        return Err(InputError::EmptyAudio.into());
    }
    let mut buf = Cursor::new(Vec::<u8>::new());
    {
        let mut writer = hound::WavWriter::new(&mut buf, wav_spec(waveform.sample_rate))
            .map_err(std::io::Error::other)?;
        for &s in &waveform.samples {
            writer.write_sample(s).map_err(std::io::Error::other)?;
        }
        writer.finalize().map_err(std::io::Error::other)?;
    }
    Ok(buf.into_inner())
}

/// Write a waveform to `path` as 16-bit mono PCM
pub fn write_wav(path: impl AsRef<Path>, waveform: &FinalWaveform) -> Result<()> {
    let path = path.as_ref();
    if waveform.is_empty() {
        return Err(InputError::EmptyAudio.into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = hound::WavWriter::create(path, wav_spec(waveform.sample_rate))
        .map_err(|e| audio_error(path, e))?;
    for &s in &waveform.samples {
        writer.write_sample(s).map_err(|e| audio_error(path, e))?;
    }
    writer.finalize().map_err(|e| audio_error(path, e))?;

    tracing::info!(
        path = %path.display(),
        samples = waveform.samples.len(),
        duration_secs = waveform.duration_secs(),
        "Waveform written"
    );
    Ok(())
}

/// Decode a WAV file to mono f32 at `target_rate`
///
/// Integer and float PCM are accepted; multi-channel audio is averaged.
pub fn load_wav_mono(path: impl AsRef<Path>, target_rate: u32) -> std::result::Result<Vec<f32>, ResourceError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ResourceError::NotFound(path.to_path_buf()));
    }
    let mut reader = hound::WavReader::open(path).map_err(|e| audio_error(path, e))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| audio_error(path, e))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| audio_error(path, e))?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono: Vec<f32> = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    if mono.is_empty() {
        return Err(audio_error(path, "no samples"));
    }

    tracing::debug!(
        path = %path.display(),
        source_rate = spec.sample_rate,
        target_rate,
        channels,
        samples = mono.len(),
        "Reference audio decoded"
    );

    Ok(resample(&mono, spec.sample_rate, target_rate))
}
