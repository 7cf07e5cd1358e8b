//! Sample rate conversion for reference audio

use rubato::{FftFixedIn, Resampler as _};

/// Inputs shorter than this use linear interpolation
const MIN_FFT_INPUT: usize = 64;
const FFT_CHUNK: usize = 1024;

/// Mono resampler between two fixed rates
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    from_rate: u32,
    to_rate: u32,
}

impl Resampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        Self { from_rate, to_rate }
    }

    fn output_len(&self, input_len: usize) -> usize {
        (input_len as f64 * self.to_rate as f64 / self.from_rate as f64).round() as usize
    }

    /// Resample `input`; output length is `input.len() * to / from`, rounded
    pub fn resample(&self, input: &[f32]) -> Vec<f32> {
        if self.from_rate == self.to_rate || self.from_rate == 0 || self.to_rate == 0 {
            return input.to_vec();
        }
        if input.len() < MIN_FFT_INPUT {
            return self.resample_linear(input);
        }

        match self.resample_fft(input) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("FFT resampling failed, using linear fallback: {}", e);
                self.resample_linear(input)
            }
        }
    }

    fn resample_fft(&self, input: &[f32]) -> Result<Vec<f32>, String> {
        let chunk_size = input.len().min(FFT_CHUNK);
        let mut resampler = FftFixedIn::<f64>::new(
            self.from_rate as usize,
            self.to_rate as usize,
            chunk_size,
            2, // sub_chunks
            1, // channels
        )
        .map_err(|e| e.to_string())?;

        let samples: Vec<f64> = input.iter().map(|&s| s as f64).collect();
        let delay = resampler.output_delay();
        let expected = self.output_len(input.len());
        let mut output: Vec<f64> = Vec::with_capacity(expected + delay);

        let mut pos = 0;
        while pos < samples.len() {
            let needed = resampler.input_frames_next();
            let frames = if samples.len() - pos >= needed {
                let block: [&[f64]; 1] = [&samples[pos..pos + needed]];
                pos += needed;
                resampler.process(&block[..], None).map_err(|e| e.to_string())?
            } else {
                let block: [&[f64]; 1] = [&samples[pos..]];
                pos = samples.len();
                resampler
                    .process_partial(Some(&block[..]), None)
                    .map_err(|e| e.to_string())?
            };
            output.extend_from_slice(&frames[0]);
        }

        // flush the resampler's internal delay
        while output.len() < expected + delay {
            let frames = resampler
                .process_partial::<&[f64]>(None, None)
                .map_err(|e| e.to_string())?;
            if frames[0].is_empty() {
                break;
            }
            output.extend_from_slice(&frames[0]);
        }

        let mut trimmed: Vec<f32> = output
            .into_iter()
            .skip(delay)
            .take(expected)
            .map(|s| s as f32)
            .collect();
        trimmed.resize(expected, 0.0);
        Ok(trimmed)
    }

    fn resample_linear(&self, input: &[f32]) -> Vec<f32> {
        if input.is_empty() {
            return Vec::new();
        }
        let ratio = self.to_rate as f64 / self.from_rate as f64;
        let output_len = self.output_len(input.len());
        let last = input.len() - 1;

        (0..output_len)
            .map(|i| {
                let src = i as f64 / ratio;
                let lo = (src.floor() as usize).min(last);
                let hi = (lo + 1).min(last);
                let frac = (src - lo as f64) as f32;
                input[lo] * (1.0 - frac) + input[hi] * frac
            })
            .collect()
    }
}

/// Convenience wrapper
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    Resampler::new(from_rate, to_rate).resample(input)
}
