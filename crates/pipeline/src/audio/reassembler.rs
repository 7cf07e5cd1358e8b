//! Audio reassembly
//!
//! Decoded chunks are repaired, spliced with equal-power crossfades and
//! peak-normalized into 16-bit output. Numeric artifacts in model output
//! are expected and fixed here, never reported as errors.

use std::f32::consts::FRAC_PI_2;

use vietvoice_config::constants::audio::{
    CLIP_CEILING, CLIP_KNEE, NORMALIZE_PEAK, SILENCE_FLOOR,
};
use vietvoice_core::{AudioChunk, FinalWaveform};

/// Counts of samples touched by [`repair_in_place`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub nan: usize,
    pub infinite: usize,
    pub clipped: usize,
}

impl RepairStats {
    pub fn total(&self) -> usize {
        self.nan + self.infinite + self.clipped
    }

    fn merge(&mut self, other: RepairStats) {
        self.nan += other.nan;
        self.infinite += other.infinite;
        self.clipped += other.clipped;
    }
}

/// Smoothly limit magnitudes above the knee so they never reach the ceiling
fn soft_limit(x: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude <= CLIP_KNEE {
        return x;
    }
    let range = CLIP_CEILING - CLIP_KNEE;
    let limited = CLIP_KNEE + range * ((magnitude - CLIP_KNEE) / range).tanh();
    limited.min(CLIP_CEILING).copysign(x)
}

/// Replace NaN with silence, infinities with full scale, then soft-limit
pub fn repair_in_place(samples: &mut [f32]) -> RepairStats {
    let mut stats = RepairStats::default();
    for s in samples.iter_mut() {
        if s.is_nan() {
            stats.nan += 1;
            *s = 0.0;
            continue;
        }
        if s.is_infinite() {
            stats.infinite += 1;
            *s = 1.0f32.copysign(*s);
        }
        if s.abs() > CLIP_KNEE {
            stats.clipped += 1;
            *s = soft_limit(*s);
        }
    }
    stats
}

/// Owned variant of [`repair_in_place`]
pub fn repair_invalid(mut samples: Vec<f32>) -> Vec<f32> {
    repair_in_place(&mut samples);
    samples
}

/// Crossfade length in samples
pub fn crossfade_samples(crossfade_secs: f64, sample_rate: u32) -> usize {
    if !(crossfade_secs.is_finite() && crossfade_secs > 0.0) {
        return 0;
    }
    (crossfade_secs * sample_rate as f64).round() as usize
}

/// Splice chunks in order with equal-power crossfades of `crossfade` samples
///
/// Each window is clamped to the shorter of its two neighbours. Output
/// length is the sum of chunk lengths minus the windows actually used.
pub fn concatenate_with_crossfade(chunks: &[Vec<f32>], crossfade: usize) -> Vec<f32> {
    match chunks {
        [] => return Vec::new(),
        [only] => return only.clone(),
        _ => {}
    }

    let total: usize = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&chunks[0]);

    for pair in chunks.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let window = crossfade.min(prev.len()).min(next.len()).min(out.len());
        let start = out.len() - window;

        for k in 0..window {
            let t = (k as f32 + 0.5) / window as f32;
            let fade_out = (t * FRAC_PI_2).cos();
            let fade_in = (t * FRAC_PI_2).sin();
            out[start + k] = out[start + k] * fade_out + next[k] * fade_in;
        }
        out.extend_from_slice(&next[window..]);
    }

    out
}

/// Peak-normalize to 16-bit with headroom below full scale
///
/// Near-silent input is converted without amplification.
pub fn normalize(samples: &[f32]) -> Vec<i16> {
    let peak = samples
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0f32, |acc, s| acc.max(s.abs()));

    let gain = if peak < SILENCE_FLOOR {
        1.0
    } else {
        NORMALIZE_PEAK / peak
    };

    samples
        .iter()
        .map(|&s| {
            let s = if s.is_finite() { s } else { 0.0 };
            let scaled = (s * gain).clamp(-NORMALIZE_PEAK, NORMALIZE_PEAK);
            (scaled * i16::MAX as f32).round() as i16
        })
        .collect()
}

/// Seconds of audio in `len` samples
pub fn duration_secs(len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    len as f64 / sample_rate as f64
}

/// Repair, splice and normalize decoded chunks
#[derive(Debug, Clone)]
pub struct Reassembler {
    crossfade: usize,
    sample_rate: u32,
}

impl Reassembler {
    pub fn new(crossfade_secs: f64, sample_rate: u32) -> Self {
        Self {
            crossfade: crossfade_samples(crossfade_secs, sample_rate),
            sample_rate,
        }
    }

    pub fn crossfade(&self) -> usize {
        self.crossfade
    }

    /// Build the final waveform; chunks are ordered by their index first
    pub fn assemble(&self, mut chunks: Vec<AudioChunk>) -> FinalWaveform {
        chunks.sort_by_key(|c| c.index);

        let mut stats = RepairStats::default();
        let parts: Vec<Vec<f32>> = chunks
            .into_iter()
            .map(|mut chunk| {
                stats.merge(repair_in_place(&mut chunk.samples));
                chunk.samples
            })
            .collect();

        if stats.total() > 0 {
            tracing::warn!(
                nan = stats.nan,
                infinite = stats.infinite,
                clipped = stats.clipped,
                "Repaired invalid samples in decoded audio"
            );
        }

        let joined = concatenate_with_crossfade(&parts, self.crossfade);
        let samples = normalize(&joined);

        tracing::debug!(
            chunks = parts.len(),
            crossfade = self.crossfade,
            samples = samples.len(),
            "Audio reassembled"
        );

        FinalWaveform::new(samples, self.sample_rate)
    }
}
