//! Audio handling: reassembly, WAV I/O and resampling

pub mod reassembler;
pub mod resample;
pub mod wav;

pub use reassembler::{
    concatenate_with_crossfade, crossfade_samples, duration_secs, normalize, repair_in_place,
    repair_invalid, Reassembler, RepairStats,
};
pub use resample::{resample, Resampler};
pub use wav::{encode_wav, load_wav_mono, write_wav};
