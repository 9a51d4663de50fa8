// Audio module - sample sources and sample storage
//
// Architecture:
// - SampleBuffer: owned or memory-mapped f64 samples with flush-on-release
// - ToneMix: deterministic synthesized input
// - read_wav: decoded WAV input mixed to mono

pub mod buffer;
pub mod tones;
pub mod wav;

pub use buffer::SampleBuffer;
pub use tones::{ToneMix, ToneSpec};
pub use wav::read_wav;
