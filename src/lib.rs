//! PCM WAV parsing and analysis.
//!
//! [`WaveContainer`] owns a RIFF/WAVE image and hands out frame blocks from
//! its data chunk. Blocks are read through [`SampleView`], windowed in place,
//! transformed into spectra, and fed to the energy based [`BeatDetector`] or
//! the correlation tempo search [`find_bpm`].

pub mod audio;
pub mod config;
pub mod error;

pub use audio::analysis::{correlation, find_bpm, find_bpm_with, BeatDetector};
pub use audio::features::{BeatStep, ChannelResult, ChannelSelect, SpectrumBin};
pub use audio::playback::{FrameSource, WaveFormatEx, WaveFormatExtensible};
pub use audio::spectrum::{analyze_block, analyze_next, complex_fft, transform, Dft, Fft, Spectrum, Transform, TransformKind};
pub use audio::stereo::SampleView;
pub use audio::wave::{FormatTag, MemBlock, WaveContainer, WaveFormat};
pub use audio::window::{apply_window, WindowType};
pub use config::{find_config, load_config, Config};
pub use error::{Result, WavError};
