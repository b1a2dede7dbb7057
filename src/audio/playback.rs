//! Handoff to an external playback device.
//!
//! The device side is not implemented here. A player pulls fixed-size
//! frame runs through [`FrameSource`] and opens its output with one of the
//! `WAVEFORMATEX` style descriptors below.

use super::wave::{FormatTag, WaveContainer, WaveFormat, KSDATAFORMAT_SUBTYPE_PCM, WAVE_FORMAT_EXTENSIBLE, WAVE_FORMAT_PCM};

pub const WAVE_FORMAT_EX_LEN: usize = 18;
pub const WAVE_FORMAT_EXTENSIBLE_LEN: usize = 40;
const EXTENSIBLE_CB_SIZE: u16 = 22;

/// Pull-based source of interleaved PCM frames.
pub trait FrameSource {
    fn wave_format(&self) -> &WaveFormat;

    /// Whether `frames` more frames can be pulled.
    fn has_frames(&self, frames: usize) -> bool;

    /// Pull the next `frames` frames; `None` when fewer remain.
    fn next_frames(&mut self, frames: usize) -> Option<&[u8]>;

    /// Bytes of the most recent pull.
    fn current_frames(&self) -> Option<&[u8]>;

    fn rewind(&mut self);
}

impl FrameSource for WaveContainer {
    fn wave_format(&self) -> &WaveFormat {
        self.format()
    }

    fn has_frames(&self, frames: usize) -> bool {
        self.has_next(frames)
    }

    fn next_frames(&mut self, frames: usize) -> Option<&[u8]> {
        let block = self.next(frames)?;
        self.block_bytes(&block).ok()
    }

    fn current_frames(&self) -> Option<&[u8]> {
        self.last().and_then(|block| self.block_bytes(&block).ok())
    }

    fn rewind(&mut self) {
        self.reset();
    }
}

/// Basic 18-byte format descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveFormatEx {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub cb_size: u16,
}

impl WaveFormatEx {
    pub fn to_le_bytes(&self) -> [u8; WAVE_FORMAT_EX_LEN] {
        let mut out = [0u8; WAVE_FORMAT_EX_LEN];
        out[0..2].copy_from_slice(&self.format_tag.to_le_bytes());
        out[2..4].copy_from_slice(&self.channels.to_le_bytes());
        out[4..8].copy_from_slice(&self.samples_per_sec.to_le_bytes());
        out[8..12].copy_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        out[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        out[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[16..18].copy_from_slice(&self.cb_size.to_le_bytes());
        out
    }
}

/// 40-byte descriptor for extensible waves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveFormatExtensible {
    pub format: WaveFormatEx,
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: [u8; 16],
}

impl WaveFormatExtensible {
    pub fn to_le_bytes(&self) -> [u8; WAVE_FORMAT_EXTENSIBLE_LEN] {
        let mut out = [0u8; WAVE_FORMAT_EXTENSIBLE_LEN];
        out[..WAVE_FORMAT_EX_LEN].copy_from_slice(&self.format.to_le_bytes());
        out[18..20].copy_from_slice(&self.valid_bits_per_sample.to_le_bytes());
        out[20..24].copy_from_slice(&self.channel_mask.to_le_bytes());
        out[24..40].copy_from_slice(&self.sub_format);
        out
    }
}

impl WaveContainer {
    /// Plain PCM descriptor; extensible waves are described as PCM.
    pub fn format_ex(&self) -> WaveFormatEx {
        let format = self.format();
        WaveFormatEx {
            format_tag: WAVE_FORMAT_PCM,
            channels: format.channels,
            samples_per_sec: format.sample_rate,
            avg_bytes_per_sec: format.avg_bytes_per_sec,
            block_align: format.block_align,
            bits_per_sample: format.bits_per_sample,
            cb_size: 0,
        }
    }

    /// Extensible descriptor, `None` unless the file carried one.
    pub fn format_extensible(&self) -> Option<WaveFormatExtensible> {
        let format = self.format();
        if format.format_tag != FormatTag::Extensible {
            return None;
        }
        let extension = format.extension?;
        Some(WaveFormatExtensible {
            format: WaveFormatEx {
                format_tag: WAVE_FORMAT_EXTENSIBLE,
                cb_size: EXTENSIBLE_CB_SIZE,
                ..self.format_ex()
            },
            valid_bits_per_sample: extension.valid_bits_per_sample,
            channel_mask: extension.channel_mask,
            sub_format: KSDATAFORMAT_SUBTYPE_PCM,
        })
    }
}
