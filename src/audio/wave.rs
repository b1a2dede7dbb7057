use std::ops::Range;

use super::spectrum::{Dft, Fft};
use super::stereo::SampleView;
use super::window::{apply_window, WindowType};
use crate::error::{Result, WavError};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_ALAW: u16 = 0x0006;
pub const WAVE_FORMAT_MULAW: u16 = 0x0007;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// KSDATAFORMAT_SUBTYPE_PCM, 00000001-0000-0010-8000-00AA00389B71, as stored on disk.
pub const KSDATAFORMAT_SUBTYPE_PCM: [u8; 16] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const FMT_BASE_LEN: usize = 16;
const FMT_EXTENSIBLE_LEN: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatTag {
    Pcm,
    IeeeFloat,
    ALaw,
    MuLaw,
    Extensible,
    Other(u16),
}

impl FormatTag {
    pub fn from_u16(tag: u16) -> Self {
        match tag {
            WAVE_FORMAT_PCM => FormatTag::Pcm,
            WAVE_FORMAT_IEEE_FLOAT => FormatTag::IeeeFloat,
            WAVE_FORMAT_ALAW => FormatTag::ALaw,
            WAVE_FORMAT_MULAW => FormatTag::MuLaw,
            WAVE_FORMAT_EXTENSIBLE => FormatTag::Extensible,
            other => FormatTag::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            FormatTag::Pcm => WAVE_FORMAT_PCM,
            FormatTag::IeeeFloat => WAVE_FORMAT_IEEE_FLOAT,
            FormatTag::ALaw => WAVE_FORMAT_ALAW,
            FormatTag::MuLaw => WAVE_FORMAT_MULAW,
            FormatTag::Extensible => WAVE_FORMAT_EXTENSIBLE,
            FormatTag::Other(tag) => tag,
        }
    }
}

/// Extra fields of a WAVE_FORMAT_EXTENSIBLE header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatExtension {
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: [u8; 16],
}

/// Contents of the `fmt ` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: FormatTag,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    /// Bytes per frame across all channels
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extension: Option<FormatExtension>,
}

impl WaveFormat {
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    fn parse(chunk: &[u8]) -> Result<Self> {
        if chunk.len() < FMT_BASE_LEN {
            return Err(WavError::malformed(format!(
                "fmt chunk is {} bytes, expected at least {}",
                chunk.len(),
                FMT_BASE_LEN
            )));
        }

        let format_tag = FormatTag::from_u16(read_u16(chunk, 0));
        let extension = if format_tag == FormatTag::Extensible {
            if chunk.len() < FMT_EXTENSIBLE_LEN {
                return Err(WavError::malformed(format!(
                    "extensible fmt chunk is {} bytes, expected {}",
                    chunk.len(),
                    FMT_EXTENSIBLE_LEN
                )));
            }
            let mut sub_format = [0u8; 16];
            sub_format.copy_from_slice(&chunk[24..40]);
            Some(FormatExtension {
                valid_bits_per_sample: read_u16(chunk, 18),
                channel_mask: read_u32(chunk, 20),
                sub_format,
            })
        } else {
            None
        };

        Ok(Self {
            format_tag,
            channels: read_u16(chunk, 2),
            sample_rate: read_u32(chunk, 4),
            avg_bytes_per_sec: read_u32(chunk, 8),
            block_align: read_u16(chunk, 12),
            bits_per_sample: read_u16(chunk, 14),
            extension,
        })
    }

    fn validate(&self) -> Result<()> {
        match (self.format_tag, self.extension) {
            (FormatTag::Pcm, _) => {}
            (FormatTag::Extensible, Some(ext)) => {
                let sub_type = u32::from_le_bytes([
                    ext.sub_format[0],
                    ext.sub_format[1],
                    ext.sub_format[2],
                    ext.sub_format[3],
                ]);
                if sub_type != WAVE_FORMAT_PCM as u32 {
                    return Err(WavError::unsupported(format!(
                        "extensible sub-format {:#010x} is not PCM",
                        sub_type
                    )));
                }
            }
            (tag, _) => {
                return Err(WavError::unsupported(format!(
                    "format tag {:#06x} ({:?}) is not PCM",
                    tag.as_u16(),
                    tag
                )));
            }
        }

        if !(1..=2).contains(&self.channels) {
            return Err(WavError::unsupported(format!(
                "{}-channel audio (only mono/stereo supported)",
                self.channels
            )));
        }
        if !matches!(self.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(WavError::unsupported(format!(
                "{} bits per sample (8, 16, 24 or 32 supported)",
                self.bits_per_sample
            )));
        }

        let expected = self.channels as usize * self.bytes_per_sample();
        if self.block_align as usize != expected {
            return Err(WavError::malformed(format!(
                "block align {} does not match {} channels x {} bits",
                self.block_align, self.channels, self.bits_per_sample
            )));
        }
        Ok(())
    }
}

/// A whole number of frames inside a [`WaveContainer`]'s buffer.
///
/// Blocks never own memory. They stay addressable after
/// [`WaveContainer::reset`] but belong to the previous cursor epoch; see
/// [`WaveContainer::is_current`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemBlock {
    offset: usize,
    len: usize,
    epoch: u64,
}

impl MemBlock {
    /// Byte offset from the start of the raw buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// A parsed PCM wave file with a block cursor over its data chunk.
#[derive(Debug)]
pub struct WaveContainer {
    raw: Vec<u8>,
    format: WaveFormat,
    data_offset: usize,
    data_size: usize,
    cursor: usize,
    last: Option<MemBlock>,
    epoch: u64,
}

impl WaveContainer {
    /// Parse and validate a complete RIFF/WAVE image, taking ownership of it.
    pub fn parse(raw: Vec<u8>) -> Result<Self> {
        if raw.len() < RIFF_HEADER_LEN {
            return Err(WavError::malformed(format!(
                "{} bytes is too short for a RIFF header",
                raw.len()
            )));
        }
        if &raw[0..4] != b"RIFF" {
            return Err(WavError::malformed("missing RIFF tag"));
        }
        if &raw[8..12] != b"WAVE" {
            return Err(WavError::malformed("missing WAVE tag"));
        }

        let riff_len = read_u32(&raw, 4) as usize;
        if riff_len + CHUNK_HEADER_LEN != raw.len() {
            log::warn!(
                "RIFF length {} disagrees with buffer of {} bytes",
                riff_len,
                raw.len()
            );
        }

        let mut format = None;
        let mut data = None;
        let mut offset = RIFF_HEADER_LEN;

        while offset < raw.len() {
            if offset + CHUNK_HEADER_LEN > raw.len() {
                return Err(WavError::malformed(format!(
                    "truncated chunk header at offset {}",
                    offset
                )));
            }
            let id = &raw[offset..offset + 4];
            let size = read_u32(&raw, offset + 4) as usize;
            let body = offset + CHUNK_HEADER_LEN;
            let available = raw.len() - body;

            match id {
                b"fmt " => {
                    if size > available {
                        return Err(WavError::malformed(format!(
                            "fmt chunk declares {} bytes, {} available",
                            size, available
                        )));
                    }
                    format = Some(WaveFormat::parse(&raw[body..body + size])?);
                }
                b"data" => {
                    if size > available {
                        return Err(WavError::TruncatedData {
                            declared: size,
                            available,
                        });
                    }
                    data = Some((body, size));
                }
                other => {
                    log::debug!(
                        "Skipping chunk {:?} ({} bytes)",
                        String::from_utf8_lossy(other),
                        size
                    );
                }
            }

            // Chunks are word aligned: odd sizes carry a pad byte.
            offset = body.saturating_add(size).saturating_add(size & 1);
            if format.is_some() && data.is_some() {
                break;
            }
        }

        let format = format.ok_or_else(|| WavError::malformed("missing fmt chunk"))?;
        let (data_offset, data_size) = data.ok_or_else(|| WavError::malformed("missing data chunk"))?;
        format.validate()?;

        if data_size % format.block_align as usize != 0 {
            return Err(WavError::malformed(format!(
                "data chunk of {} bytes is not a whole number of {}-byte frames",
                data_size, format.block_align
            )));
        }

        log::debug!(
            "Parsed WAV: {:?}, {} ch, {} Hz, {} bit, {} data bytes at offset {}",
            format.format_tag,
            format.channels,
            format.sample_rate,
            format.bits_per_sample,
            data_size,
            data_offset
        );

        Ok(Self {
            raw,
            format,
            data_offset,
            data_size,
            cursor: 0,
            last: None,
            epoch: 0,
        })
    }

    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn is_extended(&self) -> bool {
        self.format.format_tag == FormatTag::Extensible
    }

    /// Size of the data chunk in bytes.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn frame_count(&self) -> usize {
        self.data_size / self.format.block_align as usize
    }

    pub fn data_bytes(&self) -> &[u8] {
        &self.raw[self.data_offset..self.data_offset + self.data_size]
    }

    /// True iff `frames` more frames fit between the cursor and the end of data.
    ///
    /// A zero-frame pull never counts as available.
    pub fn has_next(&self, frames: usize) -> bool {
        if frames == 0 {
            return false;
        }
        frames
            .checked_mul(self.format.block_align as usize)
            .and_then(|len| self.cursor.checked_add(len))
            .is_some_and(|end| end <= self.data_size)
    }

    pub fn has_next_frame(&self) -> bool {
        self.has_next(1)
    }

    /// Advance by `frames` frames and return the block covering them.
    ///
    /// Returns `None` and leaves the cursor untouched when fewer frames remain.
    pub fn next(&mut self, frames: usize) -> Option<MemBlock> {
        if !self.has_next(frames) {
            return None;
        }
        let len = frames * self.format.block_align as usize;
        let block = MemBlock {
            offset: self.data_offset + self.cursor,
            len,
            epoch: self.epoch,
        };
        self.cursor += len;
        self.last = Some(block);
        Some(block)
    }

    pub fn next_frame(&mut self) -> Option<MemBlock> {
        self.next(1)
    }

    /// The block returned by the latest successful `next`.
    pub fn last(&self) -> Option<MemBlock> {
        self.last
    }

    /// Rewind to the start of the data chunk.
    ///
    /// Blocks handed out earlier still address the same bytes, but they
    /// belong to a finished iteration and should not be reused.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.last = None;
        self.epoch += 1;
    }

    /// Whether `block` was produced since the latest `reset`.
    pub fn is_current(&self, block: &MemBlock) -> bool {
        block.epoch == self.epoch
    }

    /// Frames consumed so far.
    pub fn position(&self) -> usize {
        self.cursor / self.format.block_align as usize
    }

    pub fn block_bytes(&self, block: &MemBlock) -> Result<&[u8]> {
        self.raw.get(block.range()).ok_or(WavError::BlockOutOfBounds {
            offset: block.offset,
            len: block.len,
        })
    }

    pub fn block_bytes_mut(&mut self, block: &MemBlock) -> Result<&mut [u8]> {
        self.raw.get_mut(block.range()).ok_or(WavError::BlockOutOfBounds {
            offset: block.offset,
            len: block.len,
        })
    }

    pub fn sample_view(&self, block: &MemBlock) -> Result<SampleView<&[u8]>> {
        let format = self.format;
        SampleView::new(
            self.block_bytes(block)?,
            format.channels,
            format.bytes_per_sample(),
            format.sample_rate,
        )
    }

    pub fn sample_view_mut(&mut self, block: &MemBlock) -> Result<SampleView<&mut [u8]>> {
        let format = self.format;
        SampleView::new(
            self.block_bytes_mut(block)?,
            format.channels,
            format.bytes_per_sample(),
            format.sample_rate,
        )
    }

    /// Window `block` in place; returns the same block for chaining.
    pub fn window(&mut self, block: &MemBlock, window: WindowType) -> Result<MemBlock> {
        let mut view = self.sample_view_mut(block)?;
        apply_window(&mut view, window);
        Ok(*block)
    }

    pub fn dft(&self, block: &MemBlock) -> Result<Dft<'_>> {
        Ok(Dft::new(self.sample_view(block)?))
    }

    pub fn fft(&self, block: &MemBlock) -> Result<Fft<'_>> {
        Fft::new(self.sample_view(block)?)
    }

    /// Give the raw buffer back.
    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal RIFF image: a PCM fmt chunk followed by `extra` chunks and data.
    pub(crate) fn pcm_wave(channels: u16, sample_rate: u32, bits: u16, data: &[u8]) -> Vec<u8> {
        build_wave(&fmt_chunk(WAVE_FORMAT_PCM, channels, sample_rate, bits), &[], data)
    }

    pub(crate) fn fmt_chunk(tag: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&tag.to_le_bytes());
        fmt.extend_from_slice(&channels.to_le_bytes());
        fmt.extend_from_slice(&sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&bits.to_le_bytes());
        fmt
    }

    pub(crate) fn extensible_fmt_chunk(channels: u16, sample_rate: u32, bits: u16, sub_format: [u8; 16]) -> Vec<u8> {
        let mut fmt = fmt_chunk(WAVE_FORMAT_EXTENSIBLE, channels, sample_rate, bits);
        fmt.extend_from_slice(&22u16.to_le_bytes());
        fmt.extend_from_slice(&bits.to_le_bytes());
        fmt.extend_from_slice(&0x3u32.to_le_bytes());
        fmt.extend_from_slice(&sub_format);
        fmt
    }

    pub(crate) fn build_wave(fmt: &[u8], extra: &[(&[u8; 4], &[u8])], data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        push_chunk(&mut body, b"fmt ", fmt);
        for (id, payload) in extra {
            push_chunk(&mut body, id, payload);
        }
        push_chunk(&mut body, b"data", data);

        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(body.len() as u32).to_le_bytes());
        wav.extend_from_slice(&body);
        wav
    }

    fn push_chunk(out: &mut Vec<u8>, id: &[u8; 4], payload: &[u8]) {
        out.extend_from_slice(id);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
    }

    fn i16_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn reads_declared_format_fields() {
        let wav = pcm_wave(2, 22050, 16, &i16_bytes(&[1, 2, 3, 4]));
        let wave = WaveContainer::parse(wav).unwrap();
        let format = wave.format();
        assert_eq!(format.format_tag, FormatTag::Pcm);
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_rate, 22050);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.block_align, 4);
        assert_eq!(format.avg_bytes_per_sec, 88200);
        assert!(!wave.is_extended());
        assert_eq!(wave.data_size(), 8);
        assert_eq!(wave.frame_count(), 2);
        assert_eq!(wave.data_bytes(), i16_bytes(&[1, 2, 3, 4]).as_slice());
    }

    #[test]
    fn rejects_missing_riff_tag() {
        let mut wav = pcm_wave(1, 8000, 16, &[0, 0]);
        wav[0..4].copy_from_slice(b"RIFX");
        let err = WaveContainer::parse(wav).unwrap_err();
        assert!(matches!(err, WavError::MalformedHeader { .. }));
    }

    #[test]
    fn rejects_short_and_untagged_buffers() {
        assert!(matches!(
            WaveContainer::parse(b"RIFF".to_vec()),
            Err(WavError::MalformedHeader { .. })
        ));

        let mut wav = pcm_wave(1, 8000, 16, &[0, 0]);
        wav[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn rejects_missing_chunks() {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        let err = WaveContainer::parse(wav).unwrap_err();
        assert!(err.to_string().contains("fmt"));

        let mut wav = pcm_wave(1, 8000, 16, &[]);
        let data_at = wav.len() - 8;
        wav.truncate(data_at);
        let err = WaveContainer::parse(wav).unwrap_err();
        assert!(matches!(err, WavError::MalformedHeader { .. }));
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn rejects_non_pcm_tags() {
        for tag in [WAVE_FORMAT_IEEE_FLOAT, WAVE_FORMAT_ALAW, WAVE_FORMAT_MULAW, 0x0055] {
            let wav = build_wave(&fmt_chunk(tag, 1, 8000, 16), &[], &[0, 0]);
            assert!(
                matches!(WaveContainer::parse(wav), Err(WavError::UnsupportedFormat { .. })),
                "tag {:#x} must be rejected",
                tag
            );
        }
    }

    #[test]
    fn rejects_unsupported_channel_counts_and_depths() {
        let wav = build_wave(&fmt_chunk(WAVE_FORMAT_PCM, 6, 48000, 16), &[], &[0; 12]);
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::UnsupportedFormat { .. })
        ));

        let wav = build_wave(&fmt_chunk(WAVE_FORMAT_PCM, 1, 48000, 12), &[], &[0; 4]);
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_block_align() {
        let mut fmt = fmt_chunk(WAVE_FORMAT_PCM, 2, 8000, 16);
        fmt[12..14].copy_from_slice(&3u16.to_le_bytes());
        let wav = build_wave(&fmt, &[], &[0; 12]);
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::MalformedHeader { .. })
        ));

        let wav = pcm_wave(2, 8000, 16, &[0; 6]);
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn rejects_data_beyond_buffer() {
        let mut wav = pcm_wave(1, 8000, 16, &[0; 8]);
        let size_at = wav.len() - 8 - 4;
        wav[size_at..size_at + 4].copy_from_slice(&64u32.to_le_bytes());
        match WaveContainer::parse(wav) {
            Err(WavError::TruncatedData { declared, available }) => {
                assert_eq!(declared, 64);
                assert_eq!(available, 8);
            }
            other => panic!("expected TruncatedData, got {:?}", other),
        }
    }

    #[test]
    fn skips_unknown_chunks_with_padding() {
        let fmt = fmt_chunk(WAVE_FORMAT_PCM, 1, 8000, 16);
        let extra: [(&[u8; 4], &[u8]); 2] = [(b"LIST", &b"INFOabc"[..]), (b"fact", &[1, 0, 0, 0][..])];
        let wav = build_wave(&fmt, &extra, &i16_bytes(&[7, -7]));
        let mut wave = WaveContainer::parse(wav).unwrap();
        assert_eq!(wave.frame_count(), 2);
        let block = wave.next(2).unwrap();
        let mut view = wave.sample_view(&block).unwrap();
        assert_eq!(view.left(), 7);
        assert!(view.next());
        assert_eq!(view.left(), -7);
    }

    #[test]
    fn parses_extensible_pcm() {
        let fmt = extensible_fmt_chunk(2, 96000, 24, KSDATAFORMAT_SUBTYPE_PCM);
        let wav = build_wave(&fmt, &[], &[0; 12]);
        let wave = WaveContainer::parse(wav).unwrap();
        assert!(wave.is_extended());
        let ext = wave.format().extension.unwrap();
        assert_eq!(ext.valid_bits_per_sample, 24);
        assert_eq!(ext.channel_mask, 0x3);
        assert_eq!(ext.sub_format, KSDATAFORMAT_SUBTYPE_PCM);
        assert_eq!(wave.frame_count(), 2);
    }

    #[test]
    fn rejects_extensible_float() {
        let mut float_guid = KSDATAFORMAT_SUBTYPE_PCM;
        float_guid[0] = 0x03;
        let wav = build_wave(&extensible_fmt_chunk(2, 48000, 32, float_guid), &[], &[0; 8]);
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::UnsupportedFormat { .. })
        ));

        let short = fmt_chunk(WAVE_FORMAT_EXTENSIBLE, 2, 48000, 16);
        let wav = build_wave(&short, &[], &[0; 8]);
        assert!(matches!(
            WaveContainer::parse(wav),
            Err(WavError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn cursor_hands_out_whole_frames() {
        let wav = pcm_wave(2, 8000, 16, &i16_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]));
        let mut wave = WaveContainer::parse(wav).unwrap();
        assert!(wave.last().is_none());
        assert!(wave.has_next(4));
        assert!(!wave.has_next(5));

        let first = wave.next(3).unwrap();
        assert_eq!(first.len(), 12);
        assert_eq!(wave.last(), Some(first));
        assert_eq!(wave.position(), 3);
        assert!(wave.has_next_frame());
        assert!(wave.next(2).is_none());
        assert_eq!(wave.last(), Some(first));

        let second = wave.next_frame().unwrap();
        assert_eq!(wave.block_bytes(&second).unwrap(), i16_bytes(&[7, 8]).as_slice());
        assert!(!wave.has_next_frame());
        assert!(wave.next_frame().is_none());
    }

    #[test]
    fn zero_frame_pulls_are_refused() {
        let wav = pcm_wave(1, 8000, 16, &i16_bytes(&[1, 2, 3]));
        let mut wave = WaveContainer::parse(wav).unwrap();
        assert!(!wave.has_next(0));
        assert!(wave.next(0).is_none());
        assert_eq!(wave.position(), 0);
        assert!(wave.last().is_none());

        wave.next(3).unwrap();
        assert!(!wave.has_next(0));
        assert!(wave.next(0).is_none());
    }

    #[test]
    fn reset_starts_a_new_epoch() {
        let wav = pcm_wave(1, 8000, 16, &i16_bytes(&[10, 20, 30]));
        let mut wave = WaveContainer::parse(wav).unwrap();
        let stale = wave.next(2).unwrap();
        assert!(wave.is_current(&stale));

        wave.reset();
        assert!(!wave.is_current(&stale));
        assert!(wave.last().is_none());
        assert_eq!(wave.position(), 0);

        let fresh = wave.next(2).unwrap();
        assert!(wave.is_current(&fresh));
        assert_eq!(fresh.offset(), stale.offset());
    }

    #[test]
    fn foreign_blocks_are_rejected() {
        let mut big = WaveContainer::parse(pcm_wave(1, 8000, 16, &[0; 64])).unwrap();
        let block = big.next(32).unwrap();

        let small = WaveContainer::parse(pcm_wave(1, 8000, 16, &[0; 2])).unwrap();
        assert!(matches!(
            small.sample_view(&block),
            Err(WavError::BlockOutOfBounds { .. })
        ));
    }

    #[test]
    fn into_bytes_returns_the_image() {
        let wav = pcm_wave(1, 8000, 8, &[1, 2, 3]);
        let copy = wav.clone();
        let wave = WaveContainer::parse(wav).unwrap();
        assert_eq!(wave.into_bytes(), copy);
    }
}
