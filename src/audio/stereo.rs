use crate::error::{Result, WavError};

/// Cursor over the interleaved PCM frames of a memory block.
///
/// Samples of any width (1 to 4 bytes) are exposed as `i32`. Mono blocks
/// alias the left and right accessors to the same bytes, stereo blocks read
/// the right sample `bytes_per_sample` bytes after the left one.
///
/// The view is generic over its storage: `SampleView<&[u8]>` reads,
/// `SampleView<&mut [u8]>` (or any `AsMut<[u8]>`) also writes.
///
/// # Cursor contract
///
/// The cursor starts at index 0. [`next`](Self::next) and
/// [`prev`](Self::prev) always move it and return whether it is still inside
/// `[0, len())`. Getters and setters must only be called while the cursor is
/// valid: calling them after a failed move is a caller error and panics or
/// yields unspecified values. Iterate do-while style:
///
/// ```ignore
/// loop {
///     let s = view.avg();
///     // ...
///     if !view.next() {
///         break;
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SampleView<B> {
    bytes: B,
    channels: u16,
    bytes_per_sample: usize,
    sample_rate: u32,
    samples: usize,
    index: isize,
}

impl<B: AsRef<[u8]>> SampleView<B> {
    pub fn new(bytes: B, channels: u16, bytes_per_sample: usize, sample_rate: u32) -> Result<Self> {
        if !(1..=2).contains(&channels) {
            return Err(WavError::unsupported(format!(
                "{} channels (only mono and stereo are supported)",
                channels
            )));
        }
        if !(1..=4).contains(&bytes_per_sample) {
            return Err(WavError::unsupported(format!(
                "{} bytes per sample (1 to 4 supported)",
                bytes_per_sample
            )));
        }

        let samples = bytes.as_ref().len() / (bytes_per_sample * channels as usize);
        Ok(Self {
            bytes,
            channels,
            bytes_per_sample,
            sample_rate,
            samples,
            index: 0,
        })
    }

    /// Move forward one sample; `false` once the cursor leaves the block.
    pub fn next(&mut self) -> bool {
        self.index += 1;
        self.is_valid()
    }

    /// Move back one sample; `false` once the cursor leaves the block.
    pub fn prev(&mut self) -> bool {
        self.index -= 1;
        self.is_valid()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Current cursor position. Negative after `prev()` from the first sample.
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn is_valid(&self) -> bool {
        self.index >= 0 && (self.index as usize) < self.samples
    }

    /// Number of samples per channel in the block.
    pub fn len(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn left(&self) -> i32 {
        self.read(self.left_offset())
    }

    pub fn right(&self) -> i32 {
        self.read(self.right_offset())
    }

    /// Stereo-as-mono downmix, rounded toward zero.
    pub fn avg(&self) -> i32 {
        ((self.left() as i64 + self.right() as i64) / 2) as i32
    }

    /// Largest positive value the configured width can hold.
    pub fn max_amp(&self) -> i32 {
        ((1i64 << (8 * self.bytes_per_sample - 1)) - 1) as i32
    }

    /// Fraction of full scale.
    pub fn scale(&self, value: i32) -> f64 {
        value as f64 / self.max_amp() as f64
    }

    fn frame_offset(&self) -> usize {
        // Negative cursors wrap to an out-of-range offset and panic on access.
        self.index as usize * self.bytes_per_sample * self.channels as usize
    }

    fn left_offset(&self) -> usize {
        self.frame_offset()
    }

    fn right_offset(&self) -> usize {
        if self.channels == 2 {
            self.frame_offset() + self.bytes_per_sample
        } else {
            self.frame_offset()
        }
    }

    fn read(&self, at: usize) -> i32 {
        let width = self.bytes_per_sample;
        let mut raw = [0u8; 4];
        raw[..width].copy_from_slice(&self.bytes.as_ref()[at..at + width]);
        sign_extend(i32::from_le_bytes(raw), width)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SampleView<B> {
    /// Store `value` truncated to the sample width; returns what was stored.
    pub fn set_left(&mut self, value: i32) -> i32 {
        let at = self.left_offset();
        self.write(at, value)
    }

    pub fn set_right(&mut self, value: i32) -> i32 {
        let at = self.right_offset();
        self.write(at, value)
    }

    /// Writes both channels; returns the average of the stored values.
    pub fn set_avg(&mut self, value: i32) -> i32 {
        let left = self.set_left(value) as i64;
        let right = self.set_right(value) as i64;
        ((left + right) / 2) as i32
    }

    fn write(&mut self, at: usize, value: i32) -> i32 {
        let width = self.bytes_per_sample;
        let raw = value.to_le_bytes();
        self.bytes.as_mut()[at..at + width].copy_from_slice(&raw[..width]);
        sign_extend(value, width)
    }
}

fn sign_extend(value: i32, width: usize) -> i32 {
    let shift = 32 - 8 * width as u32;
    (value << shift) >> shift
}
