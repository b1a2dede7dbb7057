use std::collections::VecDeque;
use std::ops::Range;
use std::time::Duration;

use super::features::BeatStep;
use super::stereo::SampleView;
use super::wave::{MemBlock, WaveContainer};
use crate::config::{BeatConfig, TempoConfig};
use crate::error::{Result, WavError};

/// Patin's variance coefficient for the sensitivity curve.
pub const PATIN_VARIANCE_COEFFICIENT: f64 = -0.0025714;
/// Patin's sensitivity at zero variance.
pub const PATIN_SENSITIVITY_OFFSET: f64 = 1.5142857;

pub const DEFAULT_PRECISION: Duration = Duration::from_millis(75);
pub const DEFAULT_BUFFER: Duration = Duration::from_secs(1);

/// Statistical beat detector (Frédéric Patin's energy method).
///
/// Every step consumes `precision()` frames from the wave, pushes the block
/// energy into a fixed-size history and flags a beat when the energy rises
/// above `(a * variance + b) * average` of that history.
pub struct BeatDetector<'a> {
    wave: &'a mut WaveContainer,
    history: VecDeque<f64>,
    capacity: usize,
    precision: usize,
    variance_coefficient: f64,
    sensitivity_offset: f64,
    last: Option<BeatStep>,
}

impl<'a> BeatDetector<'a> {
    /// `precision` is the duration analyzed per step, `buffer` the duration
    /// of history the threshold is computed over.
    pub fn new(wave: &'a mut WaveContainer, precision: Duration, buffer: Duration) -> Result<Self> {
        Self::with_coefficients(
            wave,
            precision,
            buffer,
            PATIN_VARIANCE_COEFFICIENT,
            PATIN_SENSITIVITY_OFFSET,
        )
    }

    pub fn from_config(wave: &'a mut WaveContainer, config: &BeatConfig) -> Result<Self> {
        Self::with_coefficients(
            wave,
            Duration::from_millis(config.precision_ms),
            Duration::from_millis(config.buffer_ms),
            config.variance_coefficient,
            config.sensitivity_offset,
        )
    }

    fn with_coefficients(
        wave: &'a mut WaveContainer,
        precision: Duration,
        buffer: Duration,
        variance_coefficient: f64,
        sensitivity_offset: f64,
    ) -> Result<Self> {
        let sample_rate = wave.sample_rate() as f64;
        let precision_samples = precision.as_secs_f64() * sample_rate;
        let buffer_samples = buffer.as_secs_f64() * sample_rate;

        if precision_samples < 1.0 {
            return Err(WavError::invalid_parameter(format!(
                "precision of {:?} is less than one sample at {} Hz",
                precision, sample_rate
            )));
        }
        let capacity = (buffer_samples / precision_samples) as usize;
        if capacity == 0 {
            return Err(WavError::invalid_parameter(format!(
                "buffer of {:?} holds no {:?} block",
                buffer, precision
            )));
        }

        log::debug!(
            "Beat detector: {} samples per step, {} steps of history",
            precision_samples as usize,
            capacity
        );

        Ok(Self {
            wave,
            history: VecDeque::from(vec![1.0; capacity]),
            capacity,
            precision: precision_samples as usize,
            variance_coefficient,
            sensitivity_offset,
            last: None,
        })
    }

    /// Frames consumed per step.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Number of energies kept for the threshold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Energies in the window, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &f64> + '_ {
        self.history.iter()
    }

    pub fn last_step(&self) -> Option<BeatStep> {
        self.last
    }

    pub fn has_next(&self) -> bool {
        self.wave.has_next(self.precision)
    }

    /// Total steps the data chunk holds, independent of the cursor.
    pub fn len(&self) -> usize {
        self.wave.frame_count() / self.precision
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Analyze the next block; `Ok(None)` once the wave has no full block left.
    pub fn step(&mut self) -> Result<Option<BeatStep>> {
        let Some(block) = self.wave.next(self.precision) else {
            return Ok(None);
        };
        let energy = block_energy(self.wave.sample_view(&block)?);

        self.history.pop_front();
        self.history.push_back(energy);

        let count = self.history.len() as f64;
        let average = self.history.iter().sum::<f64>() / count;
        let variance = self
            .history
            .iter()
            .map(|e| (e - average) * (e - average))
            .sum::<f64>()
            / count;
        let sensitivity = self.variance_coefficient * variance + self.sensitivity_offset;
        let threshold = sensitivity * average;

        let step = BeatStep {
            energy,
            average,
            variance,
            threshold,
            is_beat: energy > threshold,
        };
        log::debug!(
            "energy={:.6} avg={:.6} var={:.6} threshold={:.6} beat={}",
            energy,
            average,
            variance,
            threshold,
            step.is_beat
        );
        self.last = Some(step);
        Ok(Some(step))
    }
}

impl Iterator for BeatDetector<'_> {
    type Item = Result<bool>;

    fn next(&mut self) -> Option<Result<bool>> {
        self.step().transpose().map(|step| step.map(|s| s.is_beat))
    }
}

/// Mean of `left² + right²` in full-scale units.
fn block_energy(mut view: SampleView<&[u8]>) -> f64 {
    if view.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    loop {
        let left = view.scale(view.left());
        let right = view.scale(view.right());
        sum += left * left + right * right;
        if !view.next() {
            break;
        }
    }
    sum / view.len() as f64
}

/// Sum of pairwise products of the downmixed samples over the shorter view.
pub fn correlation<A, B>(a: &mut SampleView<A>, b: &mut SampleView<B>) -> f64
where
    A: AsRef<[u8]>,
    B: AsRef<[u8]>,
{
    let length = a.len().min(b.len());
    a.reset();
    b.reset();
    let mut result = 0.0;
    for _ in 0..length {
        result += a.avg() as f64 * b.avg() as f64;
        a.next();
        b.next();
    }
    result
}

/// Search `bpms` (end exclusive) in steps of `step` for the tempo whose beat
/// period best correlates `block` with itself.
///
/// Brute force: O(candidates × block length). Returns `None` when no
/// candidate's period fits inside the block.
pub fn find_bpm(wave: &WaveContainer, block: &MemBlock, bpms: Range<u32>, step: u32) -> Result<Option<u32>> {
    if step == 0 {
        return Err(WavError::invalid_parameter("BPM step must be positive"));
    }
    if bpms.start == 0 {
        return Err(WavError::invalid_parameter("BPM range must not include 0"));
    }

    let format = *wave.format();
    let bytes = wave.block_bytes(block)?;
    let align = format.block_align as usize;
    let frames = bytes.len() / align;

    let mut best: Option<(u32, f64)> = None;
    for bpm in bpms.step_by(step as usize) {
        let offset = (60.0 / bpm as f64 * format.sample_rate as f64) as usize;
        if offset == 0 || offset >= frames {
            continue;
        }

        let shift = offset * align;
        let mut early = SampleView::new(
            &bytes[..bytes.len() - shift],
            format.channels,
            format.bytes_per_sample(),
            format.sample_rate,
        )?;
        let mut late = SampleView::new(
            &bytes[shift..],
            format.channels,
            format.bytes_per_sample(),
            format.sample_rate,
        )?;
        let score = correlation(&mut early, &mut late);
        log::trace!("bpm {} (offset {} frames): {:.3}", bpm, offset, score);

        if best.map_or(true, |(_, top)| score > top) {
            best = Some((bpm, score));
        }
    }

    if let Some((bpm, score)) = best {
        log::debug!("Best tempo {} BPM (score {:.3})", bpm, score);
    }
    Ok(best.map(|(bpm, _)| bpm))
}

/// [`find_bpm`] over the configured range.
pub fn find_bpm_with(wave: &WaveContainer, block: &MemBlock, config: &TempoConfig) -> Result<Option<u32>> {
    find_bpm(wave, block, config.range(), config.step)
}
