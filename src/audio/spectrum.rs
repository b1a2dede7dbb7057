use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};
use serde::Deserialize;

use super::features::{ChannelResult, ChannelSelect, SpectrumBin};
use super::stereo::SampleView;
use super::wave::{MemBlock, WaveContainer};
use crate::config::SpectrumConfig;
use crate::error::{Result, WavError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Naive O(N²) transform, any block length
    Dft,
    /// Radix-2 transform, power-of-two block lengths only
    #[default]
    Fft,
}

/// Naive discrete Fourier transform with a per-bin cursor.
///
/// Every bin walks the whole block, so a full pass costs O(N²).
pub struct Dft<'a> {
    view: SampleView<&'a [u8]>,
    k: usize,
}

impl<'a> Dft<'a> {
    pub fn new(view: SampleView<&'a [u8]>) -> Self {
        Self { view, k: 0 }
    }

    /// Number of bins, equal to the block's sample count.
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.k < self.view.len()
    }

    /// Compute the next bin for `select`; `All` fills left, right and stereo.
    pub fn next_bin(&mut self, select: ChannelSelect) -> Option<SpectrumBin> {
        if !self.has_next() {
            return None;
        }

        let k = self.k;
        let mut bin = SpectrumBin {
            k,
            ..Default::default()
        };
        match select {
            ChannelSelect::All => {
                for channel in [ChannelSelect::Left, ChannelSelect::Right, ChannelSelect::Stereo] {
                    let result = self.channel_bin(k, channel);
                    bin.set(channel, result);
                }
            }
            channel => {
                let result = self.channel_bin(k, channel);
                bin.set(channel, result);
            }
        }

        self.k += 1;
        Some(bin)
    }

    fn channel_bin(&mut self, k: usize, channel: ChannelSelect) -> ChannelResult {
        let n = self.view.len();
        let mut real = 0.0;
        let mut imag = 0.0;

        self.view.reset();
        let mut i = 0;
        loop {
            let x = fetch(&self.view, channel) as f64;
            // Reduce k*i modulo N first to keep the angle small.
            let theta = 2.0 * PI * ((k * i) % n) as f64 / n as f64;
            real += x * theta.cos();
            imag -= x * theta.sin();
            i += 1;
            if !self.view.next() {
                break;
            }
        }

        ChannelResult::new(k, real, imag, self.view.sample_rate(), n)
    }
}

/// Radix-2 FFT over one channel selection.
///
/// The selection is fixed by the first [`next_bin`](Self::next_bin) call (or
/// by [`with_channel`](Self::with_channel)); the whole block is transformed
/// at that point and later calls only walk the result.
pub struct Fft<'a> {
    view: SampleView<&'a [u8]>,
    selected: Option<ChannelSelect>,
    output: Vec<Complex<f64>>,
    k: usize,
}

impl<'a> Fft<'a> {
    /// Fails unless the block holds a power-of-two number of samples.
    pub fn new(view: SampleView<&'a [u8]>) -> Result<Self> {
        let n = view.len();
        if !n.is_power_of_two() {
            return Err(WavError::invalid_input(format!(
                "FFT needs a power-of-two sample count, got {}",
                n
            )));
        }
        Ok(Self {
            view,
            selected: None,
            output: Vec::new(),
            k: 0,
        })
    }

    pub fn with_channel(view: SampleView<&'a [u8]>, select: ChannelSelect) -> Result<Self> {
        let mut fft = Self::new(view)?;
        fft.select(select)?;
        Ok(fft)
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn selected(&self) -> Option<ChannelSelect> {
        self.selected
    }

    pub fn has_next(&self) -> bool {
        match self.selected {
            None => !self.view.is_empty(),
            Some(_) => self.k < self.output.len(),
        }
    }

    /// Next bin of the transformed channel.
    ///
    /// Fails for `All` and for a selection other than the first one.
    pub fn next_bin(&mut self, select: ChannelSelect) -> Result<Option<SpectrumBin>> {
        self.select(select)?;
        Ok(self.emit())
    }

    fn select(&mut self, select: ChannelSelect) -> Result<()> {
        match self.selected {
            Some(current) if current == select => Ok(()),
            Some(current) => Err(WavError::invalid_input(format!(
                "FFT channel selection is fixed to {:?}, got {:?}",
                current, select
            ))),
            None if select == ChannelSelect::All => Err(WavError::invalid_input(
                "FFT analyzes one channel at a time, not All",
            )),
            None => {
                let mut buffer = Vec::with_capacity(self.view.len());
                self.view.reset();
                loop {
                    buffer.push(Complex::new(fetch(&self.view, select) as f64, 0.0));
                    if !self.view.next() {
                        break;
                    }
                }
                complex_fft(&mut buffer)?;
                self.output = buffer;
                self.selected = Some(select);
                Ok(())
            }
        }
    }

    fn emit(&mut self) -> Option<SpectrumBin> {
        let select = self.selected?;
        let value = *self.output.get(self.k)?;
        let mut bin = SpectrumBin {
            k: self.k,
            ..Default::default()
        };
        bin.set(
            select,
            ChannelResult::new(self.k, value.re, value.im, self.view.sample_rate(), self.output.len()),
        );
        self.k += 1;
        Some(bin)
    }
}

/// In-place forward FFT, `X(k) = Σ x(n)·e^(-2πikn/N)`.
pub fn complex_fft(buffer: &mut [Complex<f64>]) -> Result<()> {
    if !buffer.len().is_power_of_two() {
        return Err(WavError::invalid_input(format!(
            "FFT needs a power-of-two length, got {}",
            buffer.len()
        )));
    }
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(buffer);
    Ok(())
}

/// A transform engine, chosen once at construction.
pub enum Transform<'a> {
    Dft(Dft<'a>),
    Fft(Fft<'a>),
}

impl Transform<'_> {
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Dft(_) => TransformKind::Dft,
            Transform::Fft(_) => TransformKind::Fft,
        }
    }

    pub fn has_next(&self) -> bool {
        match self {
            Transform::Dft(dft) => dft.has_next(),
            Transform::Fft(fft) => fft.has_next(),
        }
    }

    pub fn next_bin(&mut self, select: ChannelSelect) -> Result<Option<SpectrumBin>> {
        match self {
            Transform::Dft(dft) => Ok(dft.next_bin(select)),
            Transform::Fft(fft) => fft.next_bin(select),
        }
    }
}

/// Bins of one block for a fixed channel selection.
pub struct Spectrum<'a> {
    transform: Transform<'a>,
    select: ChannelSelect,
}

impl Spectrum<'_> {
    pub fn kind(&self) -> TransformKind {
        self.transform.kind()
    }

    pub fn select(&self) -> ChannelSelect {
        self.select
    }
}

impl Iterator for Spectrum<'_> {
    type Item = SpectrumBin;

    fn next(&mut self) -> Option<SpectrumBin> {
        match &mut self.transform {
            Transform::Dft(dft) => dft.next_bin(self.select),
            Transform::Fft(fft) => fft.emit(),
        }
    }
}

/// Transform the block under `view` with the chosen engine.
///
/// The FFT variant is computed eagerly, so invalid input (non power-of-two
/// length, `All` selection) fails here rather than during iteration.
pub fn transform(view: SampleView<&[u8]>, kind: TransformKind, select: ChannelSelect) -> Result<Spectrum<'_>> {
    let transform = match kind {
        TransformKind::Dft => Transform::Dft(Dft::new(view)),
        TransformKind::Fft => Transform::Fft(Fft::with_channel(view, select)?),
    };
    Ok(Spectrum { transform, select })
}

/// Window `block` in place, then transform its stereo downmix.
pub fn analyze_block(
    wave: &mut WaveContainer,
    block: &MemBlock,
    config: &SpectrumConfig,
) -> Result<Vec<SpectrumBin>> {
    wave.window(block, config.window)?;
    let view = wave.sample_view(block)?;
    let bins: Vec<SpectrumBin> = transform(view, config.transform, ChannelSelect::Stereo)?.collect();
    log::debug!(
        "{:?} over {} samples ({:?} window) -> {} bins",
        config.transform,
        block.len() / wave.format().block_align as usize,
        config.window,
        bins.len()
    );
    Ok(bins)
}

/// Pull the next `block_frames` frames from `wave` and analyze them.
pub fn analyze_next(wave: &mut WaveContainer, config: &SpectrumConfig) -> Result<Option<Vec<SpectrumBin>>> {
    if config.block_frames == 0 {
        return Err(WavError::invalid_parameter("block_frames must be positive"));
    }
    match wave.next(config.block_frames) {
        Some(block) => analyze_block(wave, &block, config).map(Some),
        None => Ok(None),
    }
}

fn fetch<B: AsRef<[u8]>>(view: &SampleView<B>, channel: ChannelSelect) -> i32 {
    match channel {
        ChannelSelect::Left => view.left(),
        ChannelSelect::Right => view.right(),
        ChannelSelect::Stereo | ChannelSelect::All => view.avg(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::bin_frequency;
    use crate::audio::wave::tests::pcm_wave;
    use crate::audio::window::WindowType;
    use approx::assert_relative_eq;

    fn stereo_block(frames: usize) -> Vec<u8> {
        (0..frames)
            .flat_map(|i| {
                let t = i as f64;
                let l = (8000.0 * (0.37 * t).sin() + 3000.0 * (1.91 * t).cos()) as i16;
                let r = (12000.0 * (0.05 * t).sin() - 500.0) as i16;
                l.to_le_bytes().into_iter().chain(r.to_le_bytes())
            })
            .collect()
    }

    #[test]
    fn impulse_has_a_flat_spectrum() {
        let mut bytes = vec![0u8; 10];
        bytes[0..2].copy_from_slice(&1000i16.to_le_bytes());
        let view = SampleView::new(bytes.as_slice(), 1, 2, 8000).unwrap();
        let mut dft = Dft::new(view);
        assert_eq!(dft.len(), 5);

        let mut count = 0;
        while dft.has_next() {
            let bin = dft.next_bin(ChannelSelect::Left).unwrap();
            let left = bin.left.unwrap();
            assert_relative_eq!(left.mag, 1000.0, epsilon = 1e-9);
            assert!(bin.right.is_none());
            count += 1;
        }
        assert_eq!(count, 5);
        assert!(dft.next_bin(ChannelSelect::Left).is_none());
    }

    #[test]
    fn bin_frequencies_are_exact() {
        let bytes = stereo_block(12);
        let view = SampleView::new(bytes.as_slice(), 2, 2, 44100).unwrap();
        for bin in transform(view, TransformKind::Dft, ChannelSelect::Right).unwrap() {
            let right = bin.right.unwrap();
            assert_eq!(right.freq, bin.k as f64 * 44100.0 / 12.0);
            assert_eq!(right.freq, bin_frequency(bin.k, 44100, 12));
        }
    }

    #[test]
    fn dft_all_fills_every_channel() {
        let bytes = stereo_block(6);
        let view = SampleView::new(bytes.as_slice(), 2, 2, 8000).unwrap();
        let mut dft = Dft::new(view);
        let bin = dft.next_bin(ChannelSelect::All).unwrap();
        assert!(bin.left.is_some() && bin.right.is_some() && bin.stereo.is_some());
        assert_eq!(bin.k, 0);
    }

    #[test]
    fn fft_matches_dft() {
        let bytes = stereo_block(64);
        for select in [ChannelSelect::Left, ChannelSelect::Right, ChannelSelect::Stereo] {
            let view = SampleView::new(bytes.as_slice(), 2, 2, 44100).unwrap();
            let slow: Vec<SpectrumBin> = transform(view, TransformKind::Dft, select).unwrap().collect();
            let view = SampleView::new(bytes.as_slice(), 2, 2, 44100).unwrap();
            let fast: Vec<SpectrumBin> = transform(view, TransformKind::Fft, select).unwrap().collect();

            assert_eq!(slow.len(), 64);
            assert_eq!(fast.len(), 64);
            for (a, b) in slow.iter().zip(&fast) {
                let a = a.channel(select).unwrap();
                let b = b.channel(select).unwrap();
                assert_eq!(a.k, b.k);
                assert_eq!(a.freq, b.freq);
                assert_relative_eq!(a.mag, b.mag, epsilon = 1e-6, max_relative = 1e-9);
                assert_relative_eq!(a.real, b.real, epsilon = 1e-6, max_relative = 1e-9);
                assert_relative_eq!(a.imag, b.imag, epsilon = 1e-6, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn fft_rejects_non_power_of_two() {
        let bytes = stereo_block(100);
        let view = SampleView::new(bytes.as_slice(), 2, 2, 8000).unwrap();
        assert!(matches!(Fft::new(view), Err(WavError::InvalidTransformInput { .. })));

        let view = SampleView::new(&bytes[..0], 2, 2, 8000).unwrap();
        assert!(matches!(
            transform(view, TransformKind::Fft, ChannelSelect::Left),
            Err(WavError::InvalidTransformInput { .. })
        ));

        let mut odd = vec![Complex::new(1.0, 0.0); 3];
        assert!(complex_fft(&mut odd).is_err());
    }

    #[test]
    fn fft_selection_is_fixed_after_first_bin() {
        let bytes = stereo_block(8);
        let view = SampleView::new(bytes.as_slice(), 2, 2, 8000).unwrap();
        let mut fft = Fft::new(view).unwrap();
        assert!(fft.has_next());
        assert!(fft.selected().is_none());

        assert!(matches!(
            fft.next_bin(ChannelSelect::All),
            Err(WavError::InvalidTransformInput { .. })
        ));

        let first = fft.next_bin(ChannelSelect::Left).unwrap().unwrap();
        assert!(first.left.is_some());
        assert!(matches!(
            fft.next_bin(ChannelSelect::Right),
            Err(WavError::InvalidTransformInput { .. })
        ));

        let mut seen = 1;
        while fft.has_next() {
            fft.next_bin(ChannelSelect::Left).unwrap().unwrap();
            seen += 1;
        }
        assert_eq!(seen, 8);
        assert!(fft.next_bin(ChannelSelect::Left).unwrap().is_none());
    }

    #[test]
    fn transform_enum_reports_its_engine() {
        let bytes = stereo_block(4);
        let view = SampleView::new(bytes.as_slice(), 2, 2, 8000).unwrap();
        let spectrum = transform(view, TransformKind::Fft, ChannelSelect::Stereo).unwrap();
        assert_eq!(spectrum.kind(), TransformKind::Fft);
        assert_eq!(spectrum.select(), ChannelSelect::Stereo);

        let view = SampleView::new(bytes.as_slice(), 2, 2, 8000).unwrap();
        let mut engine = Transform::Dft(Dft::new(view));
        assert_eq!(engine.kind(), TransformKind::Dft);
        assert!(engine.has_next());
        assert!(engine.next_bin(ChannelSelect::All).unwrap().is_some());
    }

    #[test]
    fn analyze_next_walks_the_wave() {
        let bytes = stereo_block(40);
        let mut wave = WaveContainer::parse(pcm_wave(2, 8000, 16, &bytes)).unwrap();
        let config = SpectrumConfig {
            window: WindowType::Hanning,
            transform: TransformKind::Fft,
            block_frames: 16,
        };

        let first = analyze_next(&mut wave, &config).unwrap().unwrap();
        assert_eq!(first.len(), 16);
        assert!(first.iter().all(|bin| bin.stereo.is_some()));
        assert!(analyze_next(&mut wave, &config).unwrap().is_some());
        assert!(analyze_next(&mut wave, &config).unwrap().is_none());
    }

    #[test]
    fn analyze_next_rejects_empty_blocks() {
        let bytes = stereo_block(8);
        let mut wave = WaveContainer::parse(pcm_wave(2, 8000, 16, &bytes)).unwrap();
        let config = SpectrumConfig {
            window: WindowType::Rectangular,
            transform: TransformKind::Dft,
            block_frames: 0,
        };
        assert!(matches!(
            analyze_next(&mut wave, &config),
            Err(WavError::InvalidParameter { .. })
        ));
        assert_eq!(wave.position(), 0);
    }
}
