use serde::Serialize;

/// Floor applied before taking the logarithm of a magnitude.
pub const MIN_MAGNITUDE: f64 = 1e-10;

/// Which channel(s) a spectral transform analyzes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelSelect {
    Left,
    Right,
    /// Integer downmix of left and right
    Stereo,
    /// Left, right and stereo in one step (DFT only)
    All,
}

/// One frequency bin of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelResult {
    /// Bin index
    pub k: usize,
    /// Real part of X(k)
    pub real: f64,
    /// Imaginary part of X(k), sign already applied
    pub imag: f64,
    /// Bin frequency in Hz (k * sample_rate / N)
    pub freq: f64,
    /// sqrt(real² + imag²)
    pub mag: f64,
    /// Phase in radians
    pub angle: f64,
    /// 20 * log10(mag), floored at MIN_MAGNITUDE
    pub db_mag: f64,
}

impl ChannelResult {
    pub fn new(k: usize, real: f64, imag: f64, sample_rate: u32, n: usize) -> Self {
        let mag = (real * real + imag * imag).sqrt();
        Self {
            k,
            real,
            imag,
            freq: bin_frequency(k, sample_rate, n),
            mag,
            angle: imag.atan2(real),
            db_mag: 20.0 * mag.max(MIN_MAGNITUDE).log10(),
        }
    }
}

/// Results of a single bin for the channels that were requested.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpectrumBin {
    pub k: usize,
    pub left: Option<ChannelResult>,
    pub right: Option<ChannelResult>,
    pub stereo: Option<ChannelResult>,
}

impl SpectrumBin {
    /// The result for `select`; `All` falls back to the stereo result.
    pub fn channel(&self, select: ChannelSelect) -> Option<&ChannelResult> {
        match select {
            ChannelSelect::Left => self.left.as_ref(),
            ChannelSelect::Right => self.right.as_ref(),
            ChannelSelect::Stereo | ChannelSelect::All => self.stereo.as_ref(),
        }
    }

    pub(crate) fn set(&mut self, select: ChannelSelect, result: ChannelResult) {
        match select {
            ChannelSelect::Left => self.left = Some(result),
            ChannelSelect::Right => self.right = Some(result),
            ChannelSelect::Stereo | ChannelSelect::All => self.stereo = Some(result),
        }
    }
}

/// Statistics of one beat detection step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BeatStep {
    /// Energy of the block just analyzed
    pub energy: f64,
    /// Mean energy over the history window (new block included)
    pub average: f64,
    /// Energy variance over the history window
    pub variance: f64,
    /// Energy the block had to exceed
    pub threshold: f64,
    pub is_beat: bool,
}

pub fn bin_frequency(k: usize, sample_rate: u32, n: usize) -> f64 {
    k as f64 * sample_rate as f64 / n as f64
}
