use serde::Deserialize;

use super::stereo::SampleView;

/// Window shapes applied before a spectral transform.
///
/// The cosine terms take `i / N` directly, without the `2π` factor of the
/// textbook definitions. Over a block this only covers the first radian of
/// the cosine, so the shapes are monotonic ramps rather than symmetric bells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowType {
    #[default]
    Rectangular,
    /// Bartlett
    Triangle,
    Hamming,
    Hanning,
    Blackman,
    BlackmanHarris,
}

impl WindowType {
    /// Multiplicative weight of sample `index` in a block of `len` samples.
    pub fn weight(self, index: usize, len: usize) -> f64 {
        let i = index as f64;
        let n = len as f64;
        match self {
            WindowType::Rectangular => 1.0,
            WindowType::Triangle => {
                let half = (n - 1.0) / 2.0;
                if half <= 0.0 {
                    return 1.0;
                }
                1.0 - ((i - half) / half).abs()
            }
            WindowType::Hamming => 0.54 - 0.46 * (i / n).cos(),
            WindowType::Hanning => 0.5 * (1.0 - (i / n).cos()),
            WindowType::Blackman => 0.42 - 0.5 * (i / n).cos() + 0.08 * (2.0 * i / n).cos(),
            WindowType::BlackmanHarris => {
                0.35875 - 0.48829 * (i / n).cos() + 0.14128 * (2.0 * i / n).cos()
                    - 0.01168 * (3.0 * i / n).cos()
            }
        }
    }
}

/// Window the samples under `view` in place.
///
/// Every sample becomes `trunc(avg * weight)` on both channels, so stereo
/// input collapses to its weighted downmix. The cursor is left at 0.
pub fn apply_window<B>(view: &mut SampleView<B>, window: WindowType)
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    if window == WindowType::Rectangular || view.is_empty() {
        return;
    }

    let len = view.len();
    view.reset();
    let mut index = 0;
    loop {
        let weighted = view.avg() as f64 * window.weight(index, len);
        view.set_avg(weighted as i32);
        index += 1;
        if !view.next() {
            break;
        }
    }
    view.reset();
}
