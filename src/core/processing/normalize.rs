use ndarray::{Array2, Array3, ArrayView2, Axis};
use tracing::debug;

/// Raw raster bands, shape (channels, rows, cols). Non-finite samples mark no-data.
pub type BandStack = Array3<f32>;

/// How a non-ratio band is brought into [0,1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandScaling {
    /// Divide by a fixed full-scale value, then clip.
    Divide(f32),
    /// Linear stretch between the 1st and 99th percentile of finite samples, then clip.
    PercentileStretch,
}

/// Decision table keyed on the band's finite maximum, checked top to bottom.
/// A band whose maximum exceeds `above` is scaled with the paired rule; bands
/// matching no row fall through to [`BandScaling::PercentileStretch`].
///
/// | max above | assumed encoding           | rule          |
/// |-----------|----------------------------|---------------|
/// | 2000      | reflectance scaled x10000  | / 10000       |
/// | 1.5       | 8-bit                      | / 255         |
/// | otherwise | roughly [0,1] already      | p1..p99 stretch |
pub const RANGE_RULES: &[(f32, BandScaling)] = &[
    (2000.0, BandScaling::Divide(10000.0)),
    (1.5, BandScaling::Divide(255.0)),
];

pub const STRETCH_LOW_PERCENTILE: f64 = 1.0;
pub const STRETCH_HIGH_PERCENTILE: f64 = 99.0;

/// Pick the scaling rule for a band from its finite maximum.
pub fn classify_band(max: f32) -> BandScaling {
    RANGE_RULES
        .iter()
        .find(|(above, _)| max > *above)
        .map(|(_, rule)| *rule)
        .unwrap_or(BandScaling::PercentileStretch)
}

#[inline]
fn clip01(v: f32) -> f32 {
    // NaN compares false everywhere, so it lands on 0 rather than leaking through.
    if v > 0.0 { v.min(1.0) } else { 0.0 }
}

fn finite_values(band: &ArrayView2<f32>) -> Vec<f32> {
    band.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Percentile with linear interpolation between closest ranks. `sorted` must be
/// ascending and non-empty.
pub fn percentile_sorted(sorted: &[f32], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0] as f64;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    let a = sorted[lo] as f64;
    let b = sorted[hi] as f64;
    a + (b - a) * frac
}

/// Normalize one optical band with the range heuristic in [`RANGE_RULES`].
pub fn normalize_band_auto(band: &ArrayView2<f32>) -> Array2<f32> {
    let mut valid = finite_values(band);
    if valid.is_empty() {
        debug!("normalize_band_auto: no finite samples, emitting zero band");
        return Array2::zeros(band.dim());
    }

    let max = valid.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let rule = classify_band(max);
    debug!("normalize_band_auto: max={:.4}, rule={:?}", max, rule);

    match rule {
        BandScaling::Divide(full_scale) => band.mapv(|v| {
            if v.is_finite() { clip01(v / full_scale) } else { 0.0 }
        }),
        BandScaling::PercentileStretch => {
            valid.sort_by(|a, b| a.total_cmp(b));
            let p_low = percentile_sorted(&valid, STRETCH_LOW_PERCENTILE);
            let p_high = percentile_sorted(&valid, STRETCH_HIGH_PERCENTILE);
            if p_high > p_low {
                let span = p_high - p_low;
                band.mapv(|v| {
                    if v.is_finite() {
                        clip01(((v as f64 - p_low) / span) as f32)
                    } else {
                        0.0
                    }
                })
            } else {
                debug!("normalize_band_auto: flat band (p1 == p99), clip only");
                band.mapv(clip01)
            }
        }
    }
}

/// Min-max scale one ratio band over its finite samples; non-finite samples become 0.
pub fn normalize_band_minmax(band: &ArrayView2<f32>) -> Array2<f32> {
    let valid = finite_values(band);
    if valid.is_empty() {
        return Array2::zeros(band.dim());
    }
    let min = valid.iter().copied().fold(f32::INFINITY, f32::min) as f64;
    let max = valid.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let range = max - min;
    // Constant band: unit range, so every finite sample maps to 0.
    let range = if range > 0.0 { range } else { 1.0 };
    debug!("normalize_band_minmax: min={:.4}, max={:.4}", min, max);

    band.mapv(|v| {
        if v.is_finite() {
            clip01(((v as f64 - min) / range) as f32)
        } else {
            0.0
        }
    })
}

/// Normalize every band of `stack` into [0,1]. Bands listed in `ratio_bands` use
/// min-max scaling; all others use the range heuristic. Statistics are per band.
pub fn normalize_bands(stack: &BandStack, ratio_bands: &[usize]) -> BandStack {
    let mut out = Array3::<f32>::zeros(stack.dim());
    for (c, (band, mut dst)) in stack
        .axis_iter(Axis(0))
        .zip(out.axis_iter_mut(Axis(0)))
        .enumerate()
    {
        let normalized = if ratio_bands.contains(&c) {
            normalize_band_minmax(&band)
        } else {
            normalize_band_auto(&band)
        };
        dst.assign(&normalized);
    }
    out
}
