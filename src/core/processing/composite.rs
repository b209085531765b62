use ndarray::{Array3, ArrayView3, Axis};
use tracing::{debug, info};

use crate::core::processing::normalize::{BandStack, normalize_bands};
use crate::error::{Error, Result};

/// Number of channels in a composite.
pub const COMPOSITE_CHANNELS: usize = 3;

/// Validate requested band indices against the raster and return the three
/// bands forming the composite. Extra indices beyond the third are ignored.
pub fn select_composite_bands(band_count: usize, indices: &[usize]) -> Result<[usize; 3]> {
    if indices.len() > band_count || indices.iter().any(|&i| i >= band_count) {
        return Err(Error::BandIndexOutOfRange {
            indices: indices.to_vec(),
            available: band_count,
        });
    }
    if indices.len() < COMPOSITE_CHANNELS {
        return Err(Error::InvalidArgument {
            arg: "band_indices",
            value: format!("{:?} (need {} bands)", indices, COMPOSITE_CHANNELS),
        });
    }
    if indices.len() > COMPOSITE_CHANNELS {
        debug!(
            "Using first {} of band indices {:?}",
            COMPOSITE_CHANNELS, indices
        );
    }
    Ok([indices[0], indices[1], indices[2]])
}

/// Normalize the whole stack and stack the selected bands into an HWC
/// composite with values in [0,1].
pub fn build_composite(
    stack: &BandStack,
    band_indices: &[usize],
    ratio_bands: &[usize],
) -> Result<Array3<f32>> {
    let (bands, rows, cols) = stack.dim();
    let selected = select_composite_bands(bands, band_indices)?;
    info!(
        "Building {}x{} composite from bands {:?} of {}",
        rows, cols, selected, bands
    );

    let normalized = normalize_bands(stack, ratio_bands);
    let mut composite = Array3::<f32>::zeros((rows, cols, COMPOSITE_CHANNELS));
    for (mut dst, &band) in composite.axis_iter_mut(Axis(2)).zip(selected.iter()) {
        dst.assign(&normalized.index_axis(Axis(0), band));
    }
    composite.mapv_inplace(|v| v.clamp(0.0, 1.0));
    Ok(composite)
}

/// Scale [0,1] samples to the full u16 range, truncating like an integer cast.
pub fn quantize_u16(mosaic: &ArrayView3<f32>) -> Array3<u16> {
    // `as` saturates and maps NaN to 0.
    mosaic.mapv(|v| (v * 65535.0) as u16)
}

/// Split an HWC image into one row-major plane per channel, as raster writers expect.
pub fn channel_planes<T: Copy>(image: &ArrayView3<T>) -> Vec<Vec<T>> {
    image
        .axis_iter(Axis(2))
        .map(|plane| plane.iter().copied().collect())
        .collect()
}
