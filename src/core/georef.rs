//! Georeferencing for upscaled rasters.
//!
//! GDAL geotransforms are `[origin_x, pixel_w, rot_x, origin_y, rot_y, pixel_h]`.
//! Upscaling by `s` keeps the top-left corner fixed and divides every
//! pixel-space coefficient by `s`, i.e. `T * scale(1/s)`.

/// Geotransform of the same footprint sampled `scale` times finer.
pub fn upscale_geotransform(gt: [f64; 6], scale: usize) -> [f64; 6] {
    let s = scale.max(1) as f64;
    [gt[0], gt[1] / s, gt[2] / s, gt[3], gt[4] / s, gt[5] / s]
}

/// True for the placeholder transform GDAL reports for un-georeferenced rasters.
pub fn is_identity_geotransform(gt: &[f64; 6]) -> bool {
    *gt == [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
}
