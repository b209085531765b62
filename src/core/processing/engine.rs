//! Tiled super-resolution: split -> pad -> infer -> crop -> reconstruct.
//!
//! The composite is cut into `tile_size` squares, each tile is reflect-padded,
//! run through the model, cropped back to its own upscaled footprint and placed
//! into the output mosaic. The upscaling factor is not configured: it is read
//! off the model output for tile (0, 0) and every other tile must agree with it.
use std::time::Instant;

use ndarray::{Array3, ArrayView3, s};
use tracing::{debug, info};

use crate::core::params::TilingConfig;
use crate::core::processing::padding::pad_reflect_101;
use crate::core::processing::tensor::{NchwTensor, postprocess, preprocess};
use crate::core::processing::tiling::TileGrid;
use crate::error::{Error, Result};

/// A loaded super-resolution model: one NCHW tensor in, one NCHW tensor out.
/// Called once per tile, sequentially, on the same instance.
pub trait SuperResolver {
    fn infer(&mut self, input: &NchwTensor) -> Result<NchwTensor>;
}

impl<F> SuperResolver for F
where
    F: FnMut(&NchwTensor) -> Result<NchwTensor>,
{
    fn infer(&mut self, input: &NchwTensor) -> Result<NchwTensor> {
        self(input)
    }
}

/// Output of a tiled run.
#[derive(Debug, Clone)]
pub struct SuperResolved {
    /// (tiles_y * tile_size * scale, tiles_x * tile_size * scale, channels), values in [0,1]
    pub mosaic: Array3<f32>,
    pub scale: usize,
}

/// Integer upscaling factor from the output edge of a padded tile.
pub fn detect_scale(output_size: usize, padded_size: usize) -> Result<usize> {
    if padded_size == 0 || output_size < padded_size || output_size % padded_size != 0 {
        return Err(Error::ScaleDetection {
            output: output_size,
            padded: padded_size,
        });
    }
    Ok(output_size / padded_size)
}

/// Offset of the centered `target` window inside an `output_size` edge.
#[inline]
pub fn crop_offset(output_size: usize, target: usize) -> usize {
    (output_size - target) / 2
}

fn crop_center(tile: &Array3<f32>, target: usize) -> Array3<f32> {
    let (h, w, _) = tile.dim();
    let off_y = crop_offset(h, target);
    let off_x = crop_offset(w, target);
    tile.slice(s![off_y..off_y + target, off_x..off_x + target, ..])
        .to_owned()
}

/// Run `model` over `composite` (rows, cols, channels in [0,1]) tile by tile.
///
/// Tiles are visited in row-major order, so tile (0, 0) always fixes the scale.
/// Any failure aborts the run; no partial mosaic is returned.
pub fn run_tiled_super_resolution(
    composite: &ArrayView3<f32>,
    model: &mut dyn SuperResolver,
    config: &TilingConfig,
) -> Result<SuperResolved> {
    config.validate()?;
    let tile_size = config.tile_size;
    let padded_size = config.padded_size();

    let tiles = TileGrid::split(composite, tile_size)?;
    let (tiles_y, tiles_x) = (tiles.tiles_y(), tiles.tiles_x());
    info!(
        "Super-resolving {} tiles ({}x{}), tile={}, pad={}, mode={}",
        tiles_y * tiles_x,
        tiles_y,
        tiles_x,
        tile_size,
        config.pad,
        config.mode
    );

    let mut sr_tiles = TileGrid::with_shape(tiles_y, tiles_x);
    let mut scale: Option<usize> = None;
    let started = Instant::now();

    for ((row, col), tile) in tiles.iter() {
        let padded = pad_reflect_101(&tile, config.pad);
        let input = preprocess(&padded.view(), config.mode)?;
        let output = model.infer(&input)?;
        let out_hwc = postprocess(&output, config.mode)?;

        let (hs, ws, _) = out_hwc.dim();
        if hs != ws {
            return Err(Error::NonSquareOutput {
                height: hs,
                width: ws,
            });
        }

        let factor = match scale {
            None => {
                let detected = detect_scale(hs, padded_size)?;
                info!(
                    "Detected scale factor {} from tile ({}, {}): {} -> {}",
                    detected, row, col, padded_size, hs
                );
                scale = Some(detected);
                detected
            }
            Some(factor) => {
                let expected = factor * padded_size;
                if hs != expected {
                    return Err(Error::InconsistentScale {
                        row,
                        col,
                        scale: factor,
                        expected,
                        found: hs,
                    });
                }
                factor
            }
        };

        let target = tile_size * factor;
        let cropped = crop_center(&out_hwc, target);
        debug!(
            "Tile ({}, {}): {}x{} -> {}x{}, cropped at {} to {}x{}",
            row,
            col,
            padded_size,
            padded_size,
            hs,
            ws,
            crop_offset(hs, target),
            target,
            target
        );
        sr_tiles.insert(row, col, &cropped.view())?;
    }

    let elapsed = started.elapsed().as_secs_f64();
    let count = tiles_y * tiles_x;
    info!(
        "Processed {} tiles in {:.2}s ({:.1} tiles/s)",
        count,
        elapsed,
        if elapsed > 0.0 { count as f64 / elapsed } else { 0.0 }
    );

    let mosaic = sr_tiles.reconstruct()?;
    let scale = scale.ok_or_else(|| Error::Processing("composite produced no tiles".into()))?;
    Ok(SuperResolved { mosaic, scale })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PreprocessMode;
    use ndarray::Array4;

    /// Nearest-neighbour upsampler standing in for a model.
    fn replicate(factor: usize) -> impl FnMut(&NchwTensor) -> Result<NchwTensor> {
        move |input: &NchwTensor| -> Result<NchwTensor> {
            let v = input.view();
            let [n, c, h, w] = input.shape();
            let out = Array4::from_shape_fn((n, c, h * factor, w * factor), |(n, c, y, x)| {
                v[[n, c, y / factor, x / factor]]
            });
            Ok(NchwTensor::from_array(out))
        }
    }

    #[test]
    fn scale_detection_rules() {
        assert_eq!(detect_scale(80, 40).unwrap(), 2);
        assert_eq!(detect_scale(40, 40).unwrap(), 1);
        assert!(matches!(
            detect_scale(81, 40),
            Err(Error::ScaleDetection { output: 81, padded: 40 })
        ));
        assert!(detect_scale(20, 40).is_err());
        assert!(detect_scale(0, 40).is_err());
    }

    #[test]
    fn crop_offset_is_symmetric() {
        // tile 32, pad 4, scale 4: 160 out, 128 kept, 16 dropped per side.
        assert_eq!(crop_offset(160, 128), 16);
        assert_eq!(crop_offset(8, 8), 0);
    }

    #[test]
    fn nearest_upsampler_without_padding() {
        let composite = Array3::from_shape_fn((8, 8, 3), |(y, x, c)| {
            ((y * 8 + x) as f32 + c as f32 * 0.25) / 100.0
        });
        let config = TilingConfig {
            tile_size: 2,
            pad: 0,
            mode: PreprocessMode::ZeroOne,
        };
        let mut model = replicate(2);
        let out = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap();
        assert_eq!(out.scale, 2);
        assert_eq!(out.mosaic.dim(), (16, 16, 3));
        let expected = Array3::from_shape_fn((16, 16, 3), |(y, x, c)| composite[[y / 2, x / 2, c]]);
        assert_eq!(out.mosaic, expected);
    }

    #[test]
    fn identity_model_with_padding_reproduces_tile() {
        let composite = Array3::from_shape_fn((4, 4, 3), |(y, x, c)| (y * 4 + x + c) as f32 / 20.0);
        let config = TilingConfig {
            tile_size: 4,
            pad: 1,
            mode: PreprocessMode::ZeroOne,
        };
        let mut seen = Vec::new();
        let mut model = |input: &NchwTensor| -> Result<NchwTensor> {
            seen.push(input.shape());
            Ok(input.clone())
        };
        let out = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap();
        assert_eq!(seen, vec![[1, 3, 6, 6]]);
        assert_eq!(out.scale, 1);
        assert_eq!(out.mosaic, composite);
    }

    #[test]
    fn padded_upscale_crops_back_to_footprint() {
        let composite = Array3::from_shape_fn((8, 12, 3), |(y, x, c)| {
            ((y * 12 + x) * 3 + c) as f32 / 300.0
        });
        for mode in [
            PreprocessMode::ZeroOne,
            PreprocessMode::MinusOneOne,
            PreprocessMode::Imagenet,
        ] {
            let config = TilingConfig {
                tile_size: 4,
                pad: 2,
                mode,
            };
            let mut model = replicate(3);
            let out = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap();
            assert_eq!(out.scale, 3);
            assert_eq!(out.mosaic.dim(), (24, 36, 3));
            for ((y, x, c), v) in out.mosaic.indexed_iter() {
                let want = composite[[y / 3, x / 3, c]];
                assert!((v - want).abs() < 1e-5, "{} {} {}: {} vs {}", y, x, c, v, want);
            }
        }
    }

    #[test]
    fn non_square_output_fails() {
        let composite = Array3::<f32>::zeros((4, 4, 3));
        let config = TilingConfig {
            tile_size: 2,
            pad: 0,
            mode: PreprocessMode::ZeroOne,
        };
        let mut model = |input: &NchwTensor| -> Result<NchwTensor> {
            let [n, c, h, w] = input.shape();
            NchwTensor::new([n, c, h * 2, w], vec![0.0; n * c * h * 2 * w])
        };
        let err = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap_err();
        assert!(matches!(err, Error::NonSquareOutput { height: 4, width: 2 }));
    }

    #[test]
    fn fractional_scale_fails() {
        let composite = Array3::<f32>::zeros((4, 4, 3));
        let config = TilingConfig {
            tile_size: 4,
            pad: 1,
            mode: PreprocessMode::ZeroOne,
        };
        // 6x6 padded input -> 9x9 output is a 1.5x model.
        let mut model =
            |_: &NchwTensor| -> Result<NchwTensor> { NchwTensor::new([1, 3, 9, 9], vec![0.0; 3 * 81]) };
        let err = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap_err();
        assert!(matches!(err, Error::ScaleDetection { output: 9, padded: 6 }));
    }

    #[test]
    fn drifting_scale_fails_on_later_tile() {
        let composite = Array3::<f32>::zeros((4, 8, 3));
        let config = TilingConfig {
            tile_size: 4,
            pad: 0,
            mode: PreprocessMode::ZeroOne,
        };
        let mut calls = 0usize;
        let mut model = |input: &NchwTensor| -> Result<NchwTensor> {
            calls += 1;
            let factor = if calls == 1 { 2 } else { 3 };
            replicate(factor)(input)
        };
        let err = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentScale {
                row: 0,
                col: 1,
                scale: 2,
                expected: 8,
                found: 12
            }
        ));
    }

    #[test]
    fn inference_failure_aborts_run() {
        let composite = Array3::<f32>::zeros((4, 4, 3));
        let config = TilingConfig {
            tile_size: 2,
            pad: 0,
            mode: PreprocessMode::ZeroOne,
        };
        let mut model =
            |_: &NchwTensor| -> Result<NchwTensor> { Err(Error::Processing("boom".into())) };
        assert!(run_tiled_super_resolution(&composite.view(), &mut model, &config).is_err());
    }

    #[test]
    fn ragged_composite_fails_before_inference() {
        let composite = Array3::<f32>::zeros((6, 8, 3));
        let config = TilingConfig {
            tile_size: 4,
            pad: 0,
            mode: PreprocessMode::ZeroOne,
        };
        let mut called = false;
        let mut model = |input: &NchwTensor| -> Result<NchwTensor> {
            called = true;
            Ok(input.clone())
        };
        let err = run_tiled_super_resolution(&composite.view(), &mut model, &config).unwrap_err();
        assert!(matches!(err, Error::TileDivision { .. }));
        assert!(!called);
    }
}
