//! Conversion between HWC pixel tiles in [0,1] and the NCHW f32 tensors a
//! super-resolution model consumes and produces.
use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Axis};

use crate::error::{Error, Result};
use crate::types::PreprocessMode;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Owned, contiguous NCHW tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct NchwTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl NchwTensor {
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::InferenceOutput(format!(
                "tensor data length {} does not match shape {:?}",
                data.len(),
                shape
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn from_array(array: Array4<f32>) -> Self {
        let (n, c, h, w) = array.dim();
        let data = if array.is_standard_layout() {
            array.into_raw_vec()
        } else {
            array.iter().copied().collect()
        };
        Self {
            shape: [n, c, h, w],
            data,
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        // Length is checked on construction.
        ArrayView4::from_shape(self.shape, &self.data)
            .unwrap_or_else(|_| unreachable!("NchwTensor shape/data mismatch"))
    }

    pub fn channels(&self) -> usize {
        self.shape[1]
    }
}

#[inline]
fn clip01(v: f32) -> f32 {
    if v > 0.0 { v.min(1.0) } else { 0.0 }
}

fn require_rgb(channels: usize, mode: PreprocessMode) -> Result<()> {
    if mode == PreprocessMode::Imagenet && channels != IMAGENET_MEAN.len() {
        return Err(Error::InvalidArgument {
            arg: "preprocess_mode",
            value: format!("{} needs 3 channels, tile has {}", mode, channels),
        });
    }
    Ok(())
}

/// Pixel domain -> model domain, then HWC -> single-sample NCHW.
pub fn preprocess(tile: &ArrayView3<f32>, mode: PreprocessMode) -> Result<NchwTensor> {
    let (_, _, channels) = tile.dim();
    require_rgb(channels, mode)?;

    let mut x = tile.to_owned();
    match mode {
        PreprocessMode::ZeroOne => {}
        PreprocessMode::MinusOneOne => x.mapv_inplace(|v| v * 2.0 - 1.0),
        PreprocessMode::Imagenet => {
            for (c, mut plane) in x.axis_iter_mut(Axis(2)).enumerate() {
                let (mean, std) = (IMAGENET_MEAN[c], IMAGENET_STD[c]);
                plane.mapv_inplace(|v| (v - mean) / std);
            }
        }
    }

    let nchw = x.permuted_axes([2, 0, 1]).insert_axis(Axis(0));
    Ok(NchwTensor::from_array(nchw.as_standard_layout().into_owned()))
}

/// Model domain -> pixel domain: drops the sample axis, NCHW -> HWC, undoes
/// `mode` and clips to [0,1].
pub fn postprocess(tensor: &NchwTensor, mode: PreprocessMode) -> Result<Array3<f32>> {
    if tensor.shape[0] != 1 {
        return Err(Error::InferenceOutput(format!(
            "expected a single-sample batch, got shape {:?}",
            tensor.shape
        )));
    }
    if mode == PreprocessMode::Imagenet && tensor.channels() != IMAGENET_MEAN.len() {
        return Err(Error::InferenceOutput(format!(
            "imagenet mode needs 3 output channels, got shape {:?}",
            tensor.shape
        )));
    }

    let hwc = tensor.view().index_axis_move(Axis(0), 0).permuted_axes([1, 2, 0]);
    let mut y: Array3<f32> = hwc.as_standard_layout().into_owned();
    match mode {
        PreprocessMode::ZeroOne => {}
        PreprocessMode::MinusOneOne => y.mapv_inplace(|v| (v + 1.0) * 0.5),
        PreprocessMode::Imagenet => {
            for (c, mut plane) in y.axis_iter_mut(Axis(2)).enumerate() {
                let (mean, std) = (IMAGENET_MEAN[c], IMAGENET_STD[c]);
                plane.mapv_inplace(|v| v * std + mean);
            }
        }
    }
    y.mapv_inplace(clip01);
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [PreprocessMode; 3] = [
        PreprocessMode::ZeroOne,
        PreprocessMode::MinusOneOne,
        PreprocessMode::Imagenet,
    ];

    fn sample_tile() -> Array3<f32> {
        Array3::from_shape_fn((5, 4, 3), |(y, x, c)| ((y * 4 + x) * 3 + c) as f32 / 59.0)
    }

    #[test]
    fn layout_is_single_sample_channel_first() {
        let tile = sample_tile();
        let t = preprocess(&tile.view(), PreprocessMode::ZeroOne).unwrap();
        assert_eq!(t.shape(), [1, 3, 5, 4]);
        let v = t.view();
        assert_eq!(v[[0, 2, 3, 1]], tile[[3, 1, 2]]);
        assert_eq!(v[[0, 0, 0, 0]], tile[[0, 0, 0]]);
        // Contiguous: channel planes are consecutive.
        assert_eq!(t.data()[5 * 4], tile[[0, 0, 1]]);
    }

    #[test]
    fn minus_one_one_maps_range() {
        let tile = Array3::from_shape_vec((1, 1, 3), vec![0.0, 0.5, 1.0]).unwrap();
        let t = preprocess(&tile.view(), PreprocessMode::MinusOneOne).unwrap();
        assert_eq!(t.data(), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn imagenet_standardizes_per_channel() {
        let tile = Array3::from_shape_vec((1, 1, 3), IMAGENET_MEAN.to_vec()).unwrap();
        let t = preprocess(&tile.view(), PreprocessMode::Imagenet).unwrap();
        assert!(t.data().iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn roundtrip_recovers_input_for_every_mode() {
        let tile = sample_tile();
        for mode in MODES {
            let back = postprocess(&preprocess(&tile.view(), mode).unwrap(), mode).unwrap();
            assert_eq!(back.dim(), tile.dim());
            for (a, b) in back.iter().zip(tile.iter()) {
                assert!((a - b).abs() < 1e-5, "mode {}: {} vs {}", mode, a, b);
            }
        }
    }

    #[test]
    fn postprocess_clips_drifting_output() {
        let t = NchwTensor::new([1, 3, 1, 2], vec![-0.5, 0.5, 1.5, 0.2, f32::NAN, 0.9]).unwrap();
        let y = postprocess(&t, PreprocessMode::ZeroOne).unwrap();
        assert_eq!(y.dim(), (1, 2, 3));
        assert_eq!(y[[0, 0, 0]], 0.0);
        assert_eq!(y[[0, 1, 0]], 0.5);
        assert_eq!(y[[0, 0, 1]], 1.0);
        assert_eq!(y[[0, 0, 2]], 0.0);
        assert!(y.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn postprocess_rejects_batches() {
        let t = NchwTensor::new([2, 3, 1, 1], vec![0.0; 6]).unwrap();
        assert!(matches!(
            postprocess(&t, PreprocessMode::ZeroOne),
            Err(Error::InferenceOutput(_))
        ));
    }

    #[test]
    fn tensor_length_is_checked() {
        assert!(NchwTensor::new([1, 3, 2, 2], vec![0.0; 11]).is_err());
    }

    #[test]
    fn imagenet_requires_three_channels() {
        let tile = Array3::<f32>::zeros((2, 2, 1));
        assert!(preprocess(&tile.view(), PreprocessMode::Imagenet).is_err());
        assert!(preprocess(&tile.view(), PreprocessMode::ZeroOne).is_ok());
    }
}
