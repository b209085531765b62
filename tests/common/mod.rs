//! Shared fixtures for GEOSR integration tests: a nearest-neighbour
//! "model", an in-memory raster codec and a model loader keyed on the
//! stored model bytes.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array3, Array4, ArrayView3, Axis};

use geosr::core::processing::normalize::BandStack;
use geosr::io::{GeoMetadata, ModelLoader, RasterCodec};
use geosr::{Error, NchwTensor, Result, SuperResolver};

/// Model stub repeating every pixel into a `factor x factor` block.
pub fn replicate(factor: usize) -> impl FnMut(&NchwTensor) -> Result<NchwTensor> + 'static {
    move |input: &NchwTensor| -> Result<NchwTensor> {
        let view = input.view();
        let [n, c, h, w] = input.shape();
        let out = Array4::from_shape_fn((n, c, h * factor, w * factor), |(b, ch, y, x)| {
            view[[b, ch, y / factor, x / factor]]
        });
        Ok(NchwTensor::from_array(out))
    }
}

/// Nearest-neighbour upsampling of an HWC image, the reference for `replicate`.
pub fn upsample_nearest(image: &ArrayView3<f32>, factor: usize) -> Array3<f32> {
    let (h, w, c) = image.dim();
    Array3::from_shape_fn((h * factor, w * factor, c), |(y, x, ch)| {
        image[[y / factor, x / factor, ch]]
    })
}

/// Deterministic, non-repeating test composite in [0,1].
pub fn gradient_image(height: usize, width: usize, channels: usize) -> Array3<f32> {
    let total = (height * width * channels) as f32;
    Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
        ((y * width + x) * channels + c) as f32 / total
    })
}

/// Band stack with one constant value per band.
pub fn constant_stack(values: &[f32], height: usize, width: usize) -> BandStack {
    let mut stack = BandStack::zeros((values.len(), height, width));
    for (mut plane, &v) in stack.axis_iter_mut(Axis(0)).zip(values) {
        plane.fill(v);
    }
    stack
}

pub const UTM_33N_WKT: &str = "PROJCS[\"WGS 84 / UTM zone 33N\",GEOGCS[\"WGS 84\"],AUTHORITY[\"EPSG\",\"32633\"]]";

pub fn utm_metadata(stack: &BandStack) -> GeoMetadata {
    let (bands, rows, cols) = stack.dim();
    GeoMetadata {
        size_x: cols,
        size_y: rows,
        bands,
        geotransform: [500000.0, 10.0, 0.0, 4600000.0, 0.0, -10.0],
        projection: UTM_33N_WKT.to_string(),
        epsg: Some("EPSG:32633".to_string()),
        metadata: HashMap::from([
            ("SENSOR".to_string(), "S2B".to_string()),
            ("GEOSR_SCALE_FACTOR".to_string(), "stale".to_string()),
        ]),
    }
}

/// Arguments captured from the last `write_rgb_u16` call.
#[derive(Debug, Clone)]
pub struct WrittenRaster {
    pub image: Array3<u16>,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub tags: Vec<(String, String)>,
}

impl WrittenRaster {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Codec serving a fixed band stack for any existing file and writing a
/// small marker file instead of a GeoTIFF.
pub struct MemoryCodec {
    pub stack: BandStack,
    pub metadata: GeoMetadata,
    pub written: RefCell<Option<WrittenRaster>>,
}

pub const MARKER: &[u8] = b"GEOSR-TEST-RASTER";

impl MemoryCodec {
    pub fn new(stack: BandStack) -> Self {
        let metadata = utm_metadata(&stack);
        Self {
            stack,
            metadata,
            written: RefCell::new(None),
        }
    }

    pub fn written(&self) -> Option<WrittenRaster> {
        self.written.borrow().clone()
    }
}

impl RasterCodec for MemoryCodec {
    fn read(&self, path: &Path) -> Result<(BandStack, GeoMetadata)> {
        std::fs::metadata(path)?;
        Ok((self.stack.clone(), self.metadata.clone()))
    }

    fn write_rgb_u16(
        &self,
        path: &Path,
        image: &ArrayView3<u16>,
        geotransform: [f64; 6],
        projection: &str,
        tags: &[(String, String)],
    ) -> Result<()> {
        std::fs::write(path, MARKER)?;
        *self.written.borrow_mut() = Some(WrittenRaster {
            image: image.to_owned(),
            geotransform,
            projection: projection.to_string(),
            tags: tags.to_vec(),
        });
        Ok(())
    }
}

/// Loads models stored as the text `replicate:<factor>`.
pub struct ReplicateLoader;

impl ModelLoader for ReplicateLoader {
    fn load(&self, model: &[u8]) -> Result<Box<dyn SuperResolver>> {
        let text = std::str::from_utf8(model).map_err(Error::inference)?;
        let factor = text
            .trim()
            .strip_prefix("replicate:")
            .and_then(|f| f.parse::<usize>().ok())
            .ok_or_else(|| Error::Inference(format!("unrecognised model {:?}", text)))?;
        Ok(Box::new(replicate(factor)))
    }
}
