use gdal::raster::ResampleAlg;
use gdal::{Dataset, Metadata, errors::GdalError as GdalCrateError};
use ndarray::{Array2, ArrayView3, Axis};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::processing::composite::channel_planes;
use crate::core::processing::normalize::BandStack;
use crate::io::writers::metadata::embed_geo_metadata;
use crate::io::writers::tiff::write_tiff_rgb_u16;

/// Errors encountered when using GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
}

/// Georeferencing and layout of a raster
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection as reported by GDAL (usually full WKT); written to outputs unchanged
    pub projection: String,
    /// `EPSG:xxxx` when the projection carries an authority code
    pub epsg: Option<String>,
    /// Items of the default metadata domain, carried over to outputs
    pub metadata: HashMap<String, String>,
}

impl GeoMetadata {
    /// Short CRS label: the EPSG code when known, the projection otherwise.
    pub fn crs_label(&self) -> &str {
        self.epsg.as_deref().unwrap_or(&self.projection)
    }
}

/// Read a band stack and write an upscaled RGB raster.
pub trait RasterCodec {
    fn read(&self, path: &Path) -> crate::Result<(BandStack, GeoMetadata)>;

    /// Write a 3-band u16 raster, `image` shaped (rows, cols, 3).
    fn write_rgb_u16(
        &self,
        path: &Path,
        image: &ArrayView3<u16>,
        geotransform: [f64; 6],
        projection: &str,
        tags: &[(String, String)],
    ) -> crate::Result<()>;
}

/// Reader for generic geospatial formats via GDAL
pub struct GdalRasterReader {
    pub dataset: Dataset,
    pub metadata: GeoMetadata,
}

// Helper to extract EPSG code from WKT authority tag
fn parse_epsg(wkt: &str) -> Option<String> {
    if wkt.starts_with("EPSG:") {
        return Some(wkt.to_string());
    }
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

/// Shape `(cols, rows)` samples into a (rows, cols) plane, turning no-data into NaN.
fn plane_from_samples(
    mut data: Vec<f32>,
    expected: (usize, usize),
    got: (usize, usize),
    no_data: Option<f64>,
) -> Result<Array2<f32>, GdalError> {
    let (cols, rows) = expected;
    if got != expected {
        return Err(GdalError::DimensionMismatch(cols, rows, got.0, got.1));
    }
    if data.len() != cols * rows {
        return Err(GdalError::UnsupportedFormat(format!(
            "band buffer holds {} samples, expected {}",
            data.len(),
            cols * rows
        )));
    }
    if let Some(no_data) = no_data {
        let no_data = no_data as f32;
        for v in data.iter_mut() {
            if *v == no_data {
                *v = f32::NAN;
            }
        }
    }
    Array2::from_shape_vec((rows, cols), data)
        .map_err(|_| GdalError::DimensionMismatch(cols, rows, got.0, got.1))
}

impl GdalRasterReader {
    /// Open a GDAL-supported dataset (e.g., GeoTIFF)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = dataset
            .geo_transform()
            .unwrap_or([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let projection = dataset.projection();
        let epsg = parse_epsg(&projection);
        let mut metadata_map = HashMap::new();
        if let Some(entries) = dataset.metadata_domain("") {
            for entry in entries {
                if let Some((key, val)) = entry.split_once('=') {
                    metadata_map.insert(key.to_string(), val.to_string());
                }
            }
        }
        debug!(
            "Opened raster {}x{} with {} bands, crs={}, {} metadata items",
            size_x,
            size_y,
            bands,
            epsg.as_deref().unwrap_or("<wkt>"),
            metadata_map.len()
        );
        Ok(GdalRasterReader {
            dataset,
            metadata: GeoMetadata {
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
                epsg,
                metadata: metadata_map,
            },
        })
    }

    /// Read a single band (1-based index) as f32 of shape (height, width).
    /// Samples equal to the band's no-data value become NaN.
    pub fn read_band(&self, index: usize) -> Result<Array2<f32>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f32>((0, 0), window, window, Some(ResampleAlg::NearestNeighbour))?;
        let got = buf.shape();
        plane_from_samples(
            buf.data().to_vec(),
            window,
            got,
            band.no_data_value(),
        )
    }

    /// Read all bands into a (bands, height, width) stack
    pub fn read_all_bands(&self) -> Result<BandStack, GdalError> {
        let mut stack = BandStack::zeros((
            self.metadata.bands,
            self.metadata.size_y,
            self.metadata.size_x,
        ));
        for (i, mut plane) in stack.axis_iter_mut(Axis(0)).enumerate() {
            plane.assign(&self.read_band(i + 1)?);
        }
        Ok(stack)
    }
}

/// [`RasterCodec`] over GDAL's GeoTIFF driver
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalCodec;

impl RasterCodec for GdalCodec {
    fn read(&self, path: &Path) -> crate::Result<(BandStack, GeoMetadata)> {
        let reader = GdalRasterReader::open(path)?;
        let stack = reader.read_all_bands()?;
        info!(
            "Read {:?}: {} bands of {}x{} ({})",
            path,
            reader.metadata.bands,
            reader.metadata.size_x,
            reader.metadata.size_y,
            reader.metadata.crs_label()
        );
        Ok((stack, reader.metadata))
    }

    fn write_rgb_u16(
        &self,
        path: &Path,
        image: &ArrayView3<u16>,
        geotransform: [f64; 6],
        projection: &str,
        tags: &[(String, String)],
    ) -> crate::Result<()> {
        let (rows, cols, channels) = image.dim();
        if channels != 3 {
            return Err(GdalError::UnsupportedFormat(format!(
                "RGB writer needs 3 channels, got {}",
                channels
            ))
            .into());
        }
        let planes = channel_planes(image);
        let mut ds = write_tiff_rgb_u16(path, cols, rows, [&planes[0], &planes[1], &planes[2]])?;
        embed_geo_metadata(&mut ds, geotransform, projection, tags)?;
        info!("Wrote {}x{} RGB u16 GeoTIFF to {:?}", cols, rows, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsg_is_extracted_from_wkt() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]],AUTHORITY["EPSG","32633"]]"#;
        assert_eq!(parse_epsg(wkt).as_deref(), Some("EPSG:32633"));
        assert_eq!(parse_epsg("LOCAL_CS[\"x\"]"), None);
        assert_eq!(parse_epsg("EPSG:4326").as_deref(), Some("EPSG:4326"));
    }

    #[test]
    fn crs_label_prefers_epsg_but_keeps_wkt() {
        let wkt = r#"PROJCS["custom",GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]],AUTHORITY["EPSG","32633"]]"#;
        let mut meta = GeoMetadata {
            size_x: 1,
            size_y: 1,
            bands: 1,
            geotransform: [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            projection: wkt.to_string(),
            epsg: parse_epsg(wkt),
            metadata: HashMap::new(),
        };
        assert_eq!(meta.crs_label(), "EPSG:32633");
        assert_eq!(meta.projection, wkt);
        meta.epsg = None;
        assert_eq!(meta.crs_label(), wkt);
    }

    #[test]
    fn plane_maps_no_data_to_nan() {
        let samples = vec![1.0, -9999.0, 3.0, 4.0, 5.0, 6.0];
        let plane = plane_from_samples(samples, (3, 2), (3, 2), Some(-9999.0)).unwrap();
        assert_eq!(plane.dim(), (2, 3));
        assert!(plane[[0, 1]].is_nan());
        assert_eq!(plane[[1, 2]], 6.0);
    }

    #[test]
    fn short_buffer_reports_actual_size() {
        let err = plane_from_samples(vec![0.0; 4], (3, 2), (2, 2), None).unwrap_err();
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3x2, got 2x2");
        let err = plane_from_samples(vec![0.0; 5], (3, 2), (3, 2), None).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported format: band buffer holds 5 samples, expected 6");
    }
}
