use gdal::Dataset;
use gdal::DriverManager;
use gdal::raster::{Buffer, ColorInterpretation};
use std::path::Path;

use crate::io::gdal::GdalError;

/// Create a 3-band u16 GeoTIFF from row-major R, G and B planes of `cols * rows` samples.
/// The returned dataset is still open so georeferencing can be attached before it closes.
pub fn write_tiff_rgb_u16(
    output: &Path,
    cols: usize,
    rows: usize,
    planes: [&[u16]; 3],
) -> Result<Dataset, GdalError> {
    for plane in planes {
        if plane.len() != cols * rows {
            return Err(GdalError::DimensionMismatch(cols, rows, plane.len(), 1));
        }
    }

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let ds = driver.create_with_band_type::<u16, _>(output, cols, rows, 3)?;

    let colors = [
        ColorInterpretation::RedBand,
        ColorInterpretation::GreenBand,
        ColorInterpretation::BlueBand,
    ];
    for (i, (plane, color)) in planes.iter().zip(colors).enumerate() {
        let mut band = ds.rasterband(i + 1)?;
        band.set_color_interpretation(color)?;
        let mut buf = Buffer::new((cols, rows), plane.to_vec());
        band.write((0, 0), (cols, rows), &mut buf)?;
    }

    Ok(ds)
}
