use chrono::Utc;
use gdal::Dataset;
use gdal::Metadata;
use tracing::{debug, warn};

use crate::core::georef::is_identity_geotransform;
use crate::io::gdal::GdalError;

pub const TAG_SCALE_FACTOR: &str = "GEOSR_SCALE_FACTOR";
pub const TAG_SOURCE: &str = "GEOSR_SOURCE";
pub const TAG_PROCESSED_AT: &str = "GEOSR_PROCESSED_AT";
pub const TAG_PREPROCESS_MODE: &str = "GEOSR_PREPROCESS_MODE";

/// Default tag set describing a super-resolved product.
pub fn product_tags(source: &str, scale: usize, mode: &str) -> Vec<(String, String)> {
    vec![
        (TAG_SOURCE.to_string(), source.to_string()),
        (TAG_SCALE_FACTOR.to_string(), scale.to_string()),
        (TAG_PREPROCESS_MODE.to_string(), mode.to_string()),
        (
            TAG_PROCESSED_AT.to_string(),
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        ),
    ]
}

/// Attach geotransform, projection and key/value tags to an open dataset.
pub fn embed_geo_metadata(
    ds: &mut Dataset,
    geotransform: [f64; 6],
    projection: &str,
    tags: &[(String, String)],
) -> Result<(), GdalError> {
    // Only set projection if we also set a non-identity geotransform
    if is_identity_geotransform(&geotransform) {
        warn!("Source raster has no georeferencing; output will not be georeferenced");
    } else {
        ds.set_geo_transform(&geotransform)?;
        if !projection.is_empty() {
            ds.set_projection(projection)?;
        }
    }

    for (key, value) in tags {
        ds.set_metadata_item(key, value, "")?;
    }
    debug!("Embedded geotransform {:?} and {} tags", geotransform, tags.len());
    Ok(())
}
