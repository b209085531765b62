//! Output writers: GeoTIFF via GDAL, embedded georeferencing/tags, and
//! world-file/.prj sidecars.
pub mod metadata;
pub mod tiff;
pub mod worldfile;
