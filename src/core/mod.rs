//! Core processing building blocks: band normalization, tiling, padding,
//! tensor conversion, the tiled inference engine and georeference rescaling.
//! These are internal primitives consumed by the high-level `api` module.
pub mod georef;
pub mod params;
pub mod processing;
