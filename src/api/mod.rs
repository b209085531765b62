//! High-level library API: super-resolve a raster file to a GeoTIFF, or serve
//! a full request (fetch input and model from an object store, process, upload).
//! Prefer these entrypoints over the low-level processing modules when
//! integrating GEOSR.
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use tracing::{error, info};

use crate::core::georef::{is_identity_geotransform, upscale_geotransform};
use crate::core::params::{RequestConfig, TilingConfig};
use crate::core::processing::composite::{build_composite, quantize_u16};
use crate::core::processing::engine::{SuperResolver, run_tiled_super_resolution};
use crate::error::{Error, Result};
use crate::io::onnx::ModelLoader;
use crate::io::storage::ObjectStore;
use crate::io::writers::metadata::product_tags;
use crate::io::writers::worldfile::{write_prj_file, write_world_file};
use crate::io::{GeoMetadata, RasterCodec};

pub mod request;
pub use request::{ResponseBody, SuccessBody, SuperResRequest, SuperResResponse};

/// What was written for one super-resolved raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSummary {
    pub scale: usize,
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    /// Source projection, written to the output unchanged
    pub projection: String,
    pub epsg: Option<String>,
}

/// Output tags: the source's default-domain metadata, then the product tags.
/// Source items sharing a key with a product tag are dropped.
pub fn output_tags(
    metadata: &GeoMetadata,
    product: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut tags: Vec<(String, String)> = metadata
        .metadata
        .iter()
        .filter(|(key, _)| !product.iter().any(|(k, _)| k == *key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    tags.sort();
    tags.extend(product);
    tags
}

/// Read `input` and build its normalized RGB composite.
pub fn load_composite(
    codec: &dyn RasterCodec,
    input: &Path,
    band_indices: &[usize],
    ratio_bands: &[usize],
) -> Result<(Array3<f32>, GeoMetadata)> {
    let (stack, metadata) = codec.read(input)?;
    let composite = build_composite(&stack, band_indices, ratio_bands)?;
    Ok((composite, metadata))
}

/// Super-resolve a composite and write it as a georeferenced u16 RGB raster.
pub fn write_super_resolved(
    codec: &dyn RasterCodec,
    composite: &Array3<f32>,
    metadata: &GeoMetadata,
    model: &mut dyn SuperResolver,
    tiling: &TilingConfig,
    output: &Path,
    source: &str,
) -> Result<RasterSummary> {
    let result = run_tiled_super_resolution(&composite.view(), model, tiling)?;
    info!("Super-resolution applied with scale factor: {}", result.scale);

    let image = quantize_u16(&result.mosaic.view());
    let (height, width, _) = image.dim();
    let geotransform = if is_identity_geotransform(&metadata.geotransform) {
        metadata.geotransform
    } else {
        upscale_geotransform(metadata.geotransform, result.scale)
    };
    let tags = output_tags(
        metadata,
        product_tags(source, result.scale, &tiling.mode.to_string()),
    );
    codec.write_rgb_u16(
        output,
        &image.view(),
        geotransform,
        &metadata.projection,
        &tags,
    )?;

    Ok(RasterSummary {
        scale: result.scale,
        width,
        height,
        geotransform,
        projection: metadata.projection.clone(),
        epsg: metadata.epsg.clone(),
    })
}

/// Process a local raster with an already loaded model.
pub fn process_raster_to_path(
    codec: &dyn RasterCodec,
    input: &Path,
    output: &Path,
    model: &mut dyn SuperResolver,
    band_indices: &[usize],
    config: &RequestConfig,
) -> Result<RasterSummary> {
    let (composite, metadata) = load_composite(codec, input, band_indices, &config.ratio_bands)?;
    write_super_resolved(
        codec,
        &composite,
        &metadata,
        model,
        &config.tiling,
        output,
        &input.display().to_string(),
    )
}

/// Write `.tfw`/`.prj` sidecars for a produced raster. The `.prj` holds the
/// EPSG code when known, the projection otherwise. Returns the files written.
pub fn write_georef_sidecars(output: &Path, summary: &RasterSummary) -> Result<Vec<PathBuf>> {
    if is_identity_geotransform(&summary.geotransform) {
        return Ok(Vec::new());
    }
    let mut written = vec![write_world_file(output, summary.geotransform)?];
    let crs = summary.epsg.as_deref().unwrap_or(&summary.projection);
    if !crs.is_empty() {
        written.push(write_prj_file(output, crs)?);
    }
    Ok(written)
}

/// Serve one request end to end. Never fails: errors become 400/500 responses.
pub fn handle_request(
    request_json: &str,
    store: &dyn ObjectStore,
    codec: &dyn RasterCodec,
    loader: &dyn ModelLoader,
    config: &RequestConfig,
) -> SuperResResponse {
    match serve_request(request_json, store, codec, loader, config) {
        Ok(body) => SuperResResponse::success(body),
        Err(e) => {
            error!("Request failed ({:?}): {}", e.class(), e);
            SuperResResponse::from_error(&e)
        }
    }
}

fn serve_request(
    request_json: &str,
    store: &dyn ObjectStore,
    codec: &dyn RasterCodec,
    loader: &dyn ModelLoader,
    config: &RequestConfig,
) -> Result<SuccessBody> {
    let request = SuperResRequest::from_json(request_json)?;
    let input_location = store.location(&request.bucket, &request.key);
    info!("Processing image from {}", input_location);
    info!(
        "Output bucket: {}, prefix: {:?}",
        request.output_bucket, request.output_key_prefix
    );

    // Scratch space for the downloaded input and the output before upload.
    let workdir = tempfile::tempdir()?;
    let input_name = Path::new(&request.key)
        .file_name()
        .ok_or_else(|| Error::InvalidRequest(format!("key {:?} has no file name", request.key)))?;
    let input_path = workdir.path().join(input_name);
    fs::write(&input_path, store.get(&request.bucket, &request.key)?)?;

    let (composite, metadata) = load_composite(
        codec,
        &input_path,
        &request.band_indices,
        &config.ratio_bands,
    )?;
    fs::remove_file(&input_path)?;

    let model_key = request.model_key(config);
    info!("Loading model {} ({:?})", model_key, request.variant());
    let model_bytes = store.get(&request.model_bucket, model_key)?;
    let mut model = loader.load(&model_bytes)?;

    let output_path = workdir.path().join(request.output_file_name(config));
    let summary = write_super_resolved(
        codec,
        &composite,
        &metadata,
        model.as_mut(),
        &config.tiling,
        &output_path,
        &input_location,
    )?;

    let output_key = request.output_key(config);
    let output_location = store.location(&request.output_bucket, &output_key);
    info!("Uploading to {}", output_location);
    store.put(&request.output_bucket, &output_key, &fs::read(&output_path)?)?;

    Ok(SuccessBody {
        message: "Super-resolution applied successfully".to_string(),
        input_location,
        output_location,
        scale_factor: summary.scale as f64,
    })
}
