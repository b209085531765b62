#![doc = r#"
GEOSR — tiled super-resolution for multi-band georeferenced rasters.

This crate turns a multi-band raster (e.g. a Sentinel-2 stack with Sentinel-1
backscatter bands) into an upscaled RGB GeoTIFF: bands are normalized to [0,1],
three of them are stacked into a composite, the composite is cut into tiles,
each tile is reflect-padded and run through a super-resolution model, and the
cropped outputs are stitched back into a seamless mosaic whose geotransform is
rescaled by the detected upscaling factor. It powers the GEOSR CLI and can be
embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- An ONNX Runtime shared library (`ORT_DYLIB_PATH`) to run ONNX models.
- Rust 2024 edition toolchain.

Quick start: super-resolve a local raster
-----------------------------------------
```rust,no_run
use std::path::Path;
use geosr::api::process_raster_to_path;
use geosr::io::{GdalCodec, OnnxSuperResolver};
use geosr::RequestConfig;

fn main() -> geosr::Result<()> {
    let mut model = OnnxSuperResolver::from_file(Path::new("/models/sr_x4.onnx"))?;
    let summary = process_raster_to_path(
        &GdalCodec,
        Path::new("/data/scene.tif"),
        Path::new("/out/super_resolution_scene.tif"),
        &mut model,
        &[3, 2, 1],
        &RequestConfig::default(),
    )?;
    println!("scale={} size={}x{}", summary.scale, summary.width, summary.height);
    Ok(())
}
```

Bring your own model
--------------------
Anything implementing [`SuperResolver`] can drive the tiled engine, including
plain closures:

```rust
use ndarray::Array3;
use geosr::{run_tiled_super_resolution, NchwTensor, TilingConfig};

let composite = Array3::<f32>::from_elem((64, 64, 3), 0.5);
let mut identity = |t: &NchwTensor| -> geosr::Result<NchwTensor> { Ok(t.clone()) };
let out = run_tiled_super_resolution(&composite.view(), &mut identity, &TilingConfig::default())?;
assert_eq!(out.scale, 1);
assert_eq!(out.mosaic.dim(), (64, 64, 3));
# Ok::<(), geosr::Error>(())
```

Serving requests
----------------
[`api::handle_request`] implements the JSON invocation contract over any
[`io::ObjectStore`]; it never returns an error, reporting failures as 400
(bad request) or 500 (processing failure) responses instead.

Error handling
--------------
All fallible functions return `geosr::Result<T>`; `Error::class()` tells a
bad request apart from a processing failure.

Useful modules
--------------
- [`api`] — high-level entry points and the request/response types.
- [`core`] — normalization, tiling, padding, tensor conversion, the tiled engine, georeferencing.
- [`io`] — GDAL raster codec, object storage, ONNX Runtime adapter, writers.
- [`types`] — `PreprocessMode`, `ModelVariant`.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::params::{RequestConfig, TilingConfig};
pub use error::{Error, ErrorClass, Result};
pub use types::{ModelVariant, PreprocessMode};

// Engine
pub use core::processing::engine::{SuperResolved, SuperResolver, run_tiled_super_resolution};
pub use core::processing::tensor::NchwTensor;
pub use core::processing::tiling::TileGrid;

// High-level API re-exports
pub use api::{
    RasterSummary, SuperResRequest, SuperResResponse, handle_request, process_raster_to_path,
};
