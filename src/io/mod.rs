//! I/O layer: GDAL-backed raster reading/writing, object storage, and the
//! ONNX Runtime model adapter. Everything here sits behind the narrow traits
//! (`RasterCodec`, `ObjectStore`, `SuperResolver`) the core pipeline consumes.
pub mod gdal;
pub use gdal::{GdalCodec, GdalError, GdalRasterReader, GeoMetadata, RasterCodec};

pub mod onnx;
pub use onnx::{ModelLoader, OnnxLoader, OnnxSuperResolver};

pub mod storage;
pub use storage::{LocalStore, ObjectStore, StorageError};

pub mod writers;
