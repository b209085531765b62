use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::PreprocessMode;

/// Tiling parameters for one super-resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Low-resolution tile edge in pixels; image sides must be multiples of it
    pub tile_size: usize,
    /// Reflected border added on every side before inference
    pub pad: usize,
    pub mode: PreprocessMode,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            pad: 4,
            mode: PreprocessMode::ZeroOne,
        }
    }
}

impl TilingConfig {
    /// Edge of a padded input tile.
    pub fn padded_size(&self) -> usize {
        self.tile_size + 2 * self.pad
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::InvalidArgument {
                arg: "tile_size",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings shared by every request handled by one process, suitable for config files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Band indices normalized with min-max instead of the range heuristic (radar backscatter)
    pub ratio_bands: Vec<usize>,
    /// Output file stem prefix, `{prefix}_{input stem}.tif`
    pub output_prefix_name: String,
    /// Model key used instead of the request's model when `use_unet` is set
    pub unet_model_key: String,
    pub tiling: TilingConfig,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            ratio_bands: vec![5, 6],
            output_prefix_name: "super_resolution".to_string(),
            unet_model_key: "unet_model.onnx".to_string(),
            tiling: TilingConfig::default(),
        }
    }
}

impl RequestConfig {
    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::InvalidArgument {
            arg: "config",
            value: format!("{}: {}", path.display(), e),
        })
    }
}
