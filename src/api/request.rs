//! Invocation contract: the JSON request naming input, model and output
//! objects, and the status-coded response.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::core::params::RequestConfig;
use crate::error::{Error, ErrorClass, Result};
use crate::types::ModelVariant;

/// Fields every request must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["bucket", "key", "model_bucket", "sr_model_key", "output_bucket"];

fn default_band_indices() -> Vec<usize> {
    vec![0, 1, 2]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperResRequest {
    /// Bucket holding the input raster
    pub bucket: String,
    /// Key of the input raster
    pub key: String,
    pub model_bucket: String,
    pub sr_model_key: String,
    pub output_bucket: String,
    #[serde(default)]
    pub output_key_prefix: String,
    /// Run the fixed U-Net artifact instead of `sr_model_key`
    #[serde(default)]
    pub use_unet: bool,
    /// Bands forming the R, G and B channels of the composite
    #[serde(default = "default_band_indices")]
    pub band_indices: Vec<usize>,
}

impl SuperResRequest {
    /// Parse a request, reporting the first absent required field by name.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let Some(object) = value.as_object() else {
            return Err(Error::InvalidRequest("request must be a JSON object".into()));
        };
        if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
            return Err(Error::MissingArgument {
                arg: field.to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidRequest(e.to_string()))
    }

    pub fn variant(&self) -> ModelVariant {
        ModelVariant::from_flag(self.use_unet)
    }

    /// Key of the model artifact in `model_bucket`.
    pub fn model_key<'a>(&'a self, config: &'a RequestConfig) -> &'a str {
        match self.variant() {
            ModelVariant::Unet => &config.unet_model_key,
            ModelVariant::SuperResolution => &self.sr_model_key,
        }
    }

    /// `{prefix_name}_{input stem}.tif`
    pub fn output_file_name(&self, config: &RequestConfig) -> String {
        let stem = Path::new(&self.key)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        format!("{}_{}.tif", config.output_prefix_name, stem)
    }

    /// Output key, joined under `output_key_prefix` when one is given.
    pub fn output_key(&self, config: &RequestConfig) -> String {
        let file_name = self.output_file_name(config);
        match self.output_key_prefix.as_str() {
            "" => file_name,
            prefix if prefix.ends_with('/') => format!("{}{}", prefix, file_name),
            prefix => format!("{}/{}", prefix, file_name),
        }
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessBody {
    pub message: String,
    pub input_location: String,
    pub output_location: String,
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(SuccessBody),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperResResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

impl SuperResResponse {
    pub fn success(body: SuccessBody) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Success(body),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let class = err.class();
        let message = match (class, err) {
            (ErrorClass::BadRequest, Error::MissingArgument { arg }) => format!(
                "Error: Missing key in request: '{}'. Request must contain {}.",
                arg,
                REQUIRED_FIELDS
                    .iter()
                    .map(|f| format!("\"{}\"", f))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            (ErrorClass::BadRequest, _) => format!("Error: {}", err),
            (ErrorClass::ProcessingFailure, _) => format!("Error processing image: {}", err),
        };
        Self {
            status_code: class.status_code(),
            body: ResponseBody::Error(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
