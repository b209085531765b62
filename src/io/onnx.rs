//! ONNX Runtime adapter for the [`SuperResolver`] seam.
//!
//! The runtime library is loaded dynamically (`ORT_DYLIB_PATH`), so nothing
//! here is touched unless a model is actually loaded.
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info};

use crate::core::processing::engine::SuperResolver;
use crate::core::processing::tensor::NchwTensor;
use crate::error::{Error, Result};

/// Turns serialized model bytes into a ready-to-run resolver.
pub trait ModelLoader {
    fn load(&self, model: &[u8]) -> Result<Box<dyn SuperResolver>>;
}

/// Single-input, single-output super-resolution session.
pub struct OnnxSuperResolver {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxSuperResolver {
    pub fn from_memory(model: &[u8]) -> Result<Self> {
        let session = Session::builder()
            .map_err(Error::inference)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(Error::inference)?
            .commit_from_memory(model)
            .map_err(Error::inference)?;
        Self::from_session(session)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_memory(&bytes)
    }

    fn from_session(session: Session) -> Result<Self> {
        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| Error::InferenceOutput("model declares no inputs".into()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| Error::InferenceOutput("model declares no outputs".into()))?;
        info!(
            "Loaded super-resolution model: input={}, output={}",
            input_name, output_name
        );
        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }
}

impl SuperResolver for OnnxSuperResolver {
    fn infer(&mut self, input: &NchwTensor) -> Result<NchwTensor> {
        let tensor = Tensor::from_array((input.shape(), input.data().to_vec()))
            .map_err(Error::inference)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => &tensor])
            .map_err(Error::inference)?;
        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(Error::inference)?;

        let dims: Vec<usize> = shape
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| Error::InferenceOutput(format!("negative dimension in {:?}", shape)))?;
        let shape: [usize; 4] = dims
            .as_slice()
            .try_into()
            .map_err(|_| Error::InferenceOutput(format!("expected NCHW output, got {:?}", dims)))?;
        debug!("Inference {:?} -> {:?}", input.shape(), shape);
        NchwTensor::new(shape, data.to_vec())
    }
}

/// [`ModelLoader`] backed by ONNX Runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxLoader;

impl ModelLoader for OnnxLoader {
    fn load(&self, model: &[u8]) -> Result<Box<dyn SuperResolver>> {
        Ok(Box::new(OnnxSuperResolver::from_memory(model)?))
    }
}
