// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime backend: session construction, execution provider
// selection, dtype adaptation and model metadata extraction.

use anyhow::{anyhow, Result};
use half::f16;
use ndarray::{Array, IxDyn};
use once_cell::sync::Lazy;
use ort::execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, Value, ValueType};
use regex::Regex;

static NAMES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(['"])([-()\w ]+)\1"#).expect("names regex"));

/// Execution provider choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(u32),
    Trt(u32),
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub model_path: String,
    pub ep: OrtEP,
}

/// Thin wrapper over an `ort` session for YOLO-style models.
pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    dtype: TensorElementType,
    output_names: Vec<String>,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        if !std::path::Path::new(&config.model_path).is_file() {
            return Err(anyhow!("model file not found: {}", config.model_path));
        }

        let mut builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        match config.ep {
            OrtEP::CUDA(id) => {
                builder = builder.with_execution_providers([CUDAExecutionProvider::default()
                    .with_device_id(id as i32)
                    .build()])?;
            }
            OrtEP::Trt(id) => {
                builder = builder.with_execution_providers([TensorRTExecutionProvider::default()
                    .with_device_id(id as i32)
                    .build()])?;
            }
            OrtEP::CPU => {}
        }
        let session = builder.commit_from_file(&config.model_path)?;

        let dtype = match &session.inputs[0].input_type {
            ValueType::Tensor { ty, .. } => *ty,
            other => return Err(anyhow!("unsupported model input: {other:?}")),
        };
        match dtype {
            TensorElementType::Float32 | TensorElementType::Float16 => {}
            other => return Err(anyhow!("unsupported input dtype: {other:?}")),
        }

        let output_names = session.outputs.iter().map(|o| o.name.clone()).collect();

        Ok(Self {
            session,
            ep: config.ep,
            dtype,
            output_names,
        })
    }

    /// Forward pass. Input is a NCHW f32 tensor; fp16 models get their
    /// input converted on the way in and output converted on the way out.
    pub fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = std::time::Instant::now();
        let shape: Vec<usize> = xs.shape().to_vec();
        let (data, _) = xs.into_raw_vec_and_offset();

        let input: Value = match self.dtype {
            TensorElementType::Float16 => {
                let halves: Vec<f16> = data.into_iter().map(f16::from_f32).collect();
                Tensor::from_array((shape, halves.into_boxed_slice())).map(Value::from)?
            }
            _ => Tensor::from_array((shape, data.into_boxed_slice())).map(Value::from)?,
        };

        let outputs = self.session.run(ort::inputs![input])?;

        let names = self.output_names.clone();
        let mut ys = Vec::with_capacity(names.len());
        for name in &names {
            let output = outputs
                .get(name.as_str())
                .ok_or_else(|| anyhow!("missing model output: {name}"))?;
            let array = if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
                Array::from_shape_vec(IxDyn(&dims), data.to_vec())?
            } else {
                let (shape, data) = output.try_extract_tensor::<f16>()?;
                let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
                Array::from_shape_vec(IxDyn(&dims), data.iter().map(|v| v.to_f32()).collect())?
            };
            ys.push(array);
        }

        if profile {
            println!("[Ort Run]: {:?}", t.elapsed());
        }
        Ok(ys)
    }

    fn fetch_from_metadata(&self, key: &str) -> Option<String> {
        self.session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom(key).ok().flatten())
    }

    /// Class names embedded by the ultralytics exporter, e.g.
    /// `{0: 'Billing_Enabled', 1: 'Service_NotEnabled'}`.
    pub fn names(&self) -> Option<Vec<String>> {
        let raw = self.fetch_from_metadata("names")?;
        let names: Vec<String> = NAMES_RE
            .captures_iter(&raw)
            .map(|cap| cap[2].to_string())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    pub fn nc(&self) -> Option<u32> {
        self.names().map(|n| n.len() as u32)
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn dtype(&self) -> TensorElementType {
        self.dtype
    }

    pub fn author(&self) -> Option<String> {
        self.session
            .metadata()
            .ok()
            .and_then(|meta| meta.producer().ok().map(|s| s.to_string()))
    }

    pub fn version(&self) -> Option<String> {
        self.fetch_from_metadata("version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_regex_parses_exporter_dict() {
        let raw = "{0: 'Billing_Enabled', 1: 'Service_NotEnabled', 2: \"Billing_NotEnabled\"}";
        let names: Vec<String> = NAMES_RE
            .captures_iter(raw)
            .map(|cap| cap[2].to_string())
            .collect();
        assert_eq!(
            names,
            vec!["Billing_Enabled", "Service_NotEnabled", "Billing_NotEnabled"]
        );
    }
}
