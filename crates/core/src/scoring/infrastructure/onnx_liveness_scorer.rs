//! Multi-scale anti-spoofing classifier using ONNX Runtime via `ort`.
//!
//! Each model sees the face box expanded by its own scale factor so that
//! one looks at the face and another at the surrounding context (screen
//! bezels, paper edges). The real-face probability is the mean across
//! models.

use std::path::Path;

use crate::scoring::domain::liveness_scorer::LivenessScorer;
use crate::shared::constants::CNN_INPUT_SIZE;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Index of the "real face" class in the classifier output.
const REAL_CLASS: usize = 1;

struct ScaledModel {
    session: ort::session::Session,
    scale: f64,
    input_size: usize,
}

pub struct OnnxLivenessScorer {
    models: Vec<ScaledModel>,
}

impl OnnxLivenessScorer {
    /// Load one model per `(path, scale)` pair.
    ///
    /// The input resolution is read from each model's NCHW input shape and
    /// falls back to 80x80 when the shape is dynamic.
    pub fn new(models: &[(&Path, f64)]) -> Result<Self, Box<dyn std::error::Error>> {
        if models.is_empty() {
            return Err("at least one liveness model is required".into());
        }
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let mut loaded = Vec::with_capacity(models.len());
        for &(path, scale) in models {
            let session = ort::session::Session::builder()?
                .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
                .with_intra_threads(intra_threads)?
                .commit_from_file(path)?;

            let input_size = session
                .inputs()
                .first()
                .and_then(|input| {
                    if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                        if shape.len() >= 4 && shape[2] > 0 {
                            Some(shape[2] as usize)
                        } else {
                            None
                        }
                    } else {
                        None
                    }
                })
                .unwrap_or(CNN_INPUT_SIZE);

            log::info!(
                "Loaded liveness model {} (scale {scale}, input {input_size}x{input_size})",
                path.display()
            );
            loaded.push(ScaledModel {
                session,
                scale,
                input_size,
            });
        }
        Ok(Self { models: loaded })
    }
}

impl LivenessScorer for OnnxLivenessScorer {
    fn score(
        &mut self,
        frame: &Frame,
        face_box: &FaceBox,
    ) -> Result<f64, Box<dyn std::error::Error>> {
        if !frame.is_well_formed() || frame.channels() != 3 {
            return Err(format!(
                "frame {} is not a packed RGB buffer ({} channels)",
                frame.index(),
                frame.channels()
            )
            .into());
        }
        let mut total = 0.0;
        for model in &mut self.models {
            let region = face_box
                .scaled(model.scale)
                .clamp_to(frame.width(), frame.height());
            if region.area() == 0 {
                return Err(format!("face box {face_box:?} does not overlap the frame").into());
            }

            let tensor = preprocess(frame, &region, model.input_size);
            let input_value = ort::value::Tensor::from_array(tensor)?;
            let outputs = model.session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("liveness model produced no outputs".into());
            }
            let logits = outputs[0].try_extract_array::<f32>()?;
            let logits = logits.as_slice().ok_or("Cannot get logits slice")?;
            let probs = softmax(logits);
            total += *probs
                .get(REAL_CLASS)
                .ok_or("liveness model output has too few classes")? as f64;
        }
        Ok(total / self.models.len() as f64)
    }
}

/// Nearest-neighbor resize of `region` to `size` x `size`, NCHW in BGR
/// channel order with raw 0-255 values.
fn preprocess(frame: &Frame, region: &FaceBox, size: usize) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray(); // [H, W, C] u8
    let rx = region.x as usize;
    let ry = region.y as usize;
    let rw = region.width as usize;
    let rh = region.height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        let src_y = ry + (((y as f64 + 0.5) * rh as f64 / size as f64) as usize).min(rh - 1);
        for x in 0..size {
            let src_x = rx + (((x as f64 + 0.5) * rw as f64 / size as f64) as usize).min(rw - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, 2 - c]] as f32;
            }
        }
    }
    tensor
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}
