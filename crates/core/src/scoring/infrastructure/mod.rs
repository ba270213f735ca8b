pub mod cached_liveness_scorer;
pub mod onnx_liveness_scorer;
