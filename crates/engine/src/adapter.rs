//! Narrow, capability-style contract over the external engine library
//! (§4.2). The model itself and its GPU kernels are out of scope; this
//! module only defines the operations the orchestrator drives through the
//! [`crate::gpu_worker::GpuWorker`].

use std::collections::HashSet;
use thiserror::Error;
use wg_core::{constants, Button};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Accelerator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    BFloat16,
    Float16,
}

/// Per-construction overrides (§4.2 `construct`).
#[derive(Debug, Clone)]
pub struct ConstructOverrides {
    pub n_frames: u32,
    pub ae_uri: Option<String>,
    pub scheduler_sigmas: Option<Vec<f64>>,
}

impl Default for ConstructOverrides {
    fn default() -> Self {
        Self { n_frames: constants::N_FRAMES, ae_uri: None, scheduler_sigmas: None }
    }
}

/// A logical H x W x 3, 8-bit frame at the engine's native I/O resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTensor {
    pub height: u32,
    pub width: u32,
    pub rgb8: Vec<u8>,
}

/// Control state handed to `gen_frame` (§4.2).
pub struct Ctrl<'a> {
    pub buttons: &'a HashSet<Button>,
    pub mouse_dx: f64,
    pub mouse_dy: f64,
}

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("out of memory constructing engine: {message}")]
    OutOfMemory { message: String },

    #[error("engine runtime failure: {message}")]
    Runtime { message: String },
}

impl EngineError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime { message: message.into() }
    }

    /// Whether this failure matches the accelerator-graph-corruption
    /// heuristic recovery is built around (§4.6): the message mentions
    /// cuda, cublas, graph capture, or an offset increment.
    pub fn looks_like_accelerator_fault(&self) -> bool {
        let message = match self {
            Self::Runtime { message } => message,
            Self::OutOfMemory { .. } => return false,
        };
        let lower = message.to_ascii_lowercase();
        ["cuda", "cublas", "graph capture", "offset increment"]
            .iter()
            .any(|needle| lower.contains(needle))
    }
}

/// A constructed engine instance. Every method runs exclusively on the GPU
/// worker thread; implementations need not be internally synchronized.
pub trait EngineHandle: Send {
    fn reset(&mut self) -> Result<(), EngineError>;
    fn append_frame(&mut self, frame: &FrameTensor) -> Result<(), EngineError>;
    fn set_prompt(&mut self, text: &str) -> Result<(), EngineError>;
    fn gen_frame(&mut self, ctrl: Ctrl<'_>) -> Result<FrameTensor, EngineError>;
}

/// Constructs engine handles (§4.2 `construct`). Implemented outside this
/// crate and handed to the orchestrator at startup.
pub trait EngineFactory: Send + Sync {
    fn construct(
        &self,
        model_uri: &str,
        device: Device,
        overrides: &ConstructOverrides,
        quant: Option<&str>,
        dtype: DType,
    ) -> Result<Box<dyn EngineHandle>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_heuristic_matches_named_substrings() {
        for needle in ["CUDA error", "cuBLAS failure", "graph capture failed", "offset increment overflow"] {
            let err = EngineError::runtime(needle);
            assert!(err.looks_like_accelerator_fault(), "expected match for {needle}");
        }
        assert!(!EngineError::runtime("disk full").looks_like_accelerator_fault());
        assert!(!EngineError::OutOfMemory { message: "cuda oom".into() }.looks_like_accelerator_fault());
    }
}
