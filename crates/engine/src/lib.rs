//! GPU-bound engine orchestration (§4.1, §4.2, §4.6): a single-slot serial
//! worker, a narrow contract over the external engine library, and the
//! orchestrator that sequences loads, warmup, reset, and recovery on it.

mod adapter;
mod gpu_worker;
mod jpeg;
mod orchestrator;
mod seed_prep;

pub use adapter::{ConstructOverrides, Ctrl, DType, Device, EngineError, EngineFactory, EngineHandle, FrameTensor};
pub use gpu_worker::GpuWorker;
pub use jpeg::encode_jpeg;
pub use orchestrator::EngineOrchestrator;
pub use seed_prep::{load_seed_frame, prepare_seed_frame};
