//! # Safety Classifier
//!
//! A narrow contract over the external NSFW classifier (§4.3). The model
//! weights and preprocessing pipeline are out of scope; this crate defines
//! the [`ClassifierBackend`] seam an implementer plugs a real model into,
//! plus the resource-discipline and failure-semantics logic that must hold
//! regardless of which backend is wired in.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use wg_core::ClassScores;

/// Which device a backend's model executes on. Determines the unload path
/// the resource-discipline rule requires (§4.3): an accelerator-resident
/// model must move weights to host memory before the handle is dropped; a
/// CPU-resident model must not trigger a global device-cache flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Accelerator,
}

/// A single decoded image, opaque to this crate beyond its dimensions.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb8: Vec<u8>,
}

/// Errors surfaced by a backend or by the classifier wrapper itself.
#[derive(Error, Debug, Clone)]
pub enum SafetyError {
    #[error("failed to decode image {path}: {message}")]
    Decode { path: String, message: String },

    #[error("classifier backend crashed: {message}")]
    BackendCrash { message: String },
}

/// A one-shot loaded model handle, valid for exactly one `check_one` or
/// `check_batch` call. Dropping it releases device memory.
pub trait LoadedClassifier: Send {
    fn infer(&self, image: &DecodedImage) -> ClassScores;

    /// Moves weights to host memory ahead of drop. Only meaningful for
    /// accelerator-resident backends; CPU backends must leave this a no-op
    /// rather than issue a global device-cache flush (§4.3).
    fn move_to_host(&mut self) {}
}

/// Capability-style contract over the external classifier library. An
/// implementer constructs this once per process and hands `Arc<dyn
/// ClassifierBackend>` to [`SafetyClassifier::new`].
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    fn device(&self) -> Device;

    /// Loads model weights on demand. Called at the start of every
    /// `check_one`/`check_batch` and never cached across requests (§4.3).
    async fn load(&self) -> Result<Box<dyn LoadedClassifier>, SafetyError>;

    /// Decodes a file on disk into the fixed pixel representation the
    /// model consumes. Decode failures are per-image, not backend crashes.
    async fn decode(&self, path: &Path) -> Result<DecodedImage, SafetyError>;
}

/// A single classifier verdict: boolean pass/fail plus the full score
/// profile it was derived from (§3, glossary "Verdict").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub is_safe: bool,
    pub scores: ClassScores,
}

impl Verdict {
    fn from_scores(scores: ClassScores) -> Self {
        Self { is_safe: scores.is_safe(), scores }
    }

    fn unreadable() -> Self {
        Self::from_scores(ClassScores::unreadable())
    }
}

/// The resource-disciplined wrapper around a [`ClassifierBackend`].
pub struct SafetyClassifier {
    backend: Arc<dyn ClassifierBackend>,
}

impl SafetyClassifier {
    pub fn new(backend: Arc<dyn ClassifierBackend>) -> Self {
        Self { backend }
    }

    /// Classifies a single image, loading and releasing the model around
    /// the call (§4.3).
    pub async fn check_one(&self, path: &Path) -> Result<Verdict, SafetyError> {
        let decoded = match self.backend.decode(path).await {
            Ok(image) => image,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "seed image failed to decode; marking unsafe");
                return Ok(Verdict::unreadable());
            }
        };

        let mut model = self.backend.load().await?;
        let verdict = Verdict::from_scores(model.infer(&decoded));
        self.release(model);
        Ok(verdict)
    }

    /// Classifies a batch of images as a single loaded-model session.
    /// `batch_size` bounds how many images are handed to `infer` between
    /// progress checkpoints; it does not change the load/unload cadence,
    /// which happens exactly once per call regardless of batch size (§4.3).
    ///
    /// Per-image decode failures mark that image unsafe and the batch
    /// continues; a backend crash fails the whole batch (§4.3).
    pub async fn check_batch(
        &self,
        paths: &[std::path::PathBuf],
        batch_size: usize,
    ) -> Result<Vec<Verdict>, SafetyError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let batch_size = batch_size.max(1);

        let mut decoded = Vec::with_capacity(paths.len());
        for path in paths {
            match self.backend.decode(path).await {
                Ok(image) => decoded.push(Some(image)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "seed image failed to decode; marking unsafe");
                    decoded.push(None);
                }
            }
        }

        let mut model = self.backend.load().await.map_err(|err| {
            warn!(error = %err, "classifier backend failed to load for batch");
            err
        })?;

        let mut verdicts = Vec::with_capacity(paths.len());
        for chunk in decoded.chunks(batch_size) {
            for image in chunk {
                let verdict = match image {
                    Some(image) => Verdict::from_scores(model.infer(image)),
                    None => Verdict::unreadable(),
                };
                verdicts.push(verdict);
            }
            debug!(done = verdicts.len(), total = paths.len(), "safety batch progress");
        }

        self.release(model);
        Ok(verdicts)
    }

    fn release(&self, mut model: Box<dyn LoadedClassifier>) {
        if self.backend.device() == Device::Accelerator {
            model.move_to_host();
        }
        drop(model);
    }
}
