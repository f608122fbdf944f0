//! Owns the engine lifecycle (§4.6): load/switch, warmup, reset, and
//! recovery, all executed on the GPU worker. This is the only component
//! permitted to mutate [`wg_core::EngineRuntimeState`].

use crate::adapter::{ConstructOverrides, Ctrl, DType, Device, EngineError, EngineFactory, EngineHandle, FrameTensor};
use crate::gpu_worker::GpuWorker;
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};
use wg_core::{Button, EngineRuntimeState};

struct Current {
    seed: Option<FrameTensor>,
    prompt: String,
}

pub struct EngineOrchestrator {
    worker: GpuWorker,
    factory: Arc<dyn EngineFactory>,
    handle: Arc<StdMutex<Option<Box<dyn EngineHandle>>>>,
    current: Arc<StdMutex<Current>>,
    state: Arc<StdMutex<EngineRuntimeState>>,
    /// Serializes `load_or_switch` across concurrent sessions (§4.6, §5).
    load_guard: AsyncMutex<()>,
}

impl EngineOrchestrator {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            worker: GpuWorker::new(),
            factory,
            handle: Arc::new(StdMutex::new(None)),
            current: Arc::new(StdMutex::new(Current { seed: None, prompt: wg_core::constants::DEFAULT_PROMPT.to_string() })),
            state: Arc::new(StdMutex::new(EngineRuntimeState::default())),
            load_guard: AsyncMutex::new(()),
        }
    }

    pub fn runtime_state(&self) -> EngineRuntimeState {
        self.state.lock().expect("engine state lock poisoned").clone()
    }

    /// Clears the engine's seed slot. Called on every new connection so a
    /// prior session's seed never leaks into a new one (§5 "Disconnection").
    pub fn clear_seed(&self) {
        self.current.lock().expect("current-seed lock poisoned").seed = None;
        self.state.lock().expect("engine state lock poisoned").clear_seed();
    }

    /// Loads `model_uri` if it is not already loaded, otherwise no-ops
    /// (§4.6). Tries bfloat16 first, falls back to float16 on OOM.
    pub async fn load_or_switch(
        &self,
        model_uri: &str,
        overrides: ConstructOverrides,
        quant: Option<String>,
    ) -> Result<(), EngineError> {
        let _permit = self.load_guard.lock().await;

        if self.state.lock().expect("engine state lock poisoned").is_loaded(model_uri) {
            return Ok(());
        }

        self.state.lock().expect("engine state lock poisoned").loading = true;

        let factory = self.factory.clone();
        let handle_slot = self.handle.clone();
        let model_uri_owned = model_uri.to_string();

        let result = self
            .worker
            .submit(move || -> Result<(), EngineError> {
                // Unload the current handle first: synchronize, drop
                // references, release compiled-graph caches, empty the
                // device allocator, run IPC collection. Those steps are
                // backend-specific and left to the concrete handle's Drop.
                handle_slot.lock().expect("engine handle lock poisoned").take();

                let bf16 = factory.construct(&model_uri_owned, Device::Accelerator, &overrides, quant.as_deref(), DType::BFloat16);
                let constructed = match bf16 {
                    Ok(handle) => handle,
                    Err(EngineError::OutOfMemory { .. }) => {
                        warn!(model = %model_uri_owned, "bfloat16 construction ran out of memory; retrying with float16");
                        factory.construct(&model_uri_owned, Device::Accelerator, &overrides, quant.as_deref(), DType::Float16)?
                    }
                    Err(other) => return Err(other),
                };

                *handle_slot.lock().expect("engine handle lock poisoned") = Some(constructed);
                Ok(())
            })
            .await;

        let mut state = self.state.lock().expect("engine state lock poisoned");
        state.loading = false;
        if result.is_ok() {
            info!(model = %model_uri, "engine model loaded");
            state.loaded_model = Some(model_uri.to_string());
            state.warmed_up = false;
            state.has_seed = false;
        }
        drop(state);
        result
    }

    /// Records the seed that subsequent resets will replay, without
    /// touching the engine directly (the append happens inside [`Self::reset`]).
    pub fn set_current_seed(&self, seed: FrameTensor) {
        self.current.lock().expect("current-seed lock poisoned").seed = Some(seed);
        self.state.lock().expect("engine state lock poisoned").has_seed = true;
    }

    /// Records the prompt subsequent resets will replay.
    pub fn set_current_prompt(&self, prompt: String) {
        self.state.lock().expect("engine state lock poisoned").current_prompt = Some(prompt.clone());
        self.current.lock().expect("current-seed lock poisoned").prompt = prompt;
    }

    /// `reset + append current seed + set current prompt` (§4.6 `reset`).
    pub async fn reset(&self) -> Result<(), EngineError> {
        let (seed, prompt) = {
            let current = self.current.lock().expect("current-seed lock poisoned");
            let seed = current
                .seed
                .clone()
                .ok_or_else(|| EngineError::runtime("reset requested before a seed was set"))?;
            (seed, current.prompt.clone())
        };
        self.replay(seed, prompt).await
    }

    async fn replay(&self, seed: FrameTensor, prompt: String) -> Result<(), EngineError> {
        let handle_slot = self.handle.clone();
        self.worker
            .submit(move || -> Result<(), EngineError> {
                let mut guard = handle_slot.lock().expect("engine handle lock poisoned");
                let handle = guard.as_mut().ok_or_else(|| EngineError::runtime("reset requested before engine load"))?;
                handle.reset()?;
                handle.append_frame(&seed)?;
                handle.set_prompt(&prompt)?;
                Ok(())
            })
            .await
    }

    /// On the first connection after a load: reset, append the seed, set
    /// the prompt, and generate one discarded frame to force accelerator
    /// graph compilation (§4.6 `warmup`).
    pub async fn warmup(&self) -> Result<(), EngineError> {
        self.reset().await?;

        let handle_slot = self.handle.clone();
        self.worker
            .submit(move || -> Result<(), EngineError> {
                let mut guard = handle_slot.lock().expect("engine handle lock poisoned");
                let handle = guard.as_mut().ok_or_else(|| EngineError::runtime("warmup requested before engine load"))?;
                let empty: HashSet<Button> = HashSet::new();
                handle.gen_frame(Ctrl { buttons: &empty, mouse_dx: 0.0, mouse_dy: 0.0 }).map(|_discarded| ())
            })
            .await?;

        self.state.lock().expect("engine state lock poisoned").warmed_up = true;
        Ok(())
    }

    /// Attempts recovery from a suspected accelerator-graph corruption
    /// (§4.6 `recover`). Callers decide when to invoke this using
    /// [`EngineError::looks_like_accelerator_fault`].
    pub async fn recover(&self) -> Result<(), EngineError> {
        warn!("attempting accelerator recovery");
        // Synchronize, empty the device cache, and reset the compiled-graph
        // cache are backend-specific steps folded into the concrete
        // handle's `reset()`; this orchestrator only sequences them.
        let result = self.reset().await;
        match &result {
            Ok(()) => info!("accelerator recovery succeeded"),
            Err(err) => warn!(error = %err, "accelerator recovery failed"),
        }
        result
    }

    /// Generates the next frame from control input (§4.2 `gen_frame`).
    pub async fn generate_frame(&self, buttons: Vec<Button>, mouse_dx: f64, mouse_dy: f64) -> Result<FrameTensor, EngineError> {
        let handle_slot = self.handle.clone();
        self.worker
            .submit(move || -> Result<FrameTensor, EngineError> {
                let mut guard = handle_slot.lock().expect("engine handle lock poisoned");
                let handle = guard.as_mut().ok_or_else(|| EngineError::runtime("generate requested before engine load"))?;
                let button_set: HashSet<Button> = buttons.into_iter().collect();
                handle.gen_frame(Ctrl { buttons: &button_set, mouse_dx, mouse_dy })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeHandle {
        reset_calls: Arc<AtomicUsize>,
        frames_generated: Arc<AtomicUsize>,
        fail_next_gen: bool,
    }

    impl EngineHandle for FakeHandle {
        fn reset(&mut self) -> Result<(), EngineError> {
            self.reset_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn append_frame(&mut self, _frame: &FrameTensor) -> Result<(), EngineError> {
            Ok(())
        }
        fn set_prompt(&mut self, _text: &str) -> Result<(), EngineError> {
            Ok(())
        }
        fn gen_frame(&mut self, _ctrl: Ctrl<'_>) -> Result<FrameTensor, EngineError> {
            if self.fail_next_gen {
                return Err(EngineError::runtime("cuda graph capture failed"));
            }
            self.frames_generated.fetch_add(1, Ordering::SeqCst);
            Ok(FrameTensor { width: 1, height: 1, rgb8: vec![0, 0, 0] })
        }
    }

    struct FakeFactory {
        reset_calls: Arc<AtomicUsize>,
        frames_generated: Arc<AtomicUsize>,
        oom_once: std::sync::atomic::AtomicBool,
    }

    impl EngineFactory for FakeFactory {
        fn construct(
            &self,
            _model_uri: &str,
            _device: Device,
            _overrides: &ConstructOverrides,
            _quant: Option<&str>,
            dtype: DType,
        ) -> Result<Box<dyn EngineHandle>, EngineError> {
            if self.oom_once.load(Ordering::SeqCst) && dtype == DType::BFloat16 {
                self.oom_once.store(false, Ordering::SeqCst);
                return Err(EngineError::OutOfMemory { message: "bf16 oom".into() });
            }
            Ok(Box::new(FakeHandle {
                reset_calls: self.reset_calls.clone(),
                frames_generated: self.frames_generated.clone(),
                fail_next_gen: false,
            }))
        }
    }

    fn seed() -> FrameTensor {
        FrameTensor { width: 1, height: 1, rgb8: vec![0, 0, 0] }
    }

    #[tokio::test]
    async fn load_or_switch_is_noop_when_already_loaded() {
        let reset_calls = Arc::new(AtomicUsize::new(0));
        let frames_generated = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(FakeFactory { reset_calls, frames_generated, oom_once: std::sync::atomic::AtomicBool::new(false) });
        let orchestrator = EngineOrchestrator::new(factory);

        orchestrator.load_or_switch("model-a", ConstructOverrides::default(), None).await.unwrap();
        assert!(orchestrator.runtime_state().is_loaded("model-a"));

        orchestrator.load_or_switch("model-a", ConstructOverrides::default(), None).await.unwrap();
        assert!(orchestrator.runtime_state().is_loaded("model-a"));
    }

    #[tokio::test]
    async fn load_falls_back_to_float16_on_oom() {
        let reset_calls = Arc::new(AtomicUsize::new(0));
        let frames_generated = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(FakeFactory { reset_calls, frames_generated, oom_once: std::sync::atomic::AtomicBool::new(true) });
        let orchestrator = EngineOrchestrator::new(factory);

        orchestrator.load_or_switch("model-a", ConstructOverrides::default(), None).await.unwrap();
        assert!(orchestrator.runtime_state().is_loaded("model-a"));
    }

    #[tokio::test]
    async fn warmup_resets_appends_and_discards_one_frame() {
        let reset_calls = Arc::new(AtomicUsize::new(0));
        let frames_generated = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(FakeFactory { reset_calls: reset_calls.clone(), frames_generated: frames_generated.clone(), oom_once: std::sync::atomic::AtomicBool::new(false) });
        let orchestrator = EngineOrchestrator::new(factory);
        orchestrator.load_or_switch("model-a", ConstructOverrides::default(), None).await.unwrap();
        orchestrator.set_current_seed(seed());
        orchestrator.set_current_prompt("a prompt".to_string());

        orchestrator.warmup().await.unwrap();

        assert!(orchestrator.runtime_state().warmed_up);
        assert_eq!(reset_calls.load(Ordering::SeqCst), 1);
        assert_eq!(frames_generated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reset_without_a_seed_fails() {
        let reset_calls = Arc::new(AtomicUsize::new(0));
        let frames_generated = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(FakeFactory { reset_calls, frames_generated, oom_once: std::sync::atomic::AtomicBool::new(false) });
        let orchestrator = EngineOrchestrator::new(factory);
        orchestrator.load_or_switch("model-a", ConstructOverrides::default(), None).await.unwrap();

        let err = orchestrator.reset().await.unwrap_err();
        assert!(matches!(err, EngineError::Runtime { .. }));
    }

    #[tokio::test]
    async fn clear_seed_forces_next_reset_to_fail() {
        let reset_calls = Arc::new(AtomicUsize::new(0));
        let frames_generated = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(FakeFactory { reset_calls, frames_generated, oom_once: std::sync::atomic::AtomicBool::new(false) });
        let orchestrator = EngineOrchestrator::new(factory);
        orchestrator.load_or_switch("model-a", ConstructOverrides::default(), None).await.unwrap();
        orchestrator.set_current_seed(seed());
        orchestrator.reset().await.unwrap();

        orchestrator.clear_seed();
        assert!(orchestrator.reset().await.is_err());
        assert!(!orchestrator.runtime_state().has_seed);
    }
}
