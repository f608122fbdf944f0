//! Drives one connection's session through the FSM (§4.5), translating
//! [`SessionEvent`]s into engine calls and [`SessionOutput`]s. Owns no
//! transport I/O; the caller feeds it events and forwards its outputs.

use crate::event::SessionEvent;
use crate::fsm::Fsm;
use crate::output::SessionOutput;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use wg_core::{constants, Button, ControlInput, Session, SessionState, StatusCode};
use wg_engine::{ConstructOverrides, EngineOrchestrator};
use wg_persistence::SeedCache;

pub struct SessionDriver {
    session: Session,
    fsm: Fsm,
    orchestrator: Arc<EngineOrchestrator>,
    seed_cache: Arc<SeedCache>,
    next_frame_id: u64,
}

impl SessionDriver {
    pub fn new(remote_addr: String, orchestrator: Arc<EngineOrchestrator>, seed_cache: Arc<SeedCache>) -> Self {
        // A prior session's seed must never leak into a new one (§5).
        orchestrator.clear_seed();
        Self { session: Session::new(remote_addr), fsm: Fsm::new(), orchestrator, seed_cache, next_frame_id: 0 }
    }

    pub fn state(&self) -> SessionState {
        self.fsm.state()
    }

    #[cfg(test)]
    pub fn test_note_frame(&mut self) {
        self.session.note_frame(self.next_frame_id);
        self.next_frame_id += 1;
    }

    /// Dispatches one already-coalesced event and returns the outputs it
    /// produced. The caller is responsible for draining and coalescing the
    /// inbound queue before calling this in a loop (§4.5 "Control coalescing").
    pub async fn handle_event(&mut self, event: SessionEvent) -> Vec<SessionOutput> {
        match event {
            SessionEvent::SetModel { model, seed } => self.handle_set_model(model, seed).await,
            SessionEvent::SetInitialSeed { filename } => self.handle_set_initial_seed(filename).await,
            SessionEvent::Control(input) => self.handle_control(input).await,
            SessionEvent::Reset => self.handle_reset().await,
            SessionEvent::Prompt { prompt } => self.handle_prompt(prompt).await,
            SessionEvent::PromptWithSeed { filename } => self.handle_prompt_with_seed(filename).await,
            SessionEvent::Pause => self.handle_pause(),
            SessionEvent::Resume => self.handle_resume(),
        }
    }

    /// Closes the session on handshake timeout (§4.5, §5).
    pub fn handle_handshake_timeout(&mut self) -> Vec<SessionOutput> {
        if self.fsm.state() != SessionState::AwaitingHandshake {
            return Vec::new();
        }
        self.fsm.set(SessionState::Closed);
        vec![SessionOutput::Error { message: "handshake timed out".into() }]
    }

    async fn handle_set_model(&mut self, model: String, seed: Option<String>) -> Vec<SessionOutput> {
        if self.fsm.state() != SessionState::AwaitingHandshake {
            return vec![SessionOutput::Error { message: "set_model is only valid before handshake completes".into() }];
        }

        self.fsm.set(SessionState::Loading);
        let mut outputs = vec![SessionOutput::Status { code: StatusCode::Loading, message: None }];

        if let Err(err) = self.orchestrator.load_or_switch(&model, ConstructOverrides::default(), None).await {
            self.fsm.set(SessionState::Closed);
            outputs.push(SessionOutput::Error { message: format!("failed to load model: {err}") });
            return outputs;
        }

        match seed {
            Some(filename) => match self.admit_seed(&filename).await {
                Ok(()) => {
                    self.fsm.set(SessionState::SeedVerified);
                    outputs.extend(self.advance_to_running().await);
                }
                Err(message) => {
                    self.fsm.set(SessionState::AwaitingSeed);
                    outputs.push(SessionOutput::Status { code: StatusCode::WaitingForSeed, message: None });
                    outputs.push(SessionOutput::Error { message });
                }
            },
            None => {
                self.fsm.set(SessionState::AwaitingSeed);
                outputs.push(SessionOutput::Status { code: StatusCode::WaitingForSeed, message: None });
            }
        }
        outputs
    }

    async fn handle_set_initial_seed(&mut self, filename: String) -> Vec<SessionOutput> {
        match self.fsm.state() {
            SessionState::AwaitingHandshake if self.orchestrator.runtime_state().loaded_model.is_some() => {
                match self.admit_seed(&filename).await {
                    Ok(()) => {
                        self.fsm.set(SessionState::SeedVerified);
                        self.advance_to_running().await
                    }
                    Err(message) => vec![SessionOutput::Error { message }],
                }
            }
            SessionState::AwaitingSeed => match self.admit_seed(&filename).await {
                Ok(()) => {
                    self.fsm.set(SessionState::SeedVerified);
                    self.advance_to_running().await
                }
                Err(message) => vec![SessionOutput::Error { message }],
            },
            _ => vec![SessionOutput::Error { message: "set_initial_seed is not valid in the current state".into() }],
        }
    }

    async fn handle_control(&mut self, input: ControlInput) -> Vec<SessionOutput> {
        if !self.fsm.accepts_control() {
            return Vec::new();
        }

        let mut outputs = Vec::new();
        if self.session.at_frame_ceiling() {
            outputs.extend(self.perform_reset().await);
            if self.fsm.is_closed() {
                return outputs;
            }
        }

        let buttons: Vec<Button> = input.buttons.into_iter().collect();
        outputs.extend(self.generate_and_emit_frame(buttons, input.mouse_dx, input.mouse_dy, input.client_ts).await);
        outputs
    }

    async fn handle_reset(&mut self) -> Vec<SessionOutput> {
        if !self.fsm.accepts_mid_stream_reset() {
            return vec![SessionOutput::Error { message: "reset is not valid in the current state".into() }];
        }
        self.perform_reset().await
    }

    async fn handle_prompt(&mut self, prompt: String) -> Vec<SessionOutput> {
        if !self.fsm.accepts_mid_stream_reset() {
            return vec![SessionOutput::Error { message: "prompt is not valid in the current state".into() }];
        }
        let prompt = if prompt.is_empty() { constants::DEFAULT_PROMPT.to_string() } else { prompt };
        self.orchestrator.set_current_prompt(prompt);
        self.perform_reset().await
    }

    async fn handle_prompt_with_seed(&mut self, filename: String) -> Vec<SessionOutput> {
        if !self.fsm.accepts_mid_stream_reset() {
            return vec![SessionOutput::Error { message: "prompt_with_seed is not valid in the current state".into() }];
        }
        if let Err(message) = self.admit_seed(&filename).await {
            return vec![SessionOutput::Error { message }];
        }
        self.perform_reset().await
    }

    fn handle_pause(&mut self) -> Vec<SessionOutput> {
        if !self.fsm.accepts_pause() {
            return vec![SessionOutput::Error { message: "pause is not valid in the current state".into() }];
        }
        self.fsm.set(SessionState::Paused);
        self.session.paused = true;
        Vec::new()
    }

    fn handle_resume(&mut self) -> Vec<SessionOutput> {
        if !self.fsm.accepts_resume() {
            return vec![SessionOutput::Error { message: "resume is not valid in the current state".into() }];
        }
        self.fsm.set(SessionState::Running);
        self.session.paused = false;
        Vec::new()
    }

    async fn perform_reset(&mut self) -> Vec<SessionOutput> {
        self.fsm.set(SessionState::Resetting);
        let mut outputs = vec![SessionOutput::Status { code: StatusCode::Reset, message: None }];
        if let Err(err) = self.orchestrator.reset().await {
            outputs.extend(self.attempt_recovery_or_close(err.to_string(), err.looks_like_accelerator_fault()).await);
            return outputs;
        }
        self.session.note_reset();
        self.fsm.set(SessionState::Running);
        outputs
    }

    async fn generate_and_emit_frame(
        &mut self,
        buttons: Vec<Button>,
        mouse_dx: f64,
        mouse_dy: f64,
        client_ts: i64,
    ) -> Vec<SessionOutput> {
        let started = Instant::now();
        match self.orchestrator.generate_frame(buttons, mouse_dx, mouse_dy).await {
            Ok(frame) => {
                let frame_id = self.next_frame_id;
                self.next_frame_id += 1;
                self.session.note_frame(frame_id);
                let gen_ms = started.elapsed().as_secs_f64() * 1000.0;
                let jpeg = wg_engine::encode_jpeg(&frame);
                vec![SessionOutput::Frame { jpeg, frame_id, client_ts, gen_ms }]
            }
            Err(err) => self.attempt_recovery_or_close(err.to_string(), err.looks_like_accelerator_fault()).await,
        }
    }

    /// On a suspected accelerator fault, try in-place recovery (§4.6); on
    /// success the session resumes running after a reset status, otherwise
    /// it closes with an instruction to reconnect (§7 AcceleratorFault).
    async fn attempt_recovery_or_close(&mut self, message: String, looks_recoverable: bool) -> Vec<SessionOutput> {
        if !looks_recoverable {
            self.fsm.set(SessionState::Closed);
            return vec![SessionOutput::Error { message }];
        }

        self.fsm.set(SessionState::Recovering);
        warn!(error = %message, "engine fault matched accelerator heuristic; attempting recovery");
        match self.orchestrator.recover().await {
            Ok(()) => {
                self.session.note_reset();
                self.fsm.set(SessionState::Running);
                vec![SessionOutput::Status { code: StatusCode::Reset, message: None }]
            }
            Err(recover_err) => {
                self.fsm.set(SessionState::Closed);
                vec![SessionOutput::Error { message: format!("recovery failed, reconnect required: {recover_err}") }]
            }
        }
    }

    async fn admit_seed(&mut self, filename: &str) -> Result<(), String> {
        let path = crate::seed_verify::verify_seed_for_use(&self.seed_cache, filename)
            .await
            .map_err(|err| err.to_string())?;

        let frame = match tokio::task::spawn_blocking(move || wg_engine::load_seed_frame(&path)).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(message)) => return Err(message),
            Err(join_err) => return Err(join_err.to_string()),
        };
        self.orchestrator.set_current_seed(frame);
        Ok(())
    }

    async fn advance_to_running(&mut self) -> Vec<SessionOutput> {
        let mut outputs = Vec::new();
        self.fsm.set(SessionState::Warming);
        outputs.push(SessionOutput::Status { code: StatusCode::Warmup, message: None });

        if !self.orchestrator.runtime_state().warmed_up {
            if let Err(err) = self.orchestrator.warmup().await {
                self.fsm.set(SessionState::Closed);
                outputs.push(SessionOutput::Error { message: format!("warmup failed: {err}") });
                return outputs;
            }
        }
        outputs.push(SessionOutput::Status { code: StatusCode::Init, message: None });

        self.fsm.set(SessionState::Ready);
        outputs.push(SessionOutput::Status { code: StatusCode::Ready, message: None });

        let initial = self.generate_and_emit_frame(Vec::new(), 0.0, 0.0, 0).await;
        let initial_failed = initial.iter().any(|output| matches!(output, SessionOutput::Error { .. }));
        outputs.extend(initial);
        if !initial_failed {
            self.fsm.set(SessionState::Running);
        }
        outputs
    }
}
