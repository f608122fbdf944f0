//! A reference [`EngineFactory`] standing in for the external generative
//! world-engine library (explicitly out of scope — §1 Non-goals). It
//! exercises the orchestrator/session contract end to end: `reset` and
//! `append_frame` track the last-seen seed frame, `set_prompt` records text,
//! and `gen_frame` renders a deterministic frame that pans across the seed
//! image in the direction of the last control input, so a client driving a
//! real session sees visible, input-responsive motion.

use wg_core::constants::{FRAME_HEIGHT, FRAME_WIDTH};
use wg_core::Button;
use wg_engine::{ConstructOverrides, Ctrl, DType, Device, EngineError, EngineFactory, EngineHandle, FrameTensor};

pub struct ReferenceEngineFactory;

impl EngineFactory for ReferenceEngineFactory {
    fn construct(
        &self,
        model_uri: &str,
        _device: Device,
        _overrides: &ConstructOverrides,
        _quant: Option<&str>,
        _dtype: DType,
    ) -> Result<Box<dyn EngineHandle>, EngineError> {
        Ok(Box::new(ReferenceEngineHandle {
            model_uri: model_uri.to_string(),
            seed: blank_frame(),
            prompt: String::new(),
            pan_x: 0,
            pan_y: 0,
        }))
    }
}

struct ReferenceEngineHandle {
    model_uri: String,
    seed: FrameTensor,
    prompt: String,
    pan_x: i64,
    pan_y: i64,
}

impl EngineHandle for ReferenceEngineHandle {
    fn reset(&mut self) -> Result<(), EngineError> {
        self.seed = blank_frame();
        self.prompt.clear();
        self.pan_x = 0;
        self.pan_y = 0;
        tracing::debug!(model = %self.model_uri, "reference engine reset");
        Ok(())
    }

    fn append_frame(&mut self, frame: &FrameTensor) -> Result<(), EngineError> {
        if frame.width != FRAME_WIDTH || frame.height != FRAME_HEIGHT {
            return Err(EngineError::runtime(format!(
                "expected a {FRAME_WIDTH}x{FRAME_HEIGHT} frame, got {}x{}",
                frame.width, frame.height
            )));
        }
        self.seed = frame.clone();
        Ok(())
    }

    fn set_prompt(&mut self, text: &str) -> Result<(), EngineError> {
        self.prompt = text.to_string();
        Ok(())
    }

    fn gen_frame(&mut self, ctrl: Ctrl<'_>) -> Result<FrameTensor, EngineError> {
        self.pan_x += pan_delta(&ctrl, Button::Left, Button::Right, ctrl.mouse_dx);
        self.pan_y += pan_delta(&ctrl, Button::Up, Button::Down, ctrl.mouse_dy);
        Ok(pan(&self.seed, self.pan_x, self.pan_y))
    }
}

fn pan_delta(ctrl: &Ctrl<'_>, negative: Button, positive: Button, mouse: f64) -> i64 {
    let mut delta = mouse.round() as i64;
    if ctrl.buttons.contains(&negative) {
        delta -= 4;
    }
    if ctrl.buttons.contains(&positive) {
        delta += 4;
    }
    delta
}

fn blank_frame() -> FrameTensor {
    FrameTensor { width: FRAME_WIDTH, height: FRAME_HEIGHT, rgb8: vec![16; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize] }
}

/// Wraps `frame` by `(dx, dy)` pixels, producing the illusion of camera
/// motion without needing a real scene model.
fn pan(frame: &FrameTensor, dx: i64, dy: i64) -> FrameTensor {
    let (width, height) = (frame.width as i64, frame.height as i64);
    let mut out = vec![0u8; frame.rgb8.len()];
    for y in 0..height {
        let src_y = (y + dy).rem_euclid(height);
        for x in 0..width {
            let src_x = (x + dx).rem_euclid(width);
            let src_idx = ((src_y * width + src_x) * 3) as usize;
            let dst_idx = ((y * width + x) * 3) as usize;
            out[dst_idx..dst_idx + 3].copy_from_slice(&frame.rgb8[src_idx..src_idx + 3]);
        }
    }
    FrameTensor { width: frame.width, height: frame.height, rgb8: out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn reset_then_gen_frame_produces_native_resolution() {
        let factory = ReferenceEngineFactory;
        let mut handle = factory.construct("ref-model", Device::Cpu, &ConstructOverrides::default(), None, DType::BFloat16).unwrap();
        handle.reset().unwrap();
        let buttons = HashSet::new();
        let frame = handle.gen_frame(Ctrl { buttons: &buttons, mouse_dx: 0.0, mouse_dy: 0.0 }).unwrap();
        assert_eq!(frame.width, FRAME_WIDTH);
        assert_eq!(frame.height, FRAME_HEIGHT);
    }

    #[test]
    fn append_frame_rejects_wrong_resolution() {
        let factory = ReferenceEngineFactory;
        let mut handle = factory.construct("ref-model", Device::Cpu, &ConstructOverrides::default(), None, DType::BFloat16).unwrap();
        let bad = FrameTensor { width: 4, height: 4, rgb8: vec![0; 48] };
        assert!(handle.append_frame(&bad).is_err());
    }

    #[test]
    fn panning_wraps_around_the_frame_edges() {
        let frame = FrameTensor { width: 2, height: 1, rgb8: vec![1, 1, 1, 2, 2, 2] };
        let panned = pan(&frame, 1, 0);
        assert_eq!(panned.rgb8, vec![2, 2, 2, 1, 1, 1]);
    }
}
