//! A reference [`ClassifierBackend`] standing in for the external NSFW model
//! (out of scope per the engine/classifier Non-goals). It scores images by
//! mean saturation as a deliberately crude, deterministic proxy so the
//! gateway is runnable and its safety gating exercisable end to end without
//! a real model attached.

use async_trait::async_trait;
use std::path::Path;
use wg_core::ClassScores;
use wg_safety::{ClassifierBackend, DecodedImage, Device, LoadedClassifier, SafetyError};

pub struct ReferenceClassifierBackend;

struct ReferenceModel;

impl LoadedClassifier for ReferenceModel {
    fn infer(&self, image: &DecodedImage) -> ClassScores {
        let low = mean_saturation(image);
        ClassScores { neutral: 1.0 - low, low, medium: 0.0, high: 0.0 }
    }
}

#[async_trait]
impl ClassifierBackend for ReferenceClassifierBackend {
    fn device(&self) -> Device {
        Device::Cpu
    }

    async fn load(&self) -> Result<Box<dyn LoadedClassifier>, SafetyError> {
        Ok(Box::new(ReferenceModel))
    }

    async fn decode(&self, path: &Path) -> Result<DecodedImage, SafetyError> {
        let img = image::open(path).map_err(|err| SafetyError::Decode {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width(), rgb.height());
        Ok(DecodedImage { width, height, rgb8: rgb.into_raw() })
    }
}

/// Average HSV saturation across the image, in `[0, 1]`.
fn mean_saturation(image: &DecodedImage) -> f64 {
    if image.rgb8.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for pixel in image.rgb8.chunks_exact(3) {
        let (r, g, b) = (pixel[0] as f64 / 255.0, pixel[1] as f64 / 255.0, pixel[2] as f64 / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let saturation = if max == 0.0 { 0.0 } else { (max - min) / max };
        total += saturation;
        count += 1;
    }
    total / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_image_scores_as_low_saturation() {
        let image = DecodedImage { width: 2, height: 1, rgb8: vec![128, 128, 128, 64, 64, 64] };
        assert!(mean_saturation(&image) < 0.01);
    }

    #[test]
    fn saturated_image_scores_high() {
        let image = DecodedImage { width: 1, height: 1, rgb8: vec![255, 0, 0] };
        assert!(mean_saturation(&image) > 0.9);
    }
}
