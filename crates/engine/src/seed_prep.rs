//! Resamples a decoded seed image to the engine's native I/O resolution
//! before it is handed to `append_frame` (§4.2: "Seeds not already at this
//! resolution are bilinearly resampled").

use crate::adapter::FrameTensor;
use image::imageops::{resize, FilterType};
use image::{ImageBuffer, Rgb};
use wg_core::constants::{FRAME_HEIGHT, FRAME_WIDTH};

/// Resizes an RGB8 buffer to the engine's native frame size. A no-op copy
/// when the input is already at that size.
///
/// # Panics
/// Panics if `rgb8.len() != width as usize * height as usize * 3`.
pub fn prepare_seed_frame(rgb8: &[u8], width: u32, height: u32) -> FrameTensor {
    let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, rgb8.to_vec())
        .expect("rgb8 buffer length must equal width * height * 3");

    if width == FRAME_WIDTH && height == FRAME_HEIGHT {
        return FrameTensor { width, height, rgb8: buffer.into_raw() };
    }

    let resized = resize(&buffer, FRAME_WIDTH, FRAME_HEIGHT, FilterType::Triangle);
    FrameTensor { width: FRAME_WIDTH, height: FRAME_HEIGHT, rgb8: resized.into_raw() }
}

/// Decodes an image file from disk and resamples it to the engine's native
/// resolution, ready for `append_frame`.
pub fn load_seed_frame(path: &std::path::Path) -> Result<FrameTensor, String> {
    let decoded = image::open(path).map_err(|err| err.to_string())?.to_rgb8();
    let (width, height) = decoded.dimensions();
    Ok(prepare_seed_frame(decoded.as_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_resolution_passes_through_unchanged() {
        let pixels = vec![7u8; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize];
        let frame = prepare_seed_frame(&pixels, FRAME_WIDTH, FRAME_HEIGHT);
        assert_eq!(frame.width, FRAME_WIDTH);
        assert_eq!(frame.height, FRAME_HEIGHT);
        assert_eq!(frame.rgb8, pixels);
    }

    #[test]
    fn mismatched_resolution_is_resampled() {
        let pixels = vec![3u8; 32 * 24 * 3];
        let frame = prepare_seed_frame(&pixels, 32, 24);
        assert_eq!(frame.width, FRAME_WIDTH);
        assert_eq!(frame.height, FRAME_HEIGHT);
        assert_eq!(frame.rgb8.len(), (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize);
    }
}
