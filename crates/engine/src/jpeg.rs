//! Adapts a [`FrameTensor`] into JPEG bytes for outbound `frame` messages
//! (§6). The codec itself is the `image` crate's; this module only wires
//! our buffer layout into it.

use crate::adapter::FrameTensor;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

const JPEG_QUALITY: u8 = 85;

pub fn encode_jpeg(frame: &FrameTensor) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder
        .encode(&frame.rgb8, frame.width, frame.height, ColorType::Rgb8)
        .expect("frame tensor dimensions must match its pixel buffer length");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_solid_frame() {
        let frame = FrameTensor { width: 4, height: 4, rgb8: vec![128; 4 * 4 * 3] };
        let jpeg = encode_jpeg(&frame);
        assert!(!jpeg.is_empty());
        // JPEG magic bytes.
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
