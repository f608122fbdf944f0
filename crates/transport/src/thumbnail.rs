//! `GET /seeds/thumbnail/{filename}` (§6): an 80x80 JPEG, alpha composited
//! onto white.

use image::imageops::{resize, FilterType};
use image::{GenericImageView, Rgb, RgbImage};
use wg_core::constants::THUMBNAIL_SIZE;
use wg_engine::{encode_jpeg, FrameTensor};

pub fn make_thumbnail(path: &std::path::Path) -> Result<Vec<u8>, image::ImageError> {
    let img = image::open(path)?;
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let mut composited = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |channel: u8| -> u8 { (channel as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8 };
        composited.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let thumb = resize(&composited, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);
    let tensor = FrameTensor { width: THUMBNAIL_SIZE, height: THUMBNAIL_SIZE, rgb8: thumb.into_raw() };
    Ok(encode_jpeg(&tensor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites_transparent_pixels_toward_white() {
        let mut rgba = image::RgbaImage::new(4, 4);
        for pixel in rgba.pixels_mut() {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
        let dynamic = image::DynamicImage::ImageRgba8(rgba);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        dynamic.save(&path).unwrap();

        let jpeg = make_thumbnail(&path).unwrap();
        assert!(!jpeg.is_empty());
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
