//! 图片预处理服务 - 业务能力层
//!
//! 灰度化 + 对比度增强，编码为 PNG data URL 供视觉模型使用

use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult, FileError};

/// 图片预处理服务
#[derive(Debug, Clone, Copy)]
pub struct ImageService {
    contrast_factor: f32,
}

impl ImageService {
    pub fn new(contrast_factor: f32) -> Self {
        Self { contrast_factor }
    }

    /// 读取图片文件并返回预处理后的 data URL
    pub fn load_data_url(&self, path: &Path) -> AppResult<String> {
        let img = image::open(path).map_err(|e| image_failed(path, e))?;
        let gray = self.preprocess(img);
        let png = encode_png(gray).map_err(|e| image_failed(path, e))?;

        debug!(
            "图片预处理完成: {} ({} 字节 PNG)",
            path.display(),
            png.len()
        );

        Ok(to_data_url(&png))
    }

    /// 灰度化并增强对比度
    pub fn preprocess(&self, img: DynamicImage) -> GrayImage {
        enhance_contrast(img.to_luma8(), self.contrast_factor)
    }
}

fn image_failed(path: &Path, source: image::ImageError) -> AppError {
    AppError::File(FileError::ImageFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

/// 以平均亮度为中心拉伸对比度
///
/// `factor` 为 1.0 时不变，大于 1.0 时增强。
pub fn enhance_contrast(mut img: GrayImage, factor: f32) -> GrayImage {
    let pixel_count = (img.width() as u64) * (img.height() as u64);
    if pixel_count == 0 {
        return img;
    }

    let sum: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum as f32 / pixel_count as f32).round();

    for pixel in img.pixels_mut() {
        let value = pixel.0[0] as f32;
        pixel.0[0] = (mean + (value - mean) * factor).round().clamp(0.0, 255.0) as u8;
    }

    img
}

fn encode_png(img: GrayImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png_buffer = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut png_buffer), ImageFormat::Png)?;
    Ok(png_buffer)
}

fn to_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::prelude::BASE64_STANDARD.encode(png)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_contrast_stretches_around_mean() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { Luma([100]) } else { Luma([140]) });
        let out = enhance_contrast(img, 1.5);

        assert_eq!(out.get_pixel(0, 0).0[0], 90);
        assert_eq!(out.get_pixel(1, 0).0[0], 150);
    }

    #[test]
    fn test_contrast_clamps() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { Luma([0]) } else { Luma([255]) });
        let out = enhance_contrast(img, 3.0);

        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_preprocess_outputs_grayscale_png_data_url() {
        let dir = std::env::temp_dir().join(format!("msp-image-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("page1.png");
        RgbImage::from_pixel(4, 3, Rgb([200, 10, 10])).save(&path).unwrap();

        let url = ImageService::new(1.5).load_data_url(&path).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let bytes = base64::prelude::BASE64_STANDARD
            .decode(url.trim_start_matches("data:image/png;base64,"))
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (4, 3));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unreadable_image_is_a_file_error() {
        let err = ImageService::new(1.5)
            .load_data_url(Path::new("/definitely/missing/page.png"))
            .unwrap_err();
        assert!(matches!(err, AppError::File(FileError::ImageFailed { .. })));
    }
}
