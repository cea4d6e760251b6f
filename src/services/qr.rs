//! QR rendering for promotional codes.
//!
//! Pure function from text to a square PNG. The symbol is scaled to whole
//! pixels per module and centred on a white canvas of the configured size.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, imageops};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use crate::config::QrConfig;
use crate::constants::qr::MAX_TEXT_LENGTH;

const WHITE: Luma<u8> = Luma([255]);

#[derive(Debug, Error)]
pub enum QrError {
    #[error("Nothing to encode")]
    Empty,

    #[error("Text is longer than {} characters", MAX_TEXT_LENGTH)]
    TooLong,

    #[error("Failed to encode QR symbol: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Failed to write PNG: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone)]
pub struct QrService {
    size_px: u32,
    margin_modules: u32,
}

impl QrService {
    #[must_use]
    pub const fn new(config: &QrConfig) -> Self {
        Self {
            size_px: config.size_px,
            margin_modules: config.margin_modules,
        }
    }

    /// Renders `text` as a PNG of `size_px` square.
    ///
    /// If the symbol plus margin cannot fit at one pixel per module the
    /// canvas grows to fit it.
    pub fn render_png(&self, text: &str) -> Result<Vec<u8>, QrError> {
        if text.is_empty() {
            return Err(QrError::Empty);
        }
        if text.chars().count() > MAX_TEXT_LENGTH {
            return Err(QrError::TooLong);
        }

        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)?;
        let modules = u32::try_from(code.width()).unwrap_or(u32::MAX);
        let total_modules = modules.saturating_add(self.margin_modules.saturating_mul(2));
        let module_px = (self.size_px / total_modules.max(1)).max(1);

        let symbol = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(module_px, module_px)
            .build();

        let side = self
            .size_px
            .max(symbol.width() + 2 * self.margin_modules * module_px);
        let mut canvas = ImageBuffer::from_pixel(side, side, WHITE);
        let offset = i64::from((side - symbol.width()) / 2);
        imageops::overlay(&mut canvas, &symbol, offset, offset);

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(canvas).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Same image as [`QrService::render_png`], as a `data:image/png;base64,` URL.
    pub fn render_data_url(&self, text: &str) -> Result<String, QrError> {
        let png = self.render_png(text)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> QrService {
        QrService::new(&QrConfig::default())
    }

    #[test]
    fn test_render_png_dimensions_and_margin() {
        let png = service().render_png("K3F9QZ1B").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_luma8();
        assert_eq!(img.width(), 300);
        assert_eq!(img.height(), 300);

        // Version 1 symbol: 21 modules + 2*2 margin = 25, so 12px per module
        // and a 24px white border around the finder pattern.
        assert_eq!(img.get_pixel(0, 0), &WHITE);
        assert_eq!(img.get_pixel(20, 20), &WHITE);
        assert_eq!(img.get_pixel(30, 30).0[0], 0);
    }

    #[test]
    fn test_render_data_url() {
        let url = service().render_data_url("K3F9QZ1B").unwrap();
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(&decoded[..4], b"\x89PNG");
    }

    #[test]
    fn test_rejects_empty_and_oversized_text() {
        assert!(matches!(service().render_png(""), Err(QrError::Empty)));
        let long = "A".repeat(MAX_TEXT_LENGTH + 1);
        assert!(matches!(service().render_png(&long), Err(QrError::TooLong)));
    }

    #[test]
    fn test_small_canvas_grows_to_fit() {
        let tiny = QrService::new(&QrConfig {
            size_px: 10,
            margin_modules: 2,
        });
        let png = tiny.render_png("K3F9QZ1B").unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 25);
    }
}
