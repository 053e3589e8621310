//! QR code rendering.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::config::QrSettings;
use crate::domain::RecoveryLevel;
use crate::errors::{AppError, AppResult};

impl From<RecoveryLevel> for EcLevel {
    fn from(level: RecoveryLevel) -> Self {
        match level {
            RecoveryLevel::Low => EcLevel::L,
            RecoveryLevel::Medium => EcLevel::M,
            RecoveryLevel::High => EcLevel::Q,
            RecoveryLevel::Highest => EcLevel::H,
        }
    }
}

/// Renders payloads as square PNG QR codes.
#[derive(Debug, Clone, Copy)]
pub struct QrEncoder {
    size: u32,
    level: EcLevel,
}

impl QrEncoder {
    pub fn new(settings: QrSettings) -> Self {
        Self {
            size: settings.size,
            level: settings.level.into(),
        }
    }

    /// Encode `payload` into PNG bytes. Same input, same image.
    pub fn encode(&self, payload: &str) -> AppResult<Vec<u8>> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.level)
            .map_err(|e| AppError::internal(format!("QR encoding failed: {}", e)))?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .max_dimensions(self.size, self.size)
            .build();

        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| AppError::internal(format!("QR image encoding failed: {}", e)))?;

        Ok(png.into_inner())
    }
}
