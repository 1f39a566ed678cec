//! Plate scanner: OCR collaborator boundary
//!
//! The gate only consumes the recognized text; everything else about image
//! handling lives behind the [`PlateRecognizer`] trait. The production
//! implementation shells out to the `tesseract` binary.

use async_trait::async_trait;
use cpm_common::{Error, Result};
use std::path::Path;
use tracing::debug;

/// OCR collaborator contract: image in, raw text or failure out
#[async_trait]
pub trait PlateRecognizer: Send + Sync {
    /// Recognize text in the given image
    async fn recognize(&self, image: &Path) -> Result<String>;
}

/// Recognizer backed by the `tesseract` command-line binary
pub struct TesseractScanner {
    binary: String,
}

impl TesseractScanner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractScanner {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl PlateRecognizer for TesseractScanner {
    async fn recognize(&self, image: &Path) -> Result<String> {
        // PSM 7: treat the image as a single text line (the plate)
        let output = tokio::process::Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .args(["--psm", "7"])
            .output()
            .await
            .map_err(|e| Error::Recognition(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(Error::Recognition(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR raw result: {:?}", text);

        if text.is_empty() {
            return Err(Error::Recognition("no text recognized in image".to_string()));
        }

        Ok(text)
    }
}

/// Normalize raw OCR output into a plate key: keep ASCII alphanumerics and
/// hyphens, drop everything else, uppercase the result
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_uppercase()
}
