//! Image analysis service.

use std::path::Path;
use std::sync::Arc;

use plume_models::{Generation, ImageInput, LanguageGateway};
use tracing::{info, warn};

use crate::error::{PlumeError, Result};

/// Image extensions accepted for analysis.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Prompt used when the caller does not supply one.
pub const DEFAULT_VISION_PROMPT: &str = "\
You are a professional visual analyst. Describe this image in detail: its main subject, \
colour palette, mood and composition. Then suggest which kinds of social media posts it \
would suit, and a few keywords that could anchor the copy.";

/// Describes images so they can seed post copy.
pub struct VisionService {
    gateway: Arc<dyn LanguageGateway>,
}

impl VisionService {
    /// Creates a service over `gateway`.
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }

    /// Reads and analyzes the image at `path`.
    ///
    /// The extension is checked before the file is read.
    pub async fn analyze_file(&self, path: &Path, prompt: Option<&str>) -> Result<Generation> {
        let file_name =
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let media_type = image_media_type(&file_name)?;
        let bytes = tokio::fs::read(path).await?;
        self.analyze(&file_name, &bytes, &media_type, prompt).await
    }

    /// Analyzes an uploaded image named `file_name`.
    ///
    /// # Errors
    /// `UnsupportedInputFormat` when the extension is not jpg, jpeg, png or webp;
    /// no provider is contacted in that case.
    pub async fn analyze_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        prompt: Option<&str>,
    ) -> Result<Generation> {
        let media_type = image_media_type(file_name)?;
        self.analyze(file_name, bytes, &media_type, prompt).await
    }

    async fn analyze(
        &self,
        file_name: &str,
        bytes: &[u8],
        media_type: &str,
        prompt: Option<&str>,
    ) -> Result<Generation> {
        let image = ImageInput::from_bytes(bytes, media_type);
        let prompt = prompt.filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_VISION_PROMPT);

        let generation = self
            .gateway
            .analyze_image(&image, prompt)
            .await
            .map_err(|e| PlumeError::upstream("vision", e))?;

        match &generation {
            Generation::Generated { provider, .. } => {
                info!(
                    file = %file_name,
                    provider = %provider,
                    bytes = bytes.len(),
                    "Image analyzed"
                );
            }
            Generation::Unconfigured { message } => {
                warn!(file = %file_name, message = %message, "Image analysis unavailable");
            }
        }
        Ok(generation)
    }
}

/// Media type for an accepted image file name.
fn image_media_type(file_name: &str) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PlumeError::UnsupportedInputFormat(format!(
            "{file_name} (accepted: {})",
            IMAGE_EXTENSIONS.join(", ")
        )));
    }
    Ok(mime_guess::from_ext(&ext).first_or_octet_stream().essence_str().to_string())
}
