//! Assembly of the outbound prompt from user preferences

use image::ImageFormat;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::preferences::{PreferenceField, UserPreferences};
use crate::config::get_instruction_template;
use crate::error::{DriveFinderError, Result};

/// Media type used when neither the bytes nor the extension identify the image
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Raw image bytes with their declared media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// One part of the request content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPart<'a> {
    Text(&'a str),
    Image(&'a ImageAttachment),
}

/// Text segment plus at most one inline attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub text: String,
    pub attachment: Option<ImageAttachment>,
}

impl PromptRequest {
    /// Content parts in send order: text first, then the attachment if any
    pub fn parts(&self) -> Vec<PromptPart<'_>> {
        let mut parts = vec![PromptPart::Text(&self.text)];
        if let Some(attachment) = &self.attachment {
            parts.push(PromptPart::Image(attachment));
        }
        parts
    }
}

/// Builds prompt requests from a fixed instruction template
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(get_instruction_template(None))
    }
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the template followed by one `Label: value` line per field
    pub fn render_text(&self, prefs: &UserPreferences) -> String {
        let mut text = self.template.clone();
        for field in PreferenceField::ALL {
            text.push('\n');
            text.push_str(field.label());
            text.push_str(": ");
            text.push_str(prefs.field(field).trim());
        }
        text
    }

    /// Build the request, reading the image file if one is referenced
    ///
    /// Fails with [`DriveFinderError::InputNotFound`] when the image path does
    /// not exist.
    pub async fn build(&self, prefs: &UserPreferences) -> Result<PromptRequest> {
        let text = self.render_text(prefs);

        let attachment = match &prefs.image {
            Some(source) => Some(load_image(source.path()).await?),
            None => None,
        };

        debug!(
            "Built prompt: {} chars of text, attachment: {}",
            text.len(),
            attachment
                .as_ref()
                .map(|a| format!("{} ({} bytes)", a.mime_type, a.data.len()))
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(PromptRequest { text, attachment })
    }
}

/// Read an image from disk without altering its bytes
pub async fn load_image(path: &Path) -> Result<ImageAttachment> {
    let data = fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => DriveFinderError::InputNotFound(path.to_path_buf()),
        _ => DriveFinderError::Io(e),
    })?;

    let mime_type = detect_mime_type(path, &data).to_string();
    Ok(ImageAttachment { mime_type, data })
}

/// Sniff the media type from magic bytes, then the file extension
pub fn detect_mime_type(path: &Path, data: &[u8]) -> &'static str {
    image::guess_format(data)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_IMAGE_MIME_TYPE)
}
