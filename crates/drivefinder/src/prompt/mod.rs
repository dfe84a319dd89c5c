//! Prompt assembly
//!
//! This module provides:
//! - `preferences`: The user preference record and its fields
//! - `builder`: Rendering preferences into a prompt request

mod builder;
mod preferences;

pub use builder::{
    detect_mime_type, load_image, ImageAttachment, PromptBuilder, PromptPart, PromptRequest,
    DEFAULT_IMAGE_MIME_TYPE,
};
pub use preferences::{ImageSource, PreferenceField, UserPreferences};
