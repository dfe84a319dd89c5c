//! Model client module for AI inference
//!
//! This module provides:
//! - `client`: Gemini `generateContent` client and its configuration
//! - `types`: Request and response wire types

mod client;
mod types;

pub use client::{classify_status, interpret_response, ModelClient, ModelConfig, ModelReply};
pub use types::{
    Blob, Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part,
    PromptFeedback, UsageMetadata,
};
