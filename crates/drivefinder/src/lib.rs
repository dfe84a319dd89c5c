//! drivefinder: car suggestions from a hosted vision-language model
//!
//! This library provides:
//! - Prompt assembly from eight free-text preferences and an optional image
//! - A Gemini `generateContent` client with fixed decoding and safety settings
//! - `CarAdvisor`, which runs one submission end to end
//!
//! # Example
//!
//! ```no_run
//! use drivefinder::{CarAdvisor, ModelConfig, UserPreferences};
//!
//! #[tokio::main]
//! async fn main() -> drivefinder::Result<()> {
//!     let advisor = CarAdvisor::new(ModelConfig::from_env()?, None)?;
//!
//!     let prefs = UserPreferences::new()
//!         .with_use_case("Comfortable city car")
//!         .with_price("20000 USD")
//!         .with_fuel_type("Petrol");
//!
//!     let suggestion = advisor.suggest(&prefs).await?;
//!     println!("{}", suggestion.reply.text);
//!     Ok(())
//! }
//! ```

pub mod error;

pub mod config;

pub mod advisor;
pub mod model;
pub mod prompt;

pub use error::{DriveFinderError, Result};

pub use config::{
    default_safety_settings, get_instruction_template, GenerationConfig, HarmBlockThreshold,
    HarmCategory, RequestTimingConfig, SafetySetting, TimingConfig, DEFAULT_TEMPLATE,
    TIMING_CONFIG,
};

pub use model::{ModelClient, ModelConfig, ModelReply};

pub use prompt::{
    ImageAttachment, ImageSource, PreferenceField, PromptBuilder, PromptPart, PromptRequest,
    UserPreferences,
};

pub use advisor::{AdvisorConfig, CarAdvisor, Suggestion};
