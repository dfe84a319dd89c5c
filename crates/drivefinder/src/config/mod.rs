//! Configuration module for drivefinder
//!
//! This module contains:
//! - `generation`: Decoding parameters and safety thresholds
//! - `prompts`: Instruction template for the car advisor
//! - `timing`: Timeouts for model requests

mod generation;
mod prompts;
mod timing;

pub use generation::{
    default_safety_settings, GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting,
};
pub use prompts::{get_instruction_template, DEFAULT_TEMPLATE};
pub use timing::{RequestTimingConfig, TimingConfig, TIMING_CONFIG};
