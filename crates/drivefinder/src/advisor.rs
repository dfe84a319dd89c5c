//! CarAdvisor ties prompt assembly to the model call for one submission

use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::get_instruction_template;
use crate::error::Result;
use crate::model::{ModelClient, ModelConfig, ModelReply};
use crate::prompt::{PromptBuilder, UserPreferences};

/// Configuration for the CarAdvisor
#[derive(Debug, Clone, Default)]
pub struct AdvisorConfig {
    pub instruction_template: Option<String>,
    pub verbose: bool,
}

impl AdvisorConfig {
    /// Create a new AdvisorConfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom instruction template
    pub fn with_instruction_template(mut self, template: impl Into<String>) -> Self {
        self.instruction_template = Some(template.into());
        self
    }

    /// Set verbose mode
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the instruction template (custom or built-in)
    pub fn get_instruction_template(&self) -> String {
        get_instruction_template(self.instruction_template.as_deref())
    }
}

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub reply: ModelReply,
    /// Image sent along with the prompt, shown next to the reply
    pub image_path: Option<PathBuf>,
}

/// Turns a preference record into car suggestions
pub struct CarAdvisor {
    advisor_config: AdvisorConfig,
    builder: PromptBuilder,
    model_client: ModelClient,
}

impl CarAdvisor {
    /// Create a new CarAdvisor
    ///
    /// Fails on an unusable model configuration, so a missing credential
    /// surfaces at startup rather than on the first submission.
    pub fn new(model_config: ModelConfig, advisor_config: Option<AdvisorConfig>) -> Result<Self> {
        let model_client = ModelClient::new(model_config)?;
        Ok(Self::with_client(model_client, advisor_config.unwrap_or_default()))
    }

    /// Create a CarAdvisor around an existing client
    pub fn with_client(model_client: ModelClient, advisor_config: AdvisorConfig) -> Self {
        let builder = PromptBuilder::new(advisor_config.get_instruction_template());
        Self {
            advisor_config,
            builder,
            model_client,
        }
    }

    /// Build the prompt and ask the model for suggestions
    pub async fn suggest(&self, prefs: &UserPreferences) -> Result<Suggestion> {
        let prompt = self.builder.build(prefs).await?;

        if self.advisor_config.verbose {
            info!("Prompt text:\n{}", prompt.text);
        }
        info!(
            "Requesting suggestions from {} (image: {})",
            self.model_client.config().model_name,
            prompt.attachment.is_some()
        );

        let reply = match self.model_client.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Suggestion request failed: {}", e);
                return Err(e);
            }
        };

        Ok(Suggestion {
            reply,
            image_path: prefs.image.as_ref().map(|i| i.path.clone()),
        })
    }

    /// Get the model client
    pub fn model_client(&self) -> &ModelClient {
        &self.model_client
    }

    /// Get the advisor config
    pub fn advisor_config(&self) -> &AdvisorConfig {
        &self.advisor_config
    }
}
