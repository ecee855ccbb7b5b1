//! Provider registry.
//!
//! Constructs the model and image adapters at startup. Both share the
//! `[llm]` connection settings, so they either come up together or fail
//! together when credentials are missing.

use std::sync::Arc;

use ic_domain::config::{Config, LlmStartupPolicy};
use ic_domain::error::{Error, Result};

use crate::openai_images::OpenAiImageProvider;
use crate::openai_responses::OpenAiResponsesProvider;
use crate::traits::{ImageProvider, LlmProvider};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Holds the instantiated adapters.
pub struct ProviderRegistry {
    llm: Option<Arc<dyn LlmProvider>>,
    images: Option<Arc<dyn ImageProvider>>,
    init_errors: Vec<String>,
}

impl ProviderRegistry {
    /// Build the registry from the application [`Config`].
    ///
    /// Adapters that fail to initialize are logged and skipped; the server
    /// still boots and answers 503 on chat. With
    /// [`LlmStartupPolicy::RequireOne`] a failure aborts startup instead.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut init_errors = Vec::new();

        let llm: Option<Arc<dyn LlmProvider>> =
            match OpenAiResponsesProvider::from_config(&config.llm) {
                Ok(p) => {
                    tracing::info!(
                        provider_id = %config.llm.provider_id,
                        model = %config.llm.model,
                        "registered model provider"
                    );
                    Some(Arc::new(p))
                }
                Err(e) => {
                    tracing::warn!(
                        provider_id = %config.llm.provider_id,
                        error = %e,
                        "failed to initialize model provider, skipping"
                    );
                    init_errors.push(format!("llm: {e}"));
                    None
                }
            };

        let images: Option<Arc<dyn ImageProvider>> =
            match OpenAiImageProvider::from_config(&config.llm, &config.images) {
                Ok(p) => {
                    tracing::info!(
                        provider_id = %config.llm.provider_id,
                        model = %config.images.model,
                        "registered image provider"
                    );
                    Some(Arc::new(p))
                }
                Err(e) => {
                    tracing::warn!(
                        provider_id = %config.llm.provider_id,
                        error = %e,
                        "failed to initialize image provider, skipping"
                    );
                    init_errors.push(format!("images: {e}"));
                    None
                }
            };

        if llm.is_none() {
            if config.llm.startup_policy == LlmStartupPolicy::RequireOne {
                return Err(Error::Config(format!(
                    "model provider failed to initialize: {}",
                    init_errors.join("; ")
                )));
            }
            tracing::warn!(
                "no model provider initialized; /api/chat will answer 503 \
                 until auth is configured"
            );
        }

        Ok(Self {
            llm,
            images,
            init_errors,
        })
    }

    /// Assemble a registry from ready-made adapters.
    pub fn from_parts(
        llm: Option<Arc<dyn LlmProvider>>,
        images: Option<Arc<dyn ImageProvider>>,
    ) -> Self {
        Self {
            llm,
            images,
            init_errors: Vec::new(),
        }
    }

    pub fn llm(&self) -> Option<Arc<dyn LlmProvider>> {
        self.llm.clone()
    }

    pub fn images(&self) -> Option<Arc<dyn ImageProvider>> {
        self.images.clone()
    }

    /// Whether a chat turn can run at all.
    pub fn is_ready(&self) -> bool {
        self.llm.is_some()
    }

    /// Errors recorded while building the registry.
    pub fn init_errors(&self) -> &[String] {
        &self.init_errors
    }
}
