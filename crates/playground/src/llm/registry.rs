//! Provider registry for managing LLM provider clients.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info};

use super::gemini::GeminiProvider;
use super::provider::LLMProvider;
use crate::config::ProvidersConfig;
use crate::provider::Provider;

/// Registry of provider clients, keyed by provider.
///
/// A provider without a registered client is a placeholder: it is known, but
/// requests for it are answered with "not implemented".
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the native client of every provider that has one.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let client = Client::new();
        let mut registry = Self::new();

        for provider in Provider::ALL {
            match provider {
                Provider::Gemini => {
                    let gemini = GeminiProvider::new(client.clone(), config.gemini.base_url.clone());
                    registry.register(provider, Arc::new(gemini));
                    info!(base_url = %config.gemini.base_url, "Registered Gemini provider");
                }
                Provider::Gpt | Provider::Claude => {
                    debug!(%provider, "No client for provider yet");
                }
            }
        }

        registry
    }

    /// Register a provider implementation.
    pub fn register(&mut self, provider: Provider, implementation: Arc<dyn LLMProvider>) {
        self.providers.insert(provider, implementation);
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Get a provider client.
    pub fn get(&self, provider: Provider) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(&provider).cloned()
    }
}
