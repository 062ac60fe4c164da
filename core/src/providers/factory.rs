use crate::config::ClientConfig;
use crate::error::{NewsdeskError, Result};
use crate::providers::{GeminiProvider, OpenAIProvider};
use crate::traits::Provider;
use std::sync::Arc;

pub fn create_provider(config: &ClientConfig) -> Result<Arc<dyn Provider>> {
    let api_key = config.require_api_key()?;

    match config.provider.to_lowercase().as_str() {
        "gemini" => {
            let mut provider = GeminiProvider::new(api_key).with_model(config.model());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let mut provider = OpenAIProvider::new(api_key).with_model(config.model());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        other => Err(NewsdeskError::Configuration(format!(
            "Unknown provider: {}. Available: gemini, openai",
            other
        ))),
    }
}
