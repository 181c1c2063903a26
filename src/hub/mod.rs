pub mod chat_client;
pub mod preview_client;

use crate::{
    config::{HubConfig, DEFAULT_BASE_URL},
    error::Result,
    LensError,
};

pub use chat_client::ChatClient;
pub use preview_client::PreviewClient;

/// Entry point for everything that talks to the network: the hosted
/// chat-completion endpoint and user-supplied image URLs. One underlying
/// HTTP client is shared by both concerns.
#[derive(Clone)]
pub struct HubClient {
    chat_client: ChatClient,
    preview_client: PreviewClient,
}

impl HubClient {
    pub fn new(config: HubConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LensError::ConfigError("no API key configured; set HF_API_KEY".into())
        })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let http = reqwest::Client::new();

        Ok(Self {
            chat_client: ChatClient::new(http.clone(), base_url, api_key, &config),
            preview_client: PreviewClient::new(http),
        })
    }

    pub fn chat(&self) -> &ChatClient {
        &self.chat_client
    }

    pub fn preview(&self) -> &PreviewClient {
        &self.preview_client
    }
}
