use std::env;

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MODEL_ID: &str = "meta-llama/Llama-3.2-11B-Vision-Instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_PORT: u16 = 7878;
pub const DEFAULT_PREVIEW_MAX_HEIGHT: u32 = 600;

/// Settings for the hosted chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_id: Option<String>,
    pub max_tokens: Option<u32>,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            api_key: None,
            base_url: None,
            model_id: None,
            max_tokens: None,
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("HF_API_KEY").ok();
        let base_url = env::var("LLAMALENS_BASE_URL").ok();
        let model_id = env::var("LLAMALENS_MODEL").ok();
        let max_tokens = env::var("LLAMALENS_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok());

        HubConfig {
            api_key,
            base_url,
            model_id,
            max_tokens,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Model identifier with the default applied.
    pub fn resolved_model_id(&self) -> String {
        self.model_id
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub preview_max_height: Option<u32>,
    pub hub: Option<HubConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            preview_max_height: None,
            hub: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let preview_max_height = env::var("PREVIEW_MAX_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok());

        Config {
            port,
            preview_max_height,
            hub: Some(HubConfig::from_env()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_preview_max_height(mut self, max_height: u32) -> Self {
        self.preview_max_height = Some(max_height);
        self
    }

    pub fn with_hub(mut self, config: HubConfig) -> Self {
        self.hub = Some(config);
        self
    }
}
