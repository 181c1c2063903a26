use llamalens::{server, ChatClient, Config, HubClient, HubConfig};
use std::env;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    llamalens::logger::init_with_config(
        llamalens::logger::LoggerConfig::development()
            .with_level(llamalens::logger::LogLevel::Debug),
    )?;

    log::info!("🔍 Checking inference environment...");

    // Check the credential (without printing the actual value for security)
    match env::var("HF_API_KEY") {
        Ok(api_key) => {
            log::info!("✅ API key found in environment");
            log::debug!(
                "API key starts with: {}...",
                &api_key[..5.min(api_key.len())]
            );
        }
        Err(_) => {
            log::warn!("⚠️  HF_API_KEY not set in environment");
            log::error!("❌ Inference calls will fail until it is configured");
        }
    }

    let config = Config::from_env();
    llamalens::logger::log_config_info(&config);

    log::info!("📚 Known vision models:");
    for (id, name, provider) in ChatClient::supported_models() {
        log::info!("  {} - {} ({})", id, name, provider);
    }

    log::info!("🔄 Creating hub client...");
    let hub_config = config.hub.clone().unwrap_or_else(HubConfig::from_env);
    let client = match HubClient::new(hub_config) {
        Ok(client) => {
            log::info!("✅ Hub client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize hub client: {}", e);
            return Err(e.into());
        }
    };

    llamalens::logger::log_startup_info(
        "llamalens",
        env!("CARGO_PKG_VERSION"),
        config.port.unwrap_or(llamalens::config::DEFAULT_PORT),
    );

    server::run(config, client).await?;

    Ok(())
}
