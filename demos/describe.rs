use llamalens::{DescribeRequest, HubClient, HubConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    llamalens::logger::init()?;

    let api_key = env::var("HF_API_KEY")?;
    let config = HubConfig::new().with_api_key(api_key);

    let client = HubClient::new(config)?;
    let request = DescribeRequest {
        prompt: "Describe this image in a paragraph".to_string(),
        image_url: "https://upload.wikimedia.org/wikipedia/commons/thumb/2/26/YellowLabradorLooking_new.jpg/640px-YellowLabradorLooking_new.jpg".to_string(),
        model_id: None,
        max_tokens: Some(500),
        temperature: None,
    };

    let response = client.chat().describe(request).await?;
    println!("{}", response.text);

    Ok(())
}
