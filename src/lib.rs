pub mod config;
pub mod error;
pub mod hub;
pub mod logger;
pub mod models;
pub mod server;

pub use config::{Config, HubConfig};
pub use error::{LensError, Result};
pub use hub::{ChatClient, HubClient, PreviewClient};
pub use models::{DescribeRequest, DescribeResponse, ImagePreview, StreamChunk};
