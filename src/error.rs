use std::fmt;

#[derive(Debug)]
pub enum LensError {
    ConfigError(String),
    RequestError(String),
    ResponseError(String),
    SerializationError(String),
    ImageError(String),
    HttpError(String),
    ApiError(String),
}

impl fmt::Display for LensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LensError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            LensError::RequestError(msg) => write!(f, "Request error: {}", msg),
            LensError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            LensError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            LensError::ImageError(msg) => write!(f, "Image error: {}", msg),
            LensError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            LensError::ApiError(msg) => write!(f, "API error: {}", msg),
        }
    }
}

impl std::error::Error for LensError {}

pub type Result<T> = std::result::Result<T, LensError>;
