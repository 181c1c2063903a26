pub mod chat;
pub mod preview;

pub use chat::*;
pub use preview::*;
