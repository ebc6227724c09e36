pub mod args;
pub mod config;
pub mod credential;
pub mod dispatch;
mod error;
pub mod gemini;
pub mod image_payload;
pub mod options;
pub mod request;
pub mod response;
pub mod writer;

pub use error::{Error, Result};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";
/// Per request, explicit and detected images together
pub const MAX_IMAGES: usize = 10;
