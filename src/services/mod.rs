// Service exports
pub mod openai;

pub use openai::{LlmError, OpenAiClient, OpenAiConfig};
