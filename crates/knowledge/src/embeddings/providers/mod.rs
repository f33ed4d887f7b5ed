//! Embedding provider implementations.

pub(crate) mod http;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;
