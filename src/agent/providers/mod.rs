//! Concrete [`LlmProvider`](super::provider::LlmProvider) implementations.

mod openai;

pub use openai::{GROQ_API_BASE, OpenAiProvider};
