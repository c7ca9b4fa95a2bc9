//! Completion gateway implementations for pagecraft.
//!
//! One backend today: any OpenAI-compatible `/chat/completions` endpoint
//! (OpenAI, OpenRouter, Ollama, vLLM, ...). The gateway performs exactly one
//! non-streaming round trip per agent turn.

pub mod openai;

pub use openai::OpenAiGateway;
