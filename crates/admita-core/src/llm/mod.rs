//! Backend capabilities
//!
//! Narrow interfaces over external inference services. The core depends only
//! on [`Embedder`] and [`ChatModel`]; one HTTP implementation covers any
//! OpenAI-compatible provider, and tests substitute deterministic stubs.

mod client;
mod retry;
mod traits;

pub use client::HttpClient;
pub use retry::RetryPolicy;
pub use traits::{ChatMessage, ChatModel, Embedder};
