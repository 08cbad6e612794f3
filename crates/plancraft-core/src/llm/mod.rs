//! Clients for hosted text-generation services.
//!
//! ```text
//! PlanGenerator --generate_content(ContentRequest)--> &dyn TextGenerator
//!                                                      |-- OpenAiClient
//!                                                      `-- GeminiClient
//! ```

pub mod config;
pub mod gemini;
pub mod openai;
#[cfg(test)]
mod test_server;
pub mod trait_def;

pub use config::{LlmConfig, LlmProvider};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use trait_def::{ContentRequest, LlmError, TextGenerator};
