//! Shiritori server - HTTP API and LLM opponents for the shiritori engine
//!
//! # Architecture
//!
//! - **Api**: axum router exposing `POST /api/ai_move`
//! - **LLM client**: OpenAI, Anthropic and Gemini as the opponent's primary source
//! - **Config**: TOML settings plus API keys from the environment
//! - **Play**: a terminal game loop
//!
//! # Example
//!
//! ```no_run
//! use shiritori_server::{ServerConfig, router};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let referee = ServerConfig::load("shiritori.toml")?.referee()?;
//! let app = router(Arc::new(referee));
//! let listener = tokio::net::TcpListener::bind(("127.0.0.1", 8000)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
pub mod cli;
mod config;
mod llm_client;
mod play;

// Crate-level exports - HTTP API
pub use api::{AiMoveRequest, AiMoveResponse, ApiError, ErrorBody, WireWinner, router};

// Crate-level exports - Configuration
pub use config::{ConfigError, GEMINI_MODEL_VAR, OpponentConfig, ServerConfig};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Terminal play
pub use play::play;
