//! Playground - a small self-hosted playground for chatting with LLM provider APIs.
//!
//! The crate has two halves that meet at a [`provider::Provider`] tag:
//!
//! - [`credentials`]: session-scoped storage of named API keys, key selection
//!   and per-provider system prompts.
//! - [`llm`]: the chat adapter that validates a request, dispatches it to the
//!   provider client and normalizes whatever comes back.
//!
//! Everything else ([`server`], [`handlers`], [`client`], [`session`], [`repl`])
//! wires those two halves to an HTTP boundary and an interactive terminal.

pub mod client;
pub mod config;
pub mod credentials;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod provider;
pub mod repl;
pub mod response;
pub mod server;
pub mod session;
