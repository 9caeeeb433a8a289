//! Multimodal gateway: relays text, image and audio prompts to Gemini over HTTP.

pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
