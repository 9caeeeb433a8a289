//! HTTP handlers for the multimodal gateway.

pub mod audio;
pub mod form;
pub mod health;
pub mod image;
pub mod media;
pub mod multimodal;
pub mod pages;
pub mod text;

pub use audio::generate_from_audio;
pub use health::{health_check, metrics, readiness_check};
pub use image::generate_from_image;
pub use multimodal::generate_from_multimodal;
pub use pages::{index, spec};
pub use text::generate_text;
