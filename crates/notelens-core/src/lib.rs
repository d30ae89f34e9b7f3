//! notelens core library
//!
//! Loads the images of a social-media post and asks a multimodal model
//! (Gemini) to describe them.

pub mod config;
pub mod error;
pub mod images;
pub mod post;
pub mod vision;

pub use config::Config;
pub use error::{NotelensError, NotelensResult};
pub use post::{analyze_post, PostInput};
pub use vision::AnalysisOutcome;
