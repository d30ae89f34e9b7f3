//! Vision analysis module.
//!
//! Builds the multi-part request (prompt, post text, source URLs, images)
//! and sends it to a multimodal model, Gemini by default.

pub mod analyzer;
pub mod gemini;
pub mod prompt;
pub mod request;

pub use analyzer::{AnalysisOutcome, VisionAnalyzer, VisionModel};
pub use gemini::GeminiClient;
pub use request::{AnalysisRequest, RequestPart};
