//! Image loading: classify references, fetch bytes, decode.

pub mod loader;
pub mod model;

pub use loader::ImageLoader;
pub use model::{DecodedImage, ImageRef};
