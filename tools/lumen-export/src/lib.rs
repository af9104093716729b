//! lumen-export library
//!
//! Asset conversion functions shared by the command-line front end and its
//! batch builder.

pub mod inspect;
pub mod manifest;
pub mod mesh;
pub mod shell;
pub mod texture;

// Re-export the format constants (magics and extensions)
pub use lumen_assets::{AssetFormat, LUMEN_FORMAT};

// Re-export key types for conversion
pub use mesh::{ConvertedModel, convert_mesh};
pub use texture::{ConvertedTexture, convert_image};
