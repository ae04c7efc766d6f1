//! One-shot export of a diagram to an image file.
//!
//! Each export runs its own batch-mode engine process against a temporary
//! source file, then hands the generated image to the user through a save
//! dialog. Temporary files never outlive the call.

pub mod exporter;
pub mod format;
pub mod job;

pub use exporter::Exporter;
pub use format::ImageFormat;
pub use job::{resolve_temp_dir, ExportJob};
