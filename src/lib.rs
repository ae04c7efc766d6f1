//! # pumlpad - PlantUML Editor Backend
//!
//! The process and file plumbing behind a desktop diagram editor: it keeps a
//! PlantUML engine running in streaming mode for live previews, exports
//! diagrams through one-shot engine runs, and mediates open/save dialogs.
//!
//! ## Features
//!
//! - **Live Rendering**: One long-lived engine process, respawned when it dies
//! - **Request Correlation**: Documents matched to requests over an unframed pipe
//! - **Deadlines**: Renders fail with a timeout instead of hanging
//! - **Export**: Batch conversion with guaranteed cleanup of working files
//! - **Structured Results**: Every bridge operation answers with a value, never a fault
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - TOML configuration
//! - [`engine`] - Engine invocation, process supervision and streaming render
//! - [`export`] - One-shot export to image files
//! - [`files`] - Open, save and save-as
//! - [`dialogs`] - File dialog abstraction
//! - [`gate`] - Exclusivity for dialog-driven operations
//! - [`app`] - Component wiring, bridge messages and the stdio transport

// Core modules
pub mod config;
pub mod error;

// Engine integration
pub mod engine;
pub mod export;

// File and dialog handling
pub mod dialogs;
pub mod files;
pub mod gate;

// Application core
pub mod app;

// Re-export commonly used types for convenience
pub use error::{PumlpadError, Result};

// Public API surface for external usage
pub use app::Application;
pub use config::Config;
pub use engine::{EngineSupervisor, Renderer};
pub use export::Exporter;
pub use files::FileBridge;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
