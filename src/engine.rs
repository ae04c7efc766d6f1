//! Diagram engine integration.
//!
//! The engine runs as separate OS processes. One long-lived process in
//! streaming mode serves render requests over its standard streams; export
//! uses fresh batch processes (see [`crate::export`]).
//!
//! - [`command`] - How the engine is located and invoked
//! - [`framing`] - Splitting the unframed stdout stream into documents
//! - [`session`] - One running process with request correlation
//! - [`supervisor`] - Single-slot lifecycle management with respawn
//! - [`renderer`] - The render operation with its deadline

pub mod command;
pub mod framing;
pub mod renderer;
pub mod session;
pub mod supervisor;

pub use command::EngineCommand;
pub use framing::{FrameDecoder, Framing, FramingMode, SVG_CLOSING_MARKER};
pub use renderer::Renderer;
pub use session::{ExitReport, RenderSession, RequestId};
pub use supervisor::{EngineSupervisor, ExitHandler};
