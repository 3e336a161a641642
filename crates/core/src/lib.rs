//! Core library for the melon ripper.
//!
//! The crate records one frame of DS 3D engine commands and writes it, along
//! with the VRAM and register state that was live when that frame was
//! rendered, as a single dump file. Each module owns one piece: command and
//! snapshot encoding, the capture state machine that decides which frame to
//! keep, the sinks that persist finished dumps, and a reader for inspecting
//! them afterwards.

pub mod artifact;
pub mod capture;
pub mod command;
pub mod config;
pub mod decode;
pub mod error;
pub mod snapshot;

pub use artifact::{sanitize_title, ArtifactSink, FileSink, MemorySink};
pub use capture::{DisplayOutcome, Ripper};
pub use command::{CommandRecord, Polygon, Vertex};
pub use config::RipperConfig;
pub use decode::{decode, Artifact, ArtifactSummary, Snapshot};
pub use error::{Result, RipError};
pub use snapshot::{RenderState, VramBank, VramBanks};
