//! Export sinks for multi-page documents
//!
//! This module handles:
//! - Naming each run's artifact uniquely
//! - Writing the document incrementally to disk (or memory)
//! - Returning the address the artifact can be downloaded from

mod file;
mod memory;
mod traits;

pub use file::FileExportSink;
pub use memory::MemoryExportSink;
pub use traits::{export_file_name, ExportError, ExportResult, ExportSink};
