//! IO modules - export input and visit output
//!
//! - `export_reader` - reads the named text files of an unpacked export
//! - `egress` - writes the filtered visits to file (JSONL format)
//! - `report` - verdict text and JSON output for a finished check

pub mod egress;
pub mod export_reader;
pub mod report;

// Re-export commonly used types
pub use egress::VisitEgress;
pub use export_reader::{
    DirectoryExport, ExportError, ExportFile, ExportReader, FileSelection, MemoryExport,
};
pub use report::{exit_code, verdict_text, CheckOutput};
