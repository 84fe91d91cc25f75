//! MarketFeeder selection export

pub mod exporter;
pub mod writer;

pub use exporter::{ExportOutput, ExportSummary, SelectionExporter, ALL_ACTIVE_SENTINEL};
pub use writer::{write_export_files, ExportPaths, FIXED_FILE_NAME};
