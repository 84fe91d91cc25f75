//! Table loading, record building and atomic file output

pub mod builder;
pub mod csv_loader;
pub mod files;

// Re-export commonly used types
pub use builder::{BuildOutput, BuildSummary, DropReason, ForecastRecordBuilder, PastRaceFilter};
pub use csv_loader::{
    audit_frame, forecast_frame, load_forecast_table, load_raw_forecast, load_top3_table,
    raw_frame, top3_frame,
};
pub use files::{atomic_write, write_frame_atomic};
