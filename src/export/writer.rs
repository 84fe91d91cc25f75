//! Export file output
//!
//! Writes the fixed import file MarketFeeder watches, its dated history copy
//! and the audit CSV. Every file goes through [`atomic_write`].

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::exporter::ExportOutput;
use crate::data::csv_loader::audit_frame;
use crate::data::files::{atomic_write, write_frame_atomic};
use crate::error::PipelineError;

/// Name of the fixed import file
pub const FIXED_FILE_NAME: &str = "import_selections.txt";

/// Output locations for one export day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPaths {
    pub fixed: PathBuf,
    pub history: PathBuf,
    pub audit: PathBuf,
}

impl ExportPaths {
    pub fn for_date(marketfeeder_dir: &Path, history_dir: &Path, date: &str) -> Self {
        Self {
            fixed: marketfeeder_dir.join(FIXED_FILE_NAME),
            history: history_dir.join(format!("import_selections_{}.txt", date)),
            audit: history_dir.join(format!("import_selections_{}_audit.csv", date)),
        }
    }
}

/// Write the three export files. The fixed file and the history copy carry
/// the same content.
pub fn write_export_files(paths: &ExportPaths, output: &ExportOutput) -> Result<(), PipelineError> {
    let content = output.content();

    atomic_write(&paths.fixed, content.as_bytes())?;
    info!("Fixed import file updated: {}", paths.fixed.display());

    atomic_write(&paths.history, content.as_bytes())?;
    info!("Daily history saved: {}", paths.history.display());

    let mut audit = audit_frame(&output.audit)?;
    write_frame_atomic(&paths.audit, &mut audit)?;
    info!("Audit saved: {}", paths.audit.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strategy::CategoryRules;
    use crate::export::exporter::SelectionExporter;
    use crate::models::{ForecastRow, RaceFields};
    use std::fs;

    fn output() -> ExportOutput {
        let row = ForecastRow {
            race: RaceFields {
                date: "2025-01-14".to_string(),
                track: "Yarmouth".to_string(),
                track_key: "Yarmouth".to_string(),
                hhmm: "13:10".to_string(),
                category_raw: "OR".to_string(),
                category_norm: "OR".to_string(),
            },
            names: ["Dog One".into(), "Dog Two".into(), "Dog Three".into()],
            odds: [None; 3],
        };
        SelectionExporter::new(CategoryRules::default()).export(&[row], "2025-01-14")
    }

    #[test]
    fn test_paths_for_date() {
        let paths = ExportPaths::for_date(Path::new("mf"), Path::new("mf/history"), "2025-01-14");
        assert_eq!(paths.fixed, Path::new("mf/import_selections.txt"));
        assert_eq!(paths.history, Path::new("mf/history/import_selections_2025-01-14.txt"));
        assert_eq!(
            paths.audit,
            Path::new("mf/history/import_selections_2025-01-14_audit.csv")
        );
    }

    #[test]
    fn test_write_export_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::for_date(dir.path(), &dir.path().join("history"), "2025-01-14");

        write_export_files(&paths, &output()).unwrap();

        let fixed = fs::read_to_string(&paths.fixed).unwrap();
        assert_eq!(fixed.lines().count(), 3);
        assert!(fixed.starts_with("[13:10 Yarmouth]Dog One\t\"BACK\"\t1.0\n"));
        assert!(!fixed.ends_with('\n'));
        assert_eq!(fs::read_to_string(&paths.history).unwrap(), fixed);

        let audit = fs::read_to_string(&paths.audit).unwrap();
        assert!(audit.starts_with(
            "date,track,hhmm,category_raw,category_norm,dog_name,strategy_tag,stake\n"
        ));
        assert_eq!(audit.lines().count(), 4);
    }

    #[test]
    fn test_rewrite_replaces_fixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::for_date(dir.path(), &dir.path().join("history"), "2025-01-14");
        fs::write(&paths.fixed, "stale").unwrap();

        write_export_files(&paths, &output()).unwrap();
        assert!(!fs::read_to_string(&paths.fixed).unwrap().contains("stale"));
    }
}
