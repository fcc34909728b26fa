//! Visit egress - writes the filtered visits to file
//!
//! Visits are written in JSONL format (one `placeVisit` object per line,
//! in the export's own field layout) so the user can see exactly which
//! part of their history was checked.

use crate::domain::timeline::PlaceVisit;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for filtered visits
pub struct VisitEgress {
    file_path: String,
}

impl VisitEgress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Replace the egress file with the given visits.
    /// Returns the number of visits written.
    pub fn write_visits(&self, visits: &[PlaceVisit]) -> std::io::Result<usize> {
        match self.write_all(visits) {
            Ok(()) => {
                info!(file = %self.file_path, visits = %visits.len(), "visits_egressed");
                Ok(visits.len())
            }
            Err(e) => {
                error!(file = %self.file_path, error = %e, "visits_egress_failed");
                Err(e)
            }
        }
    }

    fn write_all(&self, visits: &[PlaceVisit]) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for visit in visits {
            let line = serde_json::json!({ "placeVisit": visit });
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        debug!(file = %self.file_path, lines = %visits.len(), "egress_written");

        Ok(())
    }
}
