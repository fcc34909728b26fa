//! Export reader - yields the named text files of a location-history export
//!
//! Decompression is left to the user (or another tool): the reader walks an
//! unpacked Takeout tree, or serves files already held in memory.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// A text file from the export, named by its path relative to the export root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub text: String,
}

impl ExportFile {
    pub fn new(name: &str, text: &str) -> Self {
        Self { name: name.to_string(), text: text.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export not found at {path}")]
    NotFound { path: String },

    #[error("{path} is a zip archive; unpack it and point to the extracted folder")]
    Archive { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which files of the export to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// Every `.json` file
    AllJson,
    /// Only files whose final path component is one of these names
    Named(Vec<String>),
}

impl FileSelection {
    pub fn matches(&self, name: &str) -> bool {
        let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
        match self {
            FileSelection::AllJson => file_name.ends_with(".json"),
            FileSelection::Named(names) => names.iter().any(|n| n == file_name),
        }
    }
}

/// Source of export files
pub trait ExportReader {
    fn read_files(&self, selection: &FileSelection) -> Result<Vec<ExportFile>, ExportError>;
}

/// Files held in memory (already decompressed by the caller)
#[derive(Debug, Clone, Default)]
pub struct MemoryExport {
    files: Vec<ExportFile>,
}

impl MemoryExport {
    pub fn new(files: Vec<ExportFile>) -> Self {
        Self { files }
    }
}

impl ExportReader for MemoryExport {
    fn read_files(&self, selection: &FileSelection) -> Result<Vec<ExportFile>, ExportError> {
        Ok(self.files.iter().filter(|f| selection.matches(&f.name)).cloned().collect())
    }
}

/// An unpacked export on disk.
///
/// Pointing at a single `.json` file reads just that file, whatever the
/// selection says.
#[derive(Debug, Clone)]
pub struct DirectoryExport {
    root: PathBuf,
}

impl DirectoryExport {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Collect every file path under `dir`, sorted for a stable read order.
    /// Symlinked directories are not descended into.
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ExportError> {
        let entries = fs::read_dir(dir).map_err(|source| ExportError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ExportError::Io {
                path: dir.display().to_string(),
                source,
            })?;
            let is_dir = entry
                .file_type()
                .map_err(|source| ExportError::Io { path: entry.path().display().to_string(), source })?
                .is_dir();
            paths.push((entry.path(), is_dir));
        }
        paths.sort();

        for (path, is_dir) in paths {
            if is_dir {
                Self::walk(&path, out)?;
            } else {
                out.push(path);
            }
        }
        Ok(())
    }

    fn relative_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn read_text(path: &Path) -> Result<String, ExportError> {
        fs::read_to_string(path)
            .map_err(|source| ExportError::Io { path: path.display().to_string(), source })
    }
}

impl ExportReader for DirectoryExport {
    fn read_files(&self, selection: &FileSelection) -> Result<Vec<ExportFile>, ExportError> {
        let root_display = self.root.display().to_string();
        if !self.root.exists() {
            return Err(ExportError::NotFound { path: root_display });
        }
        if self.root.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip")) {
            return Err(ExportError::Archive { path: root_display });
        }

        if self.root.is_file() {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root_display.clone());
            info!(file = %name, "export_single_file");
            return Ok(vec![ExportFile { name, text: Self::read_text(&self.root)? }]);
        }

        let mut paths = Vec::new();
        Self::walk(&self.root, &mut paths)?;

        let mut files = Vec::new();
        for path in paths {
            let name = self.relative_name(&path);
            if !selection.matches(&name) {
                continue;
            }
            debug!(file = %name, "export_file_selected");
            files.push(ExportFile { text: Self::read_text(&path)?, name });
        }

        info!(root = %root_display, files = %files.len(), "export_read");
        Ok(files)
    }
}
