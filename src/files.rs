//! Open, save and save-as for diagram sources.

use crate::app::messages::{OpenFileResult, SaveResult};
use crate::dialogs::{FileDialogs, FileFilter, OpenDialogOptions, SaveDialogOptions};
use crate::error::PumlpadError;
use crate::gate::BusyGate;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extension given to sources saved through save-as
pub const SOURCE_EXTENSION: &str = "puml";

/// Append `.extension` unless the file name already ends with it (any case).
///
/// The suffix is appended, never substituted: `chart.txt` becomes
/// `chart.txt.puml`. A bare `.svg` counts as ending in `.svg`.
pub fn ensure_extension(path: PathBuf, extension: &str) -> PathBuf {
    let suffix = format!(".{}", extension.to_ascii_lowercase());
    let matches = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_ascii_lowercase().ends_with(&suffix));
    if matches {
        return path;
    }
    let mut raw = OsString::from(path);
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// Filesystem operations behind the dialog abstraction
pub struct FileBridge {
    dialogs: Arc<dyn FileDialogs>,
    gate: BusyGate,
}

impl FileBridge {
    pub fn new(dialogs: Arc<dyn FileDialogs>, gate: BusyGate) -> Self {
        Self { dialogs, gate }
    }

    /// Let the user pick a diagram source and read it.
    pub async fn open_file(&self) -> OpenFileResult {
        let Some(_busy) = self.gate.try_enter() else {
            return OpenFileResult::canceled();
        };

        let options = OpenDialogOptions {
            title: Some("Open Diagram".to_string()),
            filters: vec![FileFilter::new("PlantUML Files", &["puml", "plantuml", "txt"])],
        };
        let Some(path) = self.dialogs.pick_file(options).await else {
            return OpenFileResult::canceled();
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => OpenFileResult::opened(path, content),
            Err(err) => {
                let err =
                    PumlpadError::file_error(format!("Failed to read {}", path.display()), err);
                log::error!("{err}");
                OpenFileResult::failed(path, &err)
            }
        }
    }

    /// Overwrite a path the caller already has.
    pub async fn save_file(&self, path: &Path, content: &str) -> SaveResult {
        match write_source(path, content).await {
            Ok(()) => SaveResult::written(),
            Err(err) => SaveResult::failed(&err),
        }
    }

    /// Ask for a destination, then write.
    pub async fn save_file_as(&self, content: &str) -> SaveResult {
        let Some(_busy) = self.gate.try_enter() else {
            return SaveResult::canceled();
        };

        let options = SaveDialogOptions {
            title: Some("Save Diagram".to_string()),
            default_file_name: format!("untitled.{SOURCE_EXTENSION}"),
            filters: vec![FileFilter::new("PlantUML", &[SOURCE_EXTENSION])],
        };
        let Some(path) = self.dialogs.save_file(options).await else {
            return SaveResult::canceled();
        };
        let path = ensure_extension(path, SOURCE_EXTENSION);

        match write_source(&path, content).await {
            Ok(()) => SaveResult::saved(path),
            Err(err) => SaveResult::failed(&err),
        }
    }
}

async fn write_source(path: &Path, content: &str) -> crate::Result<()> {
    tokio::fs::write(path, content).await.map_err(|e| {
        let err = PumlpadError::file_error(format!("Failed to write {}", path.display()), e);
        log::error!("{err}");
        err
    })
}
