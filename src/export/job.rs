//! Temporary files of a single export.

use crate::error::{PumlpadError, Result};
use crate::export::ImageFormat;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Where export working files go when nothing is configured.
///
/// Release builds use `temp/` beside the executable; debug builds use the
/// crate's own `temp/` so development runs stay out of the target tree. The
/// system temp directory is the last resort.
pub fn resolve_temp_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    if cfg!(debug_assertions) {
        return Path::new(env!("CARGO_MANIFEST_DIR")).join("temp");
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("temp")))
        .unwrap_or_else(|| std::env::temp_dir().join("pumlpad"))
}

/// Source and output paths of one export, named after the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    source: PathBuf,
    output: PathBuf,
}

impl ExportJob {
    pub fn new(temp_dir: &Path, format: ImageFormat) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let sequence = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let stem = format!("diagram_export_{millis}_{}_{sequence}", std::process::id());

        let source = temp_dir.join(format!("{stem}.puml"));
        let output = source.with_extension(format.extension());
        Self { source, output }
    }

    /// Markup file handed to the engine
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Image the engine is expected to write next to the source
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub async fn write_source(&self, markup: &str) -> Result<()> {
        tokio::fs::write(&self.source, markup).await.map_err(|e| {
            PumlpadError::file_error(
                format!("Failed to write temporary source {}", self.source.display()),
                e,
            )
        })
    }

    /// Delete both working files.
    ///
    /// Files that were never created are fine; any other failure is logged and
    /// otherwise ignored.
    pub async fn cleanup(&self) {
        for path in [&self.source, &self.output] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    log::warn!("Could not delete temporary file {}: {err}", path.display());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_shares_the_source_stem() {
        let job = ExportJob::new(Path::new("/work/temp"), ImageFormat::Svg);
        assert_eq!(job.source().extension().unwrap(), "puml");
        assert_eq!(job.output().extension().unwrap(), "svg");
        assert_eq!(job.source().file_stem(), job.output().file_stem());
        assert!(job
            .source()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("diagram_export_"));
    }

    #[test]
    fn consecutive_jobs_do_not_collide() {
        let first = ExportJob::new(Path::new("/work"), ImageFormat::Png);
        let second = ExportJob::new(Path::new("/work"), ImageFormat::Png);
        assert_ne!(first.source(), second.source());
    }

    #[test]
    fn configured_temp_dir_wins() {
        assert_eq!(
            resolve_temp_dir(Some(Path::new("/var/tmp/pumlpad"))),
            PathBuf::from("/var/tmp/pumlpad")
        );
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let job = ExportJob::new(dir.path(), ImageFormat::Svg);
        job.write_source("@startuml\n@enduml\n").await.unwrap();

        job.cleanup().await;
        assert!(!job.source().exists());
        assert!(!job.output().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
