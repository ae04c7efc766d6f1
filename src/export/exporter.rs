//! The export operation: batch render, save dialog, copy, cleanup.

use crate::app::messages::ExportResult;
use crate::config::ExportConfig;
use crate::dialogs::{FileDialogs, FileFilter, SaveDialogOptions};
use crate::engine::EngineCommand;
use crate::error::{PumlpadError, Result};
use crate::export::{resolve_temp_dir, ExportJob, ImageFormat};
use crate::files::ensure_extension;
use crate::gate::BusyGate;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Exporter {
    command: EngineCommand,
    format: ImageFormat,
    temp_dir: PathBuf,
    default_file_name: String,
    dialogs: Arc<dyn FileDialogs>,
    gate: BusyGate,
}

impl Exporter {
    pub fn new(
        command: EngineCommand,
        config: &ExportConfig,
        dialogs: Arc<dyn FileDialogs>,
        gate: BusyGate,
    ) -> Self {
        Self {
            command,
            format: config.format,
            temp_dir: resolve_temp_dir(config.temp_dir.as_deref()),
            default_file_name: config.default_file_name.clone(),
            dialogs,
            gate,
        }
    }

    /// Export `markup` to a file the user picks.
    ///
    /// Returns `canceled` without touching the filesystem when another dialog
    /// operation holds the gate, and `canceled` after cleanup when the user
    /// dismisses the save dialog.
    pub async fn export_to_file(&self, markup: &str) -> ExportResult {
        let Some(_busy) = self.gate.try_enter() else {
            log::debug!("Export rejected: another dialog operation is in progress");
            return ExportResult::canceled();
        };

        if let Err(err) = tokio::fs::create_dir_all(&self.temp_dir).await {
            let err = PumlpadError::file_error(
                format!("Failed to create temp directory {}", self.temp_dir.display()),
                err,
            );
            log::error!("Export failed: {err}");
            return ExportResult::failed(&err);
        }

        let job = ExportJob::new(&self.temp_dir, self.format);
        let outcome = self.run(&job, markup).await;
        job.cleanup().await;

        match outcome {
            Ok(path) => {
                log::debug!("Exported diagram to {}", path.display());
                ExportResult::saved(path)
            }
            Err(PumlpadError::DialogCanceled) => {
                log::debug!("Export canceled at the save dialog");
                ExportResult::canceled()
            }
            Err(err) => {
                log::error!("Export failed: {err}");
                ExportResult::failed(&err)
            }
        }
    }

    async fn run(&self, job: &ExportJob, markup: &str) -> Result<PathBuf> {
        job.write_source(markup).await?;
        self.convert(job).await?;

        let target = self
            .dialogs
            .save_file(self.save_options())
            .await
            .ok_or(PumlpadError::DialogCanceled)?;
        let target = ensure_extension(target, self.format.extension());

        tokio::fs::copy(job.output(), &target).await.map_err(|e| {
            PumlpadError::file_error(format!("Failed to write {}", target.display()), e)
        })?;
        Ok(target)
    }

    /// Run the batch engine and check that it produced the expected file.
    async fn convert(&self, job: &ExportJob) -> Result<()> {
        let output = self
            .command
            .batch(self.format, job.source())
            .output()
            .await
            .map_err(|source| PumlpadError::EngineSpawn {
                program: self.command.program().to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("Engine exited with {}", output.status),
                detail => detail.to_string(),
            };
            return Err(PumlpadError::export_failed(message));
        }

        if !tokio::fs::try_exists(job.output()).await.unwrap_or(false) {
            return Err(PumlpadError::export_failed(format!(
                "Engine did not produce {}; check the diagram syntax and the engine installation",
                job.output().display()
            )));
        }
        Ok(())
    }

    fn save_options(&self) -> SaveDialogOptions {
        SaveDialogOptions {
            title: Some(self.format.dialog_title().to_string()),
            default_file_name: format!("{}.{}", self.default_file_name, self.format.extension()),
            filters: vec![self.format.dialog_filter(), FileFilter::all_files()],
        }
    }
}
