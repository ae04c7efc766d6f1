//! Dialogs answered from paths fixed up front.
//!
//! Used by the command line, where the destination is an argument, and by
//! headless embedders. A missing answer behaves like the user canceling.

use crate::dialogs::{FileDialogs, OpenDialogOptions, SaveDialogOptions};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct PresetDialogs {
    open: Option<PathBuf>,
    save: Option<PathBuf>,
}

impl PresetDialogs {
    /// Dialogs that cancel every request
    pub fn canceling() -> Self {
        Self::default()
    }

    pub fn with_open(mut self, path: impl Into<PathBuf>) -> Self {
        self.open = Some(path.into());
        self
    }

    /// Destination for save dialogs. An existing directory receives the
    /// dialog's default file name.
    pub fn with_save(mut self, path: impl Into<PathBuf>) -> Self {
        self.save = Some(path.into());
        self
    }
}

#[async_trait]
impl FileDialogs for PresetDialogs {
    async fn pick_file(&self, _options: OpenDialogOptions) -> Option<PathBuf> {
        self.open.clone()
    }

    async fn save_file(&self, options: SaveDialogOptions) -> Option<PathBuf> {
        let path = self.save.clone()?;
        if tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            return Some(path.join(options.default_file_name));
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canceling_dialogs_answer_nothing() {
        let dialogs = PresetDialogs::canceling();
        assert!(dialogs.pick_file(OpenDialogOptions::default()).await.is_none());
        assert!(dialogs.save_file(SaveDialogOptions::default()).await.is_none());
    }

    #[tokio::test]
    async fn save_into_directory_uses_default_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let dialogs = PresetDialogs::default().with_save(dir.path());

        let options = SaveDialogOptions {
            default_file_name: "diagram.svg".to_string(),
            ..SaveDialogOptions::default()
        };
        assert_eq!(
            dialogs.save_file(options).await,
            Some(dir.path().join("diagram.svg"))
        );
    }

    #[tokio::test]
    async fn save_to_file_path_is_returned_as_is() {
        let dialogs = PresetDialogs::default().with_save("/tmp/out/chart");
        assert_eq!(
            dialogs.save_file(SaveDialogOptions::default()).await,
            Some(PathBuf::from("/tmp/out/chart"))
        );
    }
}
