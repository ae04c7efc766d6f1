//! File dialog abstraction.
//!
//! Handlers never talk to a windowing toolkit directly. They describe the
//! dialog they need and a [`FileDialogs`] implementation answers with a path,
//! or `None` when the user dismissed it.

pub mod preset;

#[cfg(feature = "native-dialogs")]
pub mod native;

use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(feature = "native-dialogs")]
pub use native::NativeDialogs;
pub use preset::PresetDialogs;

/// Named group of file extensions shown in a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    pub fn all_files() -> Self {
        Self::new("All Files", &["*"])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenDialogOptions {
    pub title: Option<String>,
    pub filters: Vec<FileFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveDialogOptions {
    pub title: Option<String>,
    /// File name pre-filled in the dialog
    pub default_file_name: String,
    pub filters: Vec<FileFilter>,
}

/// Source of user answers to open and save dialogs
#[async_trait]
pub trait FileDialogs: Send + Sync {
    /// Ask for an existing file to open; `None` means canceled
    async fn pick_file(&self, options: OpenDialogOptions) -> Option<PathBuf>;

    /// Ask for a destination to write to; `None` means canceled
    async fn save_file(&self, options: SaveDialogOptions) -> Option<PathBuf>;
}
