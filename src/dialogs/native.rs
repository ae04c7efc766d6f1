//! OS-native dialogs through `rfd`, run on the blocking pool.

use crate::dialogs::{FileDialogs, FileFilter, OpenDialogOptions, SaveDialogOptions};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDialogs;

fn with_filters(mut dialog: rfd::FileDialog, filters: &[FileFilter]) -> rfd::FileDialog {
    for filter in filters {
        dialog = dialog.add_filter(filter.name.as_str(), filter.extensions.as_slice());
    }
    dialog
}

#[async_trait]
impl FileDialogs for NativeDialogs {
    async fn pick_file(&self, options: OpenDialogOptions) -> Option<PathBuf> {
        let picked = tokio::task::spawn_blocking(move || {
            let mut dialog = with_filters(rfd::FileDialog::new(), &options.filters);
            if let Some(title) = options.title {
                dialog = dialog.set_title(title);
            }
            dialog.pick_file()
        })
        .await;

        picked.unwrap_or_else(|err| {
            log::error!("Open dialog task failed: {err}");
            None
        })
    }

    async fn save_file(&self, options: SaveDialogOptions) -> Option<PathBuf> {
        let chosen = tokio::task::spawn_blocking(move || {
            let mut dialog = with_filters(rfd::FileDialog::new(), &options.filters)
                .set_file_name(options.default_file_name);
            if let Some(title) = options.title {
                dialog = dialog.set_title(title);
            }
            dialog.save_file()
        })
        .await;

        chosen.unwrap_or_else(|err| {
            log::error!("Save dialog task failed: {err}");
            None
        })
    }
}
