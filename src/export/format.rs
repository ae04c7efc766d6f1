//! Image formats the batch engine can produce.

use crate::dialogs::FileFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Vector output, the default
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    /// File extension the engine gives its output, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn engine_flag(self) -> &'static str {
        match self {
            Self::Svg => "-tsvg",
            Self::Png => "-tpng",
        }
    }

    pub fn dialog_filter(self) -> FileFilter {
        match self {
            Self::Svg => FileFilter::new("SVG Vector Image", &["svg"]),
            Self::Png => FileFilter::new("PNG Image", &["png"]),
        }
    }

    pub fn dialog_title(self) -> &'static str {
        match self {
            Self::Svg => "Export SVG Image",
            Self::Png => "Export PNG Image",
        }
    }
}
