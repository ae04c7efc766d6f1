//! Request and result types exchanged with the presentation layer.
//!
//! Every handler answers with one of these values; errors never cross the
//! bridge as faults. Field names follow the camelCase shape the UI expects.

use crate::error::PumlpadError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Outcome of a streaming render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub timed_out: bool,
}

impl From<crate::Result<String>> for RenderResult {
    fn from(result: crate::Result<String>) -> Self {
        match result {
            Ok(svg) => Self {
                success: true,
                svg: Some(svg),
                ..Self::default()
            },
            Err(err) => Self {
                success: false,
                svg: None,
                timed_out: err.is_timeout(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// Outcome of export, save and save-as
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub canceled: bool,
}

/// Export answers with the same shape as save-as
pub type ExportResult = SaveResult;

impl SaveResult {
    /// Content was written to `path`
    pub fn saved(path: PathBuf) -> Self {
        Self {
            success: true,
            file_path: Some(path),
            ..Self::default()
        }
    }

    /// Content was written to the path the caller already knew
    pub fn written() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Dialog dismissed or another dialog operation in flight
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            ..Self::default()
        }
    }

    pub fn failed(err: &PumlpadError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

/// Outcome of the open-file dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFileResult {
    pub canceled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OpenFileResult {
    pub fn opened(path: PathBuf, content: String) -> Self {
        Self {
            canceled: false,
            file_path: Some(path),
            content: Some(content),
            error: None,
        }
    }

    pub fn canceled() -> Self {
        Self {
            canceled: true,
            ..Self::default()
        }
    }

    pub fn failed(path: PathBuf, err: &PumlpadError) -> Self {
        Self {
            canceled: false,
            file_path: Some(path),
            content: None,
            error: Some(err.to_string()),
        }
    }
}

/// Operations the presentation layer may invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeRequest {
    Render {
        markup: String,
    },
    ExportImage {
        code: String,
    },
    OpenFile,
    SaveFile {
        #[serde(rename = "filePath")]
        file_path: PathBuf,
        content: String,
    },
    SaveFileAs {
        content: String,
    },
}

/// Result of any [`BridgeRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Render(RenderResult),
    Open(OpenFileResult),
    Save(SaveResult),
}
