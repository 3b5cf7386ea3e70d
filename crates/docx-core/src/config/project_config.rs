//! Project configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the Python project lives and which documents are read and written.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root of the Python sources. Default: the directory docx runs in.
    pub root: Option<PathBuf>,
    /// Input interface document. Default: `openapi.json`.
    pub openapi: Option<PathBuf>,
    /// Output document. Default: overwrite the input document.
    pub output: Option<PathBuf>,
    /// Extra gitignore-style patterns excluded from the scan.
    #[serde(default)]
    pub extra_ignore: Vec<String>,
}

impl ProjectConfig {
    /// Returns the effective project root, resolved against `base`.
    pub fn effective_root(&self, base: &Path) -> PathBuf {
        match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        }
    }

    /// Returns the effective input document path, defaulting to `openapi.json`.
    pub fn effective_openapi(&self) -> PathBuf {
        self.openapi
            .clone()
            .unwrap_or_else(|| PathBuf::from("openapi.json"))
    }

    /// Returns the effective output path, defaulting to the input document.
    pub fn effective_output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| self.effective_openapi())
    }
}
