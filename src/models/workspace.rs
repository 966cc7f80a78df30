use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

pub const CHAPTER_TEXT_FILE: &str = "chapter.txt";
pub const DRAFT_FILE: &str = "chapter_spun.txt";
pub const SCREENSHOT_FILE: &str = "screenshot.png";
pub const HTML_FILE: &str = "chapter.html";
pub const VERSIONS_DIR: &str = "versions";

/// Fixed file layout of the working directory shared by all stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chapter_text(&self) -> PathBuf {
        self.root.join(CHAPTER_TEXT_FILE)
    }

    /// Current working draft, overwritten by the writer and editor stages
    pub fn draft(&self) -> PathBuf {
        self.root.join(DRAFT_FILE)
    }

    pub fn screenshot(&self) -> PathBuf {
        self.root.join(SCREENSHOT_FILE)
    }

    pub fn html(&self) -> PathBuf {
        self.root.join(HTML_FILE)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    /// Archive path for a `YYYYMMDD-HHMMSS` timestamp
    pub fn version_file(&self, timestamp: &str) -> PathBuf {
        self.versions_dir().join(format!("chapter_v_{}.txt", timestamp))
    }

    /// Create the root and versions directories if missing
    pub fn ensure_dirs(&self) -> Result<()> {
        let versions = self.versions_dir();
        std::fs::create_dir_all(&versions).map_err(|e| PipelineError::io(&versions, e))
    }

    /// Overwrite a workspace file with text
    pub fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        std::fs::write(path, text).map_err(|e| PipelineError::io(path, e))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new("output")
    }
}
