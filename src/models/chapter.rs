use std::fmt;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Raw chapter text as produced by the fetch stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterText(String);

impl ChapterText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Load from a file written by the fetch stage
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Named pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Writer,
    Reviewer,
    Editor,
    Critic,
    Scorer,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Writer => "writer",
            Stage::Reviewer => "reviewer",
            Stage::Editor => "editor",
            Stage::Critic => "critic",
            Stage::Scorer => "scorer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a single model-backed stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub stage: Stage,
    pub text: String,
}

impl StageResult {
    pub fn new(stage: Stage, text: impl Into<String>) -> Self {
        Self {
            stage,
            text: text.into(),
        }
    }
}

/// Writer output. The only input accepted by the reviewer and editor stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Written(StageResult);

impl Written {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self(StageResult::new(Stage::Writer, text))
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn into_result(self) -> StageResult {
        self.0
    }
}

/// Editor output. Feeds the critic, scorer, narrator and the human draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Edited(StageResult);

impl Edited {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self(StageResult::new(Stage::Editor, text))
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn into_result(self) -> StageResult {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_results_carry_stage() {
        let written = Written::new("spun");
        let edited = Edited::new("polished");
        assert_eq!(written.clone().into_result().stage, Stage::Writer);
        assert_eq!(edited.clone().into_result().stage, Stage::Editor);
        assert_eq!(written.text(), "spun");
        assert_eq!(edited.text(), "polished");
    }

    #[test]
    fn test_chapter_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ChapterText::load(&dir.path().join("chapter.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
