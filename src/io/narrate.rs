use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::io::truncate_chars;
use crate::llm::NARRATION_GREETING;

/// Characters of the edited chapter read aloud
pub const NARRATION_CHARS: usize = 300;

/// Speech output for the optional narration step
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Speak each utterance in order
    async fn speak(&self, utterances: &[&str]) -> Result<()>;
}

/// Greeting followed by the start of the chapter
pub fn narration_script(edited: &str) -> [&str; 2] {
    [NARRATION_GREETING, truncate_chars(edited, NARRATION_CHARS)]
}

/// Narration disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNarrator;

#[async_trait]
impl Narrator for SilentNarrator {
    async fn speak(&self, _utterances: &[&str]) -> Result<()> {
        Ok(())
    }
}

/// Speaks through a system text-to-speech command, one invocation per utterance
#[derive(Debug, Clone)]
pub struct CommandNarrator {
    program: String,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandNarrator {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say")
        } else {
            Self::new("espeak")
        }
    }
}

#[async_trait]
impl Narrator for CommandNarrator {
    async fn speak(&self, utterances: &[&str]) -> Result<()> {
        for utterance in utterances {
            info!("Narrating {} chars via {}", utterance.chars().count(), self.program);
            let status = Command::new(&self.program)
                .arg(utterance)
                .status()
                .await
                .map_err(|e| PipelineError::io(&self.program, e))?;
            if !status.success() {
                return Err(PipelineError::Config(format!(
                    "narration command {} exited with {}",
                    self.program, status
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narration_script() {
        let long = "a".repeat(1000);
        let script = narration_script(&long);
        assert_eq!(script[0], NARRATION_GREETING);
        assert_eq!(script[1].len(), NARRATION_CHARS);

        let short = narration_script("Brief.");
        assert_eq!(short[1], "Brief.");
    }

    #[tokio::test]
    async fn test_silent_narrator() {
        SilentNarrator.speak(&narration_script("text")).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_narrator_runs_program() {
        CommandNarrator::new("true").speak(&["hello"]).await.unwrap();

        let err = CommandNarrator::new("false").speak(&["hello"]).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
