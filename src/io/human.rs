use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::error::{PipelineError, Result};
use crate::models::Score;

/// Everything the human needs before editing the draft
#[derive(Debug, Clone)]
pub struct HumanEditRequest {
    pub draft_path: PathBuf,
    pub review_feedback: String,
    pub critique_feedback: String,
    pub score: Score,
}

/// Suspension point for the manual edit. Resolves once the human signals the
/// draft is ready.
#[async_trait]
pub trait HumanGate: Send + Sync {
    async fn await_edit(&self, request: &HumanEditRequest) -> Result<()>;
}

/// Prints the feedback and waits for one line of input, stdin by default.
///
/// End of input is not an acknowledgment: a closed stdin fails the gate.
pub struct StdinGate<R = BufReader<Stdin>> {
    input: Mutex<R>,
}

impl StdinGate {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdinGate {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StdinGate<R> {
    pub fn from_reader(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

fn render_request(request: &HumanEditRequest) -> String {
    format!(
        "Review Feedback\n===============\n{}\n\nCritic Feedback\n===============\n{}\n\n\
         Quality Score: {}\n\nYou can now edit the chapter.\n\
         Open {:?}, make your changes, then press ENTER to continue.",
        request.review_feedback.trim(),
        request.critique_feedback.trim(),
        request.score,
        request.draft_path
    )
}

#[async_trait]
impl<R> HumanGate for StdinGate<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn await_edit(&self, request: &HumanEditRequest) -> Result<()> {
        println!("{}", render_request(request));

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| PipelineError::io("<stdin>", e))?;
        if read == 0 {
            return Err(PipelineError::io(
                "<stdin>",
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed before the edit was acknowledged",
                ),
            ));
        }
        Ok(())
    }
}
