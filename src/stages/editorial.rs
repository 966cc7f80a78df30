//! The model-backed stages. Each one builds its prompt from exactly one
//! upstream result and makes a single model call.

use tracing::info;

use crate::error::Result;
use crate::llm::{
    build_critique_prompt, build_edit_prompt, build_review_prompt, build_rewrite_prompt,
    build_score_prompt, ModelClient, DEFAULT_ROLE,
};
use crate::models::{extract_score, ChapterText, Edited, Score, Stage, StageResult, Written};

async fn call(client: &dyn ModelClient, stage: Stage, model: &str, prompt: &str) -> Result<String> {
    info!("{}: calling {}", stage, model);
    let text = client.generate(prompt, model, DEFAULT_ROLE).await?;
    info!("{}: {} chars returned", stage, text.chars().count());
    Ok(text)
}

/// Writer: spin the raw chapter
pub async fn execute_write(
    client: &dyn ModelClient,
    model: &str,
    chapter: &ChapterText,
) -> Result<Written> {
    let prompt = build_rewrite_prompt(chapter.as_str());
    call(client, Stage::Writer, model, &prompt).await.map(Written::new)
}

/// Reviewer: feedback on the rewrite, reported only
pub async fn execute_review(
    client: &dyn ModelClient,
    model: &str,
    written: &Written,
) -> Result<StageResult> {
    let prompt = build_review_prompt(written.text());
    let text = call(client, Stage::Reviewer, model, &prompt).await?;
    Ok(StageResult::new(Stage::Reviewer, text))
}

/// Editor: polish the rewrite (not the review)
pub async fn execute_edit(
    client: &dyn ModelClient,
    model: &str,
    written: &Written,
) -> Result<Edited> {
    let prompt = build_edit_prompt(written.text());
    call(client, Stage::Editor, model, &prompt).await.map(Edited::new)
}

/// Critic: analysis of the edited chapter, reported only
pub async fn execute_critique(
    client: &dyn ModelClient,
    model: &str,
    edited: &Edited,
) -> Result<StageResult> {
    let prompt = build_critique_prompt(edited.text());
    let text = call(client, Stage::Critic, model, &prompt).await?;
    Ok(StageResult::new(Stage::Critic, text))
}

/// Scorer: rate the edited chapter. No score in the reply is fatal.
pub async fn execute_score(
    client: &dyn ModelClient,
    model: &str,
    edited: &Edited,
) -> Result<Score> {
    let prompt = build_score_prompt(edited.text());
    let response = call(client, Stage::Scorer, model, &prompt).await?;
    extract_score(&response)
}
