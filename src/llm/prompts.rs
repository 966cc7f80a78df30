//! Prompt templates for the model-backed stages.
//!
//! Each builder is a pure function of its input text.

/// Spoken before the narrated excerpt
pub const NARRATION_GREETING: &str = "Here is your chapter.";

/// Instruction prepended to the edited text for scoring
pub const SCORE_PROMPT: &str = "Rate this chapter overall from 1 to 10. Just return a number.";

/// Writer: rewrite the raw chapter
pub fn build_rewrite_prompt(chapter: &str) -> String {
    format!(
        "\nYou are an AI book writer. Rewrite (spin) the following chapter in a modern and \
         engaging way, keeping the core essence intact.\n\nText:\n{}\n",
        chapter
    )
}

/// Reviewer: feedback on the rewritten chapter
pub fn build_review_prompt(rewritten: &str) -> String {
    format!(
        "\nYou are an AI book reviewer. Provide constructive feedback to improve the rewritten \
         chapter below.\n\nText:\n{}\n",
        rewritten
    )
}

/// Editor: polish the rewritten chapter
pub fn build_edit_prompt(rewritten: &str) -> String {
    format!(
        "\nYou are an AI book editor. Improve sentence clarity, tone, and flow for the following \
         chapter:\n{}\n",
        rewritten
    )
}

/// Critic: literary analysis of the edited chapter
pub fn build_critique_prompt(edited: &str) -> String {
    format!(
        "\nYou are a literary critic. Analyze the writing style, plot development, and \
         strengths/weaknesses of the chapter:\n{}\n",
        edited
    )
}

/// Scorer: the fixed instruction, a blank line, then the edited chapter
pub fn build_score_prompt(edited: &str) -> String {
    format!("{}\n\n{}", SCORE_PROMPT, edited)
}
