use std::fmt;

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::io::{
    archive_draft, format_timestamp, narration_script, CommandNarrator, HumanEditRequest,
    HumanGate, Narrator, SilentNarrator, VersionedArtifact,
};
use crate::llm::{ModelClient, OpenRouterConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::models::{ChapterText, Edited, Score, StageResult, Workspace, Written};
use crate::stages::{
    execute_critique, execute_edit, execute_review, execute_score, execute_write,
};

/// Model identifier per stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageModels {
    pub writer: String,
    pub reviewer: String,
    pub editor: String,
    pub critic: String,
    pub scorer: String,
}

impl StageModels {
    /// Same model for every stage
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            writer: model.clone(),
            reviewer: model.clone(),
            editor: model.clone(),
            critic: model.clone(),
            scorer: model,
        }
    }
}

impl Default for StageModels {
    fn default() -> Self {
        Self::uniform(DEFAULT_MODEL)
    }
}

/// Everything a pipeline run needs, passed in at construction
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Working directory layout
    pub workspace: Workspace,
    /// Bearer token for the model endpoint
    pub api_key: String,
    /// Chat-completion endpoint URL
    pub endpoint: String,
    pub models: StageModels,
    /// Speak the start of the edited chapter after scoring
    pub narrate: bool,
}

impl PipelineConfig {
    /// Default config with the API key taken from the environment
    pub fn from_env() -> Result<Self> {
        let client = OpenRouterConfig::from_env()?;
        Ok(Self {
            api_key: client.api_key,
            ..Default::default()
        })
    }

    pub fn client_config(&self) -> OpenRouterConfig {
        OpenRouterConfig::new(self.api_key.clone()).with_endpoint(self.endpoint.clone())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace: Workspace::default(),
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            models: StageModels::default(),
            narrate: false,
        }
    }
}

/// Pipeline states, strictly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Fetched,
    Written,
    Reviewed,
    Edited,
    Critiqued,
    Scored,
    Narrated,
    HumanEdited,
    Versioned,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub written: Written,
    pub review: StageResult,
    pub edited: Edited,
    pub critique: StageResult,
    pub score: Score,
    pub artifact: VersionedArtifact,
    /// States entered, in order
    pub transitions: Vec<PipelineState>,
}

type Clock = Box<dyn Fn() -> String + Send + Sync>;

/// Linear chapter pipeline: writer, reviewer, editor, critic, scorer,
/// optional narration, human edit, versioning
pub struct Pipeline {
    config: PipelineConfig,
    client: Box<dyn ModelClient>,
    gate: Box<dyn HumanGate>,
    narrator: Box<dyn Narrator>,
    clock: Clock,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        client: Box<dyn ModelClient>,
        gate: Box<dyn HumanGate>,
    ) -> Self {
        let narrator: Box<dyn Narrator> = if config.narrate {
            Box::new(CommandNarrator::default())
        } else {
            Box::new(SilentNarrator)
        };
        Self {
            config,
            client,
            gate,
            narrator,
            clock: Box::new(|| format_timestamp(&chrono::Local::now())),
        }
    }

    pub fn with_narrator(mut self, narrator: Box<dyn Narrator>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Override the archive timestamp source
    pub fn with_clock(mut self, clock: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the `chapter.txt` left by the fetch stage
    pub async fn run_from_workspace(&self) -> Result<PipelineReport> {
        let chapter = ChapterText::load(&self.config.workspace.chapter_text())?;
        self.run(&chapter).await
    }

    pub async fn run(&self, chapter: &ChapterText) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id, chapter)
            .instrument(info_span!("pipeline", %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid, chapter: &ChapterText) -> Result<PipelineReport> {
        let workspace = &self.config.workspace;
        let models = &self.config.models;
        let client = self.client.as_ref();
        let mut transitions = Vec::with_capacity(9);
        let mut enter = |state: PipelineState| {
            info!("-> {}", state);
            transitions.push(state);
        };

        workspace.ensure_dirs()?;
        enter(PipelineState::Fetched);

        let written = execute_write(client, &models.writer, chapter).await?;
        workspace.write_text(&workspace.draft(), written.text())?;
        enter(PipelineState::Written);

        let review = execute_review(client, &models.reviewer, &written).await?;
        enter(PipelineState::Reviewed);

        let edited = execute_edit(client, &models.editor, &written).await?;
        workspace.write_text(&workspace.draft(), edited.text())?;
        enter(PipelineState::Edited);

        let critique = execute_critique(client, &models.critic, &edited).await?;
        enter(PipelineState::Critiqued);

        let score = execute_score(client, &models.scorer, &edited).await?;
        info!("Quality score: {}", score);
        enter(PipelineState::Scored);

        self.narrator.speak(&narration_script(edited.text())).await?;
        if self.config.narrate {
            enter(PipelineState::Narrated);
        }

        let request = HumanEditRequest {
            draft_path: workspace.draft(),
            review_feedback: review.text.clone(),
            critique_feedback: critique.text.clone(),
            score,
        };
        info!("Waiting for human edit of {:?}", request.draft_path);
        self.gate.await_edit(&request).await?;
        enter(PipelineState::HumanEdited);

        let artifact = archive_draft(workspace, &(self.clock)())?;
        enter(PipelineState::Versioned);

        Ok(PipelineReport {
            run_id,
            written,
            review,
            edited,
            critique,
            score,
            artifact,
            transitions,
        })
    }
}
