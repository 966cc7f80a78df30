pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod stages;

pub use error::{PipelineError, Result};
pub use io::{
    archive_draft, save_fetched_page, BrowserPageFetcher, FetchedPage, HttpPageFetcher,
    HumanEditRequest, HumanGate, Narrator, PageFetcher, StdinGate, VersionedArtifact,
};
pub use llm::{ModelClient, OpenRouterClient, OpenRouterConfig};
pub use models::{extract_score, ChapterText, Score, Stage, StageResult, Workspace};
pub use stages::{
    execute_fetch, Pipeline, PipelineConfig, PipelineReport, PipelineState, StageModels,
};
