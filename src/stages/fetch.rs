use tracing::info;
use url::Url;

use crate::error::{PipelineError, Result};
use crate::io::{save_fetched_page, FetchArtifacts, PageFetcher};
use crate::models::Workspace;

/// Fetch stage: retrieve the chapter page and persist its artifacts
pub async fn execute_fetch(
    fetcher: &dyn PageFetcher,
    url: &str,
    workspace: &Workspace,
) -> Result<FetchArtifacts> {
    let url = Url::parse(url)
        .map_err(|e| PipelineError::InvalidInput(format!("bad URL {url}: {e}")))?;

    let page = fetcher.fetch(&url).await?;
    let artifacts = save_fetched_page(&page, workspace)?;

    info!("Scraping complete. Text: {:?}", artifacts.text_path);
    match &artifacts.screenshot_path {
        Some(path) => info!("Screenshot: {:?}", path),
        None => info!("No screenshot captured"),
    }
    Ok(artifacts)
}
