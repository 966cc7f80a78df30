use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::Workspace;

/// Second-precision archive timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Final, archived chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedArtifact {
    pub path: PathBuf,
    pub timestamp: String,
    pub text: String,
}

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Move the working draft into `versions/chapter_v_<timestamp>.txt`.
///
/// Two archives in the same second share a name; the second one fails with
/// [`PipelineError::VersionCollision`] and leaves both files untouched.
pub fn archive_draft(workspace: &Workspace, timestamp: &str) -> Result<VersionedArtifact> {
    workspace.ensure_dirs()?;
    let draft = workspace.draft();
    let target = workspace.version_file(timestamp);

    if target.exists() {
        return Err(PipelineError::VersionCollision { path: target });
    }

    let text = read(&draft)?;
    std::fs::rename(&draft, &target).map_err(|e| PipelineError::io(&draft, e))?;
    info!("Final version saved: {:?}", target);

    Ok(VersionedArtifact {
        path: target,
        timestamp: timestamp.to_string(),
        text,
    })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}
