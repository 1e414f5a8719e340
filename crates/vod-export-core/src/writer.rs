use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Result of a marker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOutcome {
    Created,
    Overwritten,
}

/// Result of a sidecar write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarOutcome {
    Written,
    Skipped,
}

/// Write `content` to a temporary sibling and rename it into place. The
/// rename is the only visible state transition, so a concurrent reader
/// never observes a half-written file.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name in {}", path.display()))?;
    let tmp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&tmp, content)
        .with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}

/// Write a one-line marker file containing the playback URL. Reports
/// whether the path was newly created or replaced an existing marker.
pub fn write_marker(path: &Path, url: &str) -> Result<MarkerOutcome> {
    let existed = path.exists();
    write_atomic(path, format!("{url}\n").as_bytes())?;
    debug!("Wrote marker {} (existed={})", path.display(), existed);
    Ok(if existed {
        MarkerOutcome::Overwritten
    } else {
        MarkerOutcome::Created
    })
}

/// Write a sidecar (metadata document or image). Existing sidecars are left
/// alone unless `overwrite` is set, so images fetched from a third party
/// are not re-downloaded run after run.
pub fn write_sidecar(path: &Path, content: &[u8], overwrite: bool) -> Result<SidecarOutcome> {
    if path.exists() && !overwrite {
        debug!("Sidecar exists, skipping {}", path.display());
        return Ok(SidecarOutcome::Skipped);
    }
    write_atomic(path, content)?;
    debug!("Wrote sidecar {}", path.display());
    Ok(SidecarOutcome::Written)
}
