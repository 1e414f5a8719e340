//! Consistency checker for an exported marker tree.
//!
//! Read-only: walks a movies or series root and reports markers with
//! missing or suspicious content, markers without metadata sidecars, and
//! directories that hold no markers at all.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// Marker file is empty or whitespace-only.
    EmptyMarker,
    /// Marker's first line does not look like a playback URL.
    BadUrl(String),
    /// Marker has no `.nfo` sidecar next to it.
    MissingNfo,
    /// Directory contains no marker files anywhere beneath it.
    EmptyDir,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::EmptyMarker => write!(f, "empty marker file"),
            Problem::BadUrl(line) => write!(f, "first line is not a URL: {line:?}"),
            Problem::MissingNfo => write!(f, "no .nfo sidecar"),
            Problem::EmptyDir => write!(f, "no markers under this directory"),
        }
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    /// Marker files examined.
    pub scanned: usize,
    pub issues: Vec<(PathBuf, Problem)>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Walk `root` and collect problems. A missing root is an error; an empty
/// root is a clean report.
pub fn check_root(root: &Path) -> Result<CheckReport> {
    let mut report = CheckReport::default();
    walk(root, &mut report)?;
    report.issues.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(report)
}

/// Returns whether any marker exists at or below `dir`.
fn walk(dir: &Path, report: &mut CheckReport) -> Result<bool> {
    let mut found_marker = false;

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            let below = walk(&path, report)?;
            if !below {
                report.issues.push((path, Problem::EmptyDir));
            }
            found_marker |= below;
        } else if path.extension().and_then(|e| e.to_str()) == Some("strm") {
            found_marker = true;
            check_marker(&path, report)?;
        }
    }

    Ok(found_marker)
}

fn check_marker(path: &Path, report: &mut CheckReport) -> Result<()> {
    report.scanned += 1;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let first_line = content.lines().next().unwrap_or("").trim();

    if first_line.is_empty() {
        report.issues.push((path.to_path_buf(), Problem::EmptyMarker));
    } else if !(first_line.starts_with("http://") || first_line.starts_with("https://")) {
        report
            .issues
            .push((path.to_path_buf(), Problem::BadUrl(first_line.to_string())));
    }

    let nfo = path.with_extension("nfo");
    if !nfo.exists() {
        report.issues.push((path.to_path_buf(), Problem::MissingNfo));
    }

    Ok(())
}
