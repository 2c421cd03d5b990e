//! Target file loading.
//!
//! The input is line-oriented and CSV-compatible: every entity URL found on a
//! line becomes one queued target, and the first cell on the line that holds
//! no URL is used as its display label.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::target::QueuedTarget;
use crate::ConfigError;

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://(?:[\w-]+\.)+[a-z]{2,}/(?:in|company)/[^\s,"'<>]+"#)
        .expect("valid link regex")
});

/// Read `path` and extract every entity URL in file order.
///
/// # Errors
///
/// Returns [`ConfigError::InputFileIo`] if the file cannot be read, or
/// [`ConfigError::NoTargets`] if it contains no entity URLs.
pub fn load_targets(path: &Path) -> Result<Vec<QueuedTarget>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InputFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let targets = extract_targets(&content);
    if targets.is_empty() {
        return Err(ConfigError::NoTargets {
            path: path.display().to_string(),
        });
    }

    tracing::info!(
        path = %path.display(),
        targets = targets.len(),
        "loaded target file"
    );
    Ok(targets)
}

/// Extract queued targets from already-loaded file content.
#[must_use]
pub fn extract_targets(content: &str) -> Vec<QueuedTarget> {
    let mut targets = Vec::new();
    for line in content.lines() {
        let label = line
            .split(',')
            .map(|cell| cell.trim().trim_matches('"').trim())
            .find(|cell| !cell.is_empty() && !LINK_RE.is_match(cell))
            .map(str::to_string);

        for m in LINK_RE.find_iter(line) {
            let mut target = QueuedTarget::new(m.as_str());
            if let Some(label) = &label {
                target = target.with_label(label.clone());
            }
            targets.push(target);
        }
    }
    targets
}
