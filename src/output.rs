use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::parser::emit::ClassifiedEntry;

/// Write entries as pretty JSON via a sibling temp file + rename, so a failed
/// write never clobbers the previous output.
pub fn write_json_atomic(path: &Path, entries: &[ClassifiedEntry]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(entries)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    info!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Vec<ClassifiedEntry>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = serde_json::from_str(&json)
        .with_context(|| format!("Invalid entry list in {}", path.display()))?;
    Ok(entries)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
