use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::canvas::viewport::Viewport;
use crate::graph_utils::galaxy::GalaxyStore;

const ACTIVE_FILE: &str = "galaxy.ron";
const VERSION_PREFIX: &str = "galaxy_";

/// Everything needed to restore a canvas session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyStateFile {
    pub store: GalaxyStore,
    pub viewport: Viewport,
}

impl GalaxyStateFile {
    pub fn from_runtime(store: &GalaxyStore, viewport: &Viewport) -> Self {
        Self { store: store.clone(), viewport: viewport.clone() }
    }

    /// Split into live state. The viewport is re-clamped since the file may
    /// have been edited by hand.
    pub fn into_runtime(self) -> (GalaxyStore, Viewport) {
        (self.store, self.viewport.sanitized())
    }
}

pub fn active_state_path(dir: &Path) -> PathBuf {
    dir.join(ACTIVE_FILE)
}

pub fn versioned_state_path_now(dir: &Path) -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
    dir.join(format!("{}{}.ron", VERSION_PREFIX, stamp))
}

/// Replace `path` through a sibling `.tmp` file and a rename.
fn replace_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    let tmp = path.with_extension("ron.tmp");
    fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

fn write_state(path: &Path, state: &GalaxyStateFile) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let pretty = PrettyConfig::new()
        .separate_tuple_members(true)
        .enumerate_arrays(true);
    let s = ron::ser::to_string_pretty(state, pretty)?;
    replace_file(path, &s)?;
    log::info!("saved galaxy to {}", path.display());
    Ok(())
}

pub fn save_active(dir: &Path, state: &GalaxyStateFile) -> anyhow::Result<PathBuf> {
    let path = active_state_path(dir);
    write_state(&path, state)?;
    Ok(path)
}

pub fn save_versioned(dir: &Path, state: &GalaxyStateFile) -> anyhow::Result<PathBuf> {
    let path = versioned_state_path_now(dir);
    write_state(&path, state)?;
    Ok(path)
}

pub fn load_active(dir: &Path) -> anyhow::Result<Option<GalaxyStateFile>> {
    let path = active_state_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    load_from_path(&path).map(Some)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<GalaxyStateFile> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let state: GalaxyStateFile = ron::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    log::info!("loaded galaxy from {}", path.display());
    Ok(state)
}

fn is_version_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(VERSION_PREFIX) && n.ends_with(".ron"))
}

/// Versioned snapshots in `dir`, newest first. The timestamp in the file
/// name sorts chronologically.
pub fn list_versions(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut versions = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    versions.retain(|p| is_version_file(p));
    versions.sort_by(|a, b| b.cmp(a));
    Ok(versions)
}
