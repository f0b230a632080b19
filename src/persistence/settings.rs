use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::canvas::viewport::DEFAULT_ZOOM_SENSITIVITY;

const APP_DIR: &str = "vicoo-galaxy";
const SETTINGS_FILE: &str = "settings.json";

/// Kinds of per-user directory the galaxy keeps files in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum UserDir {
    /// `settings.json`
    Config,
    /// Autosaved and versioned galaxies
    State,
}

/// Platform base directory for `kind`, before the app folder is appended.
fn user_base_dir(kind: UserDir) -> Option<PathBuf> {
    let var = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);
    if cfg!(target_os = "windows") {
        return match kind {
            UserDir::Config => var("APPDATA"),
            UserDir::State => var("LOCALAPPDATA"),
        };
    }
    let home = var("HOME");
    if cfg!(target_os = "macos") {
        return home.map(|h| h.join("Library").join("Application Support"));
    }
    match kind {
        UserDir::Config => var("XDG_CONFIG_HOME").or_else(|| home.map(|h| h.join(".config"))),
        UserDir::State => var("XDG_STATE_HOME").or_else(|| home.map(|h| h.join(".local").join("state"))),
    }
}

/// `<base>/vicoo-galaxy` for settings, `<base>/vicoo-galaxy/galaxies` for saves.
/// Falls back to the temp dir when no home is known.
fn galaxy_dir(kind: UserDir) -> PathBuf {
    let app = user_base_dir(kind).unwrap_or_else(std::env::temp_dir).join(APP_DIR);
    match kind {
        UserDir::Config => app,
        UserDir::State => app.join("galaxies"),
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Chinese,
}

/// Every translatable string the canvas shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UiText {
    SearchHint,
    Context,
    Tags,
    Delete,
    Close,
    LinkMode,
    Center,
    PanHint,
    ZoomHint,
    LinkHint,
    OpenNote,
    Orphan,
    ZoomIn,
    ZoomOut,
    FitView,
    ReplaceExisting,
}

impl Language {
    pub fn text(self, key: UiText) -> &'static str {
        match (self, key) {
            (Language::English, UiText::SearchHint) => "Search nodes...",
            (Language::English, UiText::Context) => "Context",
            (Language::English, UiText::Tags) => "Tags",
            (Language::English, UiText::Delete) => "Delete",
            (Language::English, UiText::Close) => "Close",
            (Language::English, UiText::LinkMode) => "Link mode",
            (Language::English, UiText::Center) => "Center",
            (Language::English, UiText::PanHint) => "Drag background to pan",
            (Language::English, UiText::ZoomHint) => "Scroll to zoom",
            (Language::English, UiText::LinkHint) => "Shift + drag to link",
            (Language::English, UiText::OpenNote) => "Linked note",
            (Language::English, UiText::Orphan) => "No linked note",
            (Language::English, UiText::ZoomIn) => "Zoom in",
            (Language::English, UiText::ZoomOut) => "Zoom out",
            (Language::English, UiText::FitView) => "Fit view",
            (Language::English, UiText::ReplaceExisting) => "Replace existing nodes and links",
            (Language::Chinese, UiText::SearchHint) => "搜索节点...",
            (Language::Chinese, UiText::Context) => "上下文",
            (Language::Chinese, UiText::Tags) => "标签",
            (Language::Chinese, UiText::Delete) => "删除",
            (Language::Chinese, UiText::Close) => "关闭",
            (Language::Chinese, UiText::LinkMode) => "连接模式",
            (Language::Chinese, UiText::Center) => "居中",
            (Language::Chinese, UiText::PanHint) => "拖动背景平移",
            (Language::Chinese, UiText::ZoomHint) => "滚轮缩放",
            (Language::Chinese, UiText::LinkHint) => "Shift + 拖动连接",
            (Language::Chinese, UiText::OpenNote) => "关联笔记",
            (Language::Chinese, UiText::Orphan) => "未关联笔记",
            (Language::Chinese, UiText::ZoomIn) => "放大",
            (Language::Chinese, UiText::ZoomOut) => "缩小",
            (Language::Chinese, UiText::FitView) => "适应视图",
            (Language::Chinese, UiText::ReplaceExisting) => "清除现有节点和关联",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, use OS default autosave directory
    #[serde(default)]
    pub autosave_override: Option<PathBuf>,
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    #[serde(default = "AppSettings::default_zoom_sensitivity")]
    pub zoom_sensitivity: f32,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default = "AppSettings::default_grid_size")]
    pub grid_size: f32,
    #[serde(default = "AppSettings::default_autosave_secs")]
    pub autosave_secs: u64,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub language: Language,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            autosave_override: None,
            export_override: None,
            zoom_sensitivity: Self::default_zoom_sensitivity(),
            snap_to_grid: false,
            grid_size: Self::default_grid_size(),
            autosave_secs: Self::default_autosave_secs(),
            theme: Theme::default(),
            language: Language::default(),
        }
    }
}

impl AppSettings {
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::settings_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let settings: Self = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path();
        fs::create_dir_all(galaxy_dir(UserDir::Config))?;
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved settings to {}", path.display());
        Ok(())
    }

    pub fn autosave_dir(&self) -> PathBuf {
        if let Some(p) = &self.autosave_override { return p.clone(); }
        galaxy_dir(UserDir::State)
    }

    pub fn settings_path() -> PathBuf {
        galaxy_dir(UserDir::Config).join(SETTINGS_FILE)
    }

    /// Default export directory when no override is set: {temp_dir}/vicoo-galaxy/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(APP_DIR);
        p.push("exports");
        p
    }

    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }

    /// Grid size when snapping is on.
    pub fn snap_grid(&self) -> Option<f32> {
        self.snap_to_grid.then_some(self.grid_size)
    }

    pub(crate) fn default_zoom_sensitivity() -> f32 { DEFAULT_ZOOM_SENSITIVITY }
    pub(crate) fn default_grid_size() -> f32 { 20.0 }
    pub(crate) fn default_autosave_secs() -> u64 { 5 }
}

/// Read-only view of the settings handed to the app at construction.
#[derive(Debug, Clone)]
pub struct Environment {
    settings: AppSettings,
}

impl Environment {
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AppSettings { &self.settings }
    pub fn theme(&self) -> Theme { self.settings.theme }
    pub fn language(&self) -> Language { self.settings.language }

    pub fn text(&self, key: UiText) -> &'static str {
        self.settings.language.text(key)
    }
}
