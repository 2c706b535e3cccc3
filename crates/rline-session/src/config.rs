//! Runtime configuration: compile-time-style defaults overridable
//! field-by-field, or loadable from a TOML overlay.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Editing and history knobs. Defaults match the reference's compile-time
/// constants; every field can be overridden via a builder method or a TOML
/// file loaded with [`load_from`].
#[derive(Debug, Clone)]
pub struct Config {
    pub max_len: usize,
    pub history_depth: usize,
    pub history_file: Option<PathBuf>,
    pub window_width: u16,
    pub sort_hints: bool,
}

impl Config {
    pub const DEFAULT_MAX_LEN: usize = rline_buffer::DEFAULT_MAX_LEN;
    pub const DEFAULT_HISTORY_DEPTH: usize = 100;
    pub const DEFAULT_WINDOW_WIDTH: u16 = rline_window::DEFAULT_COLUMNS;

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }

    pub fn with_window_width(mut self, width: u16) -> Self {
        self.window_width = width;
        self
    }

    pub fn with_sort_hints(mut self, sort: bool) -> Self {
        self.sort_hints = sort;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_len: Self::DEFAULT_MAX_LEN,
            history_depth: Self::DEFAULT_HISTORY_DEPTH,
            history_file: None,
            window_width: Self::DEFAULT_WINDOW_WIDTH,
            sort_hints: false,
        }
    }
}

/// Mirrors [`Config`] but every field is optional, for TOML deserialization;
/// unset fields fall back to [`Config::default`]. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    line: LineConfig,
    #[serde(default)]
    history: HistoryConfig,
}

#[derive(Debug, Default, Deserialize)]
struct LineConfig {
    max_len: Option<usize>,
    window_width: Option<u16>,
    sort_hints: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryConfig {
    depth: Option<usize>,
    file: Option<PathBuf>,
}

/// Load a [`Config`], overlaying whatever `path` sets on top of the
/// defaults. Missing keys keep their default value.
pub fn load_from(path: &Path) -> Result<Config> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading config from {path:?}"))?;
    let file: ConfigFile =
        toml::from_str(&text).with_context(|| format!("parsing config from {path:?}"))?;

    let mut config = Config::default();
    if let Some(max_len) = file.line.max_len {
        config.max_len = max_len;
    }
    if let Some(window_width) = file.line.window_width {
        config.window_width = window_width;
    }
    if let Some(sort_hints) = file.line.sort_hints {
        config.sort_hints = sort_hints;
    }
    if let Some(depth) = file.history.depth {
        config.history_depth = depth;
    }
    if let Some(history_file) = file.history.file {
        config.history_file = Some(history_file);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_with_no_file() {
        let config = Config::default();
        assert_eq!(config.max_len, Config::DEFAULT_MAX_LEN);
        assert!(config.history_file.is_none());
    }

    #[test]
    fn builder_methods_override_fields() {
        let config = Config::default().with_max_len(64).with_sort_hints(true);
        assert_eq!(config.max_len, 64);
        assert!(config.sort_hints);
    }

    #[test]
    fn load_from_overlays_only_set_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rline.toml");
        std::fs::write(&path, "[line]\nmax_len = 256\n\n[history]\ndepth = 50\n").unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.max_len, 256);
        assert_eq!(config.history_depth, 50);
        assert_eq!(config.window_width, Config::DEFAULT_WINDOW_WIDTH);
    }

    #[test]
    fn load_from_ignores_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rline.toml");
        std::fs::write(&path, "[line]\nmax_len = 128\nbogus = true\n").unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.max_len, 128);
    }
}
