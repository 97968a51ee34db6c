use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MoodlogConfig {
    pub diary: DiarySection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiarySection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UiSection {
    /// Force color on or off; unset means auto-detect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl MoodlogConfig {
    pub fn new(diary_path: &Path) -> Self {
        Self {
            diary: DiarySection {
                path: diary_path.to_string_lossy().to_string(),
            },
            ui: UiSection::default(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_diary_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("diary.moodlog"))
}

pub fn read_config(path: &Path) -> anyhow::Result<MoodlogConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

/// Read the config if one exists at the default location.
pub fn load_config() -> anyhow::Result<Option<MoodlogConfig>> {
    let path = default_config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    read_config(&path).map(Some)
}

pub fn write_config(path: &Path, config: &MoodlogConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

/// Diary path precedence: explicit flag/env, then config, then default.
pub fn resolve_diary_path(
    explicit: Option<&str>,
    config: Option<&MoodlogConfig>,
) -> anyhow::Result<PathBuf> {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(value));
    }
    if let Some(config) = config {
        return Ok(PathBuf::from(&config.diary.path));
    }
    default_diary_path()
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("moodlog"));
        }
    }
    Ok(home_dir()?.join(".config").join("moodlog"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("moodlog"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("moodlog"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = MoodlogConfig::new(Path::new("/tmp/diary.moodlog"));
        config.ui.color = Some(false);

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[diary]"));
        assert!(text.contains("color = false"));
        assert!(!text.contains("editor"));

        let back: MoodlogConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.diary.path, "/tmp/diary.moodlog");
        assert_eq!(back.ui.color, Some(false));
    }

    #[test]
    fn test_ui_section_optional() {
        let config: MoodlogConfig = toml::from_str("[diary]\npath = \"/x\"\n").unwrap();
        assert!(config.ui.color.is_none());
        assert!(config.ui.editor.is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let config = MoodlogConfig::new(Path::new("/from/config"));
        let path = resolve_diary_path(Some("/from/flag"), Some(&config)).unwrap();
        assert_eq!(path, PathBuf::from("/from/flag"));

        let path = resolve_diary_path(None, Some(&config)).unwrap();
        assert_eq!(path, PathBuf::from("/from/config"));

        let path = resolve_diary_path(Some("  "), Some(&config)).unwrap();
        assert_eq!(path, PathBuf::from("/from/config"));
    }
}
