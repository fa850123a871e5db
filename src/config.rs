use crate::content::{AssetResolver, ContentMapper, DEFAULT_ASSET_BASE, DEFAULT_NORMALIZED_FIELD};
use crate::embed::AspectRatio;
use crate::render::HighlightStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub embed: EmbedConfig,

    /// Search highlight markers
    #[serde(default)]
    pub search: HighlightStyle,

    #[serde(default)]
    pub log: LogConfig,
}

/// Document normalization and mapping options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Host that relative upload paths are resolved against
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,

    /// Fields converted to block trees by `normalize` and `fetch`
    #[serde(default = "default_normalize_fields")]
    pub normalize_fields: Vec<String>,

    /// Length of `plain --preview` when no length is given
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Location shown for stories that do not set one
    #[serde(default = "default_location")]
    pub default_location: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            asset_base_url: default_asset_base_url(),
            normalize_fields: default_normalize_fields(),
            preview_chars: default_preview_chars(),
            default_location: default_location(),
        }
    }
}

fn default_asset_base_url() -> String {
    DEFAULT_ASSET_BASE.to_string()
}

fn default_normalize_fields() -> Vec<String> {
    vec![DEFAULT_NORMALIZED_FIELD.to_string()]
}

fn default_preview_chars() -> usize {
    160
}

fn default_location() -> String {
    "Marlborough".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Aspect ratio used when an embed declares none: 16:9, 4:3, 1:1 or 9:16
    #[serde(default = "default_aspect_ratio")]
    pub default_aspect_ratio: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            default_aspect_ratio: default_aspect_ratio(),
        }
    }
}

fn default_aspect_ratio() -> String {
    AspectRatio::default().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset, e.g. "warn" or "blockpress=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Get the XDG-style config file path (~/.config/blockpress/config.toml)
    /// This is preferred on macOS for CLI tools and cross-platform dotfiles
    #[cfg(target_os = "macos")]
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("blockpress").join("config.toml"))
    }

    /// Get the platform-specific config file path
    /// - macOS: ~/Library/Application Support/blockpress/config.toml
    /// - Linux: ~/.config/blockpress/config.toml
    /// - Windows: %APPDATA%/blockpress/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("blockpress").join("config.toml"))
    }

    /// Load config from file, or return default if file doesn't exist
    /// On macOS, checks ~/.config/blockpress first, then falls back to ~/Library/Application Support
    pub fn load() -> Self {
        #[cfg(target_os = "macos")]
        {
            // Prefer XDG-style path on macOS for CLI tools
            if let Some(config) = Self::xdg_config_path().and_then(|p| Self::load_from(&p)) {
                return config;
            }
        }

        // Fall back to platform-specific path
        Self::config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Read one config file. `None` when it is missing or not valid TOML.
    pub fn load_from(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                // Logging is not set up yet; the config decides its level
                eprintln!("Warning: ignoring invalid config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path().ok_or("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Parse the configured default aspect ratio, falling back to 16:9
    pub fn default_aspect_ratio(&self) -> AspectRatio {
        AspectRatio::from_str(self.embed.default_aspect_ratio.trim()).unwrap_or_else(|_| {
            tracing::warn!(
                value = %self.embed.default_aspect_ratio,
                "unknown aspect ratio in config, using 16:9"
            );
            AspectRatio::default()
        })
    }

    /// Mapper configured with the asset host and default location
    pub fn content_mapper(&self) -> Result<ContentMapper, url::ParseError> {
        let assets = AssetResolver::new(&self.content.asset_base_url)?;
        Ok(ContentMapper::new(assets).with_default_location(&self.content.default_location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [content]
            asset_base_url = "https://cms.example.org"

            [search]
            active_open = "<<"
            "#,
        )
        .unwrap();

        assert_eq!(config.content.asset_base_url, "https://cms.example.org");
        assert_eq!(config.content.normalize_fields, vec!["searchableContent"]);
        assert_eq!(config.content.preview_chars, 160);
        assert_eq!(config.search.active_open, "<<");
        assert_eq!(config.search.match_open, "[");
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.default_aspect_ratio(), AspectRatio::Widescreen);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.embed.default_aspect_ratio = "4:3".to_string();
        config.content.normalize_fields.push("description".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.default_aspect_ratio(), AspectRatio::Standard);
    }

    #[test]
    fn test_invalid_config_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[content\nbroken").unwrap();
        assert!(Config::load_from(&path).is_none());
        assert!(Config::load_from(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn test_bad_values_fall_back() {
        let mut config = Config::default();
        config.embed.default_aspect_ratio = "21:9".to_string();
        assert_eq!(config.default_aspect_ratio(), AspectRatio::Widescreen);

        config.content.asset_base_url = "nope".to_string();
        assert!(config.content_mapper().is_err());
    }
}
