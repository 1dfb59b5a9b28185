//! Application configuration
//!
//! Stored by confy as TOML (`<config dir>/pressure/config.toml`). Missing
//! files are created with defaults on first run; malformed values fall back
//! to their defaults and are never surfaced to the user.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::TICKS_PER_SECOND;
use crate::error::ConfigError;
use crate::interaction::InteractionConfig;
use crate::serde_defaults::*;

pub const APP_NAME: &str = "pressure";
pub const CONFIG_NAME: &str = "config";

/// Font file looked up next to the executable when none is configured
pub const DEFAULT_FONT_FILE: &str = "font.ttf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds the pointer must rest on the widget before it unlocks
    #[serde(deserialize_with = "lenient_f32")]
    pub hover_threshold: f32,
    /// Fraction of the remaining opacity gap closed per tick
    #[serde(deserialize_with = "lenient_f32")]
    pub fade_rate: f32,
    /// Opacity while locked
    #[serde(deserialize_with = "lenient_f32")]
    pub passive_alpha: f32,
    #[serde(deserialize_with = "lenient_bool")]
    pub show_seconds: bool,
    /// Window width as a multiple of the text width
    #[serde(deserialize_with = "lenient_f32")]
    pub fit_margin: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hover_threshold: default_hover_threshold(),
            fade_rate: default_fade_rate(),
            passive_alpha: default_passive_alpha(),
            show_seconds: default_true(),
            fit_margin: default_fit_margin(),
            font_path: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location, falling back to defaults on error
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, source = ?std::error::Error::source(&e), "Using default configuration");
            Self::default()
        })
    }

    pub fn try_load() -> Result<Self, ConfigError> {
        let config: Self = confy::load(APP_NAME, CONFIG_NAME)?;
        Ok(config.sanitized())
    }

    /// Load from an explicit file, falling back to defaults on error
    pub fn load_from(path: &Path) -> Self {
        Self::try_load_from(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, source = ?std::error::Error::source(&e), "Using default configuration");
            Self::default()
        })
    }

    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = confy::load_path(path).map_err(|source| ConfigError::LoadPath {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    /// Where `load` reads from, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
    }

    /// Replace out-of-range or non-finite values with their defaults
    pub fn sanitized(mut self) -> Self {
        if !self.hover_threshold.is_finite() || self.hover_threshold < 0.0 {
            tracing::warn!(value = self.hover_threshold, "Invalid hover_threshold, using default");
            self.hover_threshold = default_hover_threshold();
        }
        if !self.fade_rate.is_finite() || self.fade_rate <= 0.0 || self.fade_rate > 1.0 {
            tracing::warn!(value = self.fade_rate, "Invalid fade_rate, using default");
            self.fade_rate = default_fade_rate();
        }
        if !self.passive_alpha.is_finite() {
            tracing::warn!("Invalid passive_alpha, using default");
            self.passive_alpha = default_passive_alpha();
        }
        self.passive_alpha = self.passive_alpha.clamp(0.0, 1.0);
        if !self.fit_margin.is_finite() || self.fit_margin < 1.0 {
            tracing::warn!(value = self.fit_margin, "Invalid fit_margin, using default");
            self.fit_margin = default_fit_margin();
        }
        self
    }

    pub fn hover_threshold_ticks(&self) -> u32 {
        (self.hover_threshold * TICKS_PER_SECOND as f32).round() as u32
    }

    pub fn interaction(&self) -> InteractionConfig {
        InteractionConfig {
            hover_threshold_ticks: self.hover_threshold_ticks(),
            fade_rate: self.fade_rate,
            passive_alpha: self.passive_alpha,
        }
    }

    /// Configured font, or `font.ttf` beside the executable
    pub fn resolved_font_path(&self) -> PathBuf {
        if let Some(path) = &self.font_path {
            return path.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_FONT_FILE)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AppConfig {
        toml::from_str::<AppConfig>(text).unwrap().sanitized()
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse(""), AppConfig::default());
    }

    #[test]
    fn test_lenient_values() {
        let config = parse(
            r#"
            hover_threshold = "0.5"
            fade_rate = "0.2f"
            passive_alpha = 3
            show_seconds = "0"
            "#,
        );
        assert_eq!(config.hover_threshold, 0.5);
        assert_eq!(config.hover_threshold_ticks(), 50);
        assert_eq!(config.fade_rate, 0.2);
        assert_eq!(config.passive_alpha, 1.0);
        assert!(!config.show_seconds);
    }

    #[test]
    fn test_malformed_values_fall_back_to_defaults() {
        let config = parse(
            r#"
            hover_threshold = -4.0
            fade_rate = "fast"
            passive_alpha = [1, 2]
            fit_margin = 0.5
            show_seconds = "sometimes"
            "#,
        );
        let defaults = AppConfig::default();
        assert_eq!(config.hover_threshold, defaults.hover_threshold);
        assert_eq!(config.fade_rate, defaults.fade_rate);
        assert_eq!(config.passive_alpha, defaults.passive_alpha);
        assert_eq!(config.fit_margin, defaults.fit_margin);
        assert!(config.show_seconds);
    }

    #[test]
    fn test_fade_rate_bounds() {
        assert_eq!(parse("fade_rate = 1.0").fade_rate, 1.0);
        assert_eq!(parse("fade_rate = 0.0").fade_rate, 0.05);
        assert_eq!(parse("fade_rate = 1.5").fade_rate, 0.05);
    }

    #[test]
    fn test_interaction_config() {
        let config = AppConfig {
            hover_threshold: 0.25,
            ..AppConfig::default()
        };
        let interaction = config.interaction();
        assert_eq!(interaction.hover_threshold_ticks, 25);
        assert_eq!(interaction.fade_rate, 0.05);
        assert_eq!(interaction.passive_alpha, 0.1);
    }

    #[test]
    fn test_explicit_font_path_wins() {
        let config = AppConfig {
            font_path: Some(PathBuf::from("/tmp/digits.ttf")),
            ..AppConfig::default()
        };
        assert_eq!(config.resolved_font_path(), PathBuf::from("/tmp/digits.ttf"));
        assert!(
            AppConfig::default()
                .resolved_font_path()
                .ends_with(DEFAULT_FONT_FILE)
        );
    }
}
