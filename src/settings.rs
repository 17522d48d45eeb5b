//! Site-wide preferences
//!
//! Handed to every mount as a snapshot. Nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PARTICLES;
use crate::error::Result;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 300,
            QualityPreset::High => MAX_PARTICLES,
        }
    }

    /// Whether to render parallax layers
    pub fn parallax_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Preferences the embedding page passes in at mount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Custom cursor effect on the page
    pub cursor_enabled: bool,
    /// Game sound effects
    pub sound_enabled: bool,
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Reduced motion (static background grid)
    pub reduced_motion: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            cursor_enabled: true,
            sound_enabled: false,
            quality: QualityPreset::Medium,
            reduced_motion: false,
        }
    }
}

impl SiteSettings {
    /// Parse settings JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        self.quality.max_particles()
    }

    /// Effective parallax (respects quality)
    pub fn parallax_enabled(&self) -> bool {
        self.quality.parallax_enabled()
    }

    /// Effective grid animation (respects reduced_motion)
    pub fn animate_background(&self) -> bool {
        !self.reduced_motion
    }
}

/// Owner of the current site settings for the app's lifetime
#[derive(Debug, Clone, Default)]
pub struct SettingsProvider {
    current: SiteSettings,
}

impl SettingsProvider {
    pub fn new(settings: SiteSettings) -> Self {
        log::info!(
            "Settings: quality={} sound={} reduced_motion={}",
            settings.quality.as_str(),
            settings.sound_enabled,
            settings.reduced_motion
        );
        Self { current: settings }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        SiteSettings::from_json(json).map(Self::new)
    }

    /// Copy handed to a mount at construction
    pub fn snapshot(&self) -> SiteSettings {
        self.current.clone()
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.current.sound_enabled = enabled;
    }

    pub fn set_quality(&mut self, quality: QualityPreset) {
        self.current.quality = quality;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SiteSettings::default();
        assert!(s.cursor_enabled);
        assert!(!s.sound_enabled);
        assert_eq!(s.quality, QualityPreset::Medium);
        assert!(s.animate_background());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = SiteSettings::from_json(r#"{"sound_enabled": true, "quality": "low"}"#).unwrap();
        assert!(s.sound_enabled);
        assert!(s.cursor_enabled);
        assert_eq!(s.max_particles(), 100);
        assert!(!s.parallax_enabled());
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(SiteSettings::from_json("{not json").is_err());
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!(QualityPreset::from_str("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert!(QualityPreset::High.max_particles() <= MAX_PARTICLES);
    }

    #[test]
    fn test_provider_quality_by_name() {
        let mut provider = SettingsProvider::new(SiteSettings::default());
        provider.set_quality(QualityPreset::from_str("Low").unwrap());
        let snap = provider.snapshot();
        assert_eq!(snap.quality, QualityPreset::Low);
        assert_eq!(snap.max_particles(), 100);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut provider = SettingsProvider::new(SiteSettings::default());
        let before = provider.snapshot();
        provider.set_sound_enabled(true);
        assert!(!before.sound_enabled);
        assert!(provider.snapshot().sound_enabled);
    }
}
