use crate::error::{AlbummuxError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Video encode settings passed to the external transcoder.
///
/// The defaults give a visually-lossless-ish picture at a tiny bitrate: the
/// frame is static, so one frame per second is plenty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub crf: u8,
    pub preset: String,
    pub frame_rate: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            crf: 18,
            preset: "medium".to_string(),
            frame_rate: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub video: VideoSettings,
    /// Preferred font file for frame text. Tried before the built-in
    /// candidate list; rendering falls back further when it cannot be parsed.
    pub font_path: Option<PathBuf>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let mut settings = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_settings) = toml::from_str::<Settings>(&contents) {
                    settings = file_settings;
                }
            }
        }

        // Override with environment variables
        if let Ok(crf) = std::env::var("ALBUMMUX_CRF") {
            if let Ok(c) = crf.parse() {
                settings.video.crf = c;
            }
        }
        if let Ok(preset) = std::env::var("ALBUMMUX_PRESET") {
            if !preset.trim().is_empty() {
                settings.video.preset = preset;
            }
        }
        if let Ok(rate) = std::env::var("ALBUMMUX_FRAME_RATE") {
            if let Ok(r) = rate.parse() {
                settings.video.frame_rate = r;
            }
        }
        if let Ok(font) = std::env::var("ALBUMMUX_FONT") {
            if !font.trim().is_empty() {
                settings.font_path = Some(PathBuf::from(font));
            }
        }

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.video.crf > 51 {
            return Err(AlbummuxError::InvalidJob(
                "CRF must be between 0 and 51".to_string(),
            ));
        }
        if self.video.frame_rate == 0 {
            return Err(AlbummuxError::InvalidJob(
                "Frame rate must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("albummux").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.video.crf, 18);
        assert_eq!(settings.video.preset, "medium");
        assert_eq!(settings.video.frame_rate, 1);
        assert!(settings.font_path.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_crf() {
        let mut settings = Settings::default();
        settings.video.crf = 52;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_frame_rate() {
        let mut settings = Settings::default();
        settings.video.frame_rate = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str("[video]\ncrf = 22\n").unwrap();
        assert_eq!(settings.video.crf, 22);
        assert_eq!(settings.video.preset, "medium");
        assert_eq!(settings.video.frame_rate, 1);
    }
}
