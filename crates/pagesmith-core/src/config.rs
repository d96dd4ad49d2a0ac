//! Editor configuration and element defaults.

use crate::color::{ColorMode, Swatch};
use crate::element::{ElementType, TextAlign};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback API base URL when the server does not provide one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Canvas size and zoom limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub default_width: f64,
    pub default_height: f64,
    pub min_size: f64,
    pub max_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// Padding subtracted from the workspace before fitting the canvas.
    pub fit_padding: f64,
}

impl CanvasConfig {
    /// Check that every limit is finite and each min/max pair is ordered.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("canvas.default_width", self.default_width),
            ("canvas.default_height", self.default_height),
            ("canvas.min_size", self.min_size),
            ("canvas.max_size", self.max_size),
            ("canvas.min_zoom", self.min_zoom),
            ("canvas.max_zoom", self.max_zoom),
            ("canvas.zoom_step", self.zoom_step),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{field} must be positive, got {value}")));
            }
        }
        if !self.fit_padding.is_finite() || self.fit_padding < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "canvas.fit_padding must not be negative, got {}",
                self.fit_padding
            )));
        }
        if self.min_size > self.max_size {
            return Err(ConfigError::Invalid(format!(
                "canvas.min_size {} exceeds canvas.max_size {}",
                self.min_size, self.max_size
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "canvas.min_zoom {} exceeds canvas.max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            default_width: 595.0,
            default_height: 842.0,
            min_size: 100.0,
            max_size: 2000.0,
            min_zoom: 0.25,
            max_zoom: 4.0,
            zoom_step: 0.25,
            fit_padding: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Snap distance in screen pixels.
    pub threshold: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 5.0,
        }
    }
}

/// Geometric limits applied to elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    pub min_element_size: f64,
    /// Portion of an element that must stay within the canvas after resize or load.
    pub boundary_buffer: f64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            min_element_size: 20.0,
            boundary_buffer: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub text: String,
    pub background: String,
    pub border: String,
    pub guide: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            text: "#333333".to_string(),
            background: "#3498db".to_string(),
            border: "#2c3e50".to_string(),
            guide: "#00FFFF".to_string(),
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub api_base_url: Option<String>,
    pub canvas: CanvasConfig,
    pub snap: SnapConfig,
    pub constraints: ConstraintConfig,
    pub colors: ColorConfig,
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.canvas.validate()?;
        let limits = [
            ("snap.threshold", self.snap.threshold),
            ("constraints.min_element_size", self.constraints.min_element_size),
            ("constraints.boundary_buffer", self.constraints.boundary_buffer),
        ];
        for (field, value) in limits {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The API base URL, falling back to [`DEFAULT_API_BASE_URL`].
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Adopt the URLs served by the remote `config` endpoint.
    pub fn apply_remote(&mut self, remote: &RemoteConfig) {
        if let Some(url) = remote.api_base_url.as_deref().filter(|u| !u.is_empty()) {
            log::info!("Using API base URL from server: {url}");
            self.api_base_url = Some(url.to_string());
        }
    }
}

/// Response of the remote `config` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

/// Initial field values for a freshly created element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDefaults {
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub text_align: TextAlign,
    pub line_height: f64,
    pub color: Swatch,
    pub background: Swatch,
    pub border: Swatch,
    pub border_width: f64,
    pub opacity: f64,
    pub rotation: f64,
    pub color_mode: ColorMode,
}

impl ElementDefaults {
    /// Defaults shared by every element type.
    pub fn base(colors: &ColorConfig) -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            text: String::new(),
            font_size: 14.0,
            font_family: "Arial".to_string(),
            text_align: TextAlign::Left,
            line_height: 18.0,
            color: Swatch::from_hex(&colors.text),
            background: Swatch::from_hex(&colors.background),
            border: Swatch::from_hex(&colors.border),
            border_width: 1.0,
            opacity: 1.0,
            rotation: 0.0,
            color_mode: ColorMode::Hex,
        }
    }

    /// Defaults for a specific element type.
    pub fn for_type(element_type: ElementType, colors: &ColorConfig) -> Self {
        let base = Self::base(colors);
        match element_type {
            ElementType::Text => Self {
                width: 120.0,
                height: 30.0,
                text: "Sample Text".to_string(),
                font_size: 14.0,
                ..base
            },
            ElementType::Heading => Self {
                width: 150.0,
                height: 40.0,
                text: "Heading".to_string(),
                font_size: 20.0,
                ..base
            },
            ElementType::Rectangle => Self {
                width: 100.0,
                height: 60.0,
                ..base
            },
            ElementType::Circle => Self {
                width: 60.0,
                height: 60.0,
                ..base
            },
            ElementType::Line => Self {
                width: 100.0,
                height: 2.0,
                ..base
            },
            ElementType::Image => Self {
                width: 100.0,
                height: 100.0,
                ..base
            },
        }
    }
}

/// Map a font family name to a CSS-style font stack.
pub fn font_stack(family: &str) -> &'static str {
    match family {
        "Helvetica" => "Helvetica, Arial, sans-serif",
        "Times-Roman" => "'Times New Roman', Times, serif",
        "Courier" => "'Courier New', Courier, monospace",
        "Nimbus" => "'Nimbus Sans', Arial, sans-serif",
        _ => "Arial, sans-serif",
    }
}
