//! Configuration system
//!
//! Renderer settings that the editor exposes as user preferences: the
//! opacity cut-off, model substitution, grid appearance and overlay tints.
//! Any [`Config`] type can be loaded from and saved to TOML or RON files.

pub use serde::{Serialize, Deserialize};

use crate::foundation::colour::Colour;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCacheConfig {
    /// Primitives whose owner opacity is at or below this value are not drawn
    pub opacity_threshold: f32,

    /// Substitute model-bearing entities with their cached model batch.
    /// When off, every entity is drawn as its bounding box.
    pub model_rendering: bool,

    /// 2D grid appearance
    pub grid: GridConfig,

    /// Tints applied to selection passes
    pub colours: OverlayColours,
}

impl Default for RenderCacheConfig {
    fn default() -> Self {
        Self {
            opacity_threshold: 0.1,
            model_rendering: true,
            grid: GridConfig::default(),
            colours: OverlayColours::default(),
        }
    }
}

impl Config for RenderCacheConfig {}

/// 2D grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Lower map bound on every axis
    pub map_low: f64,
    /// Upper map bound on every axis
    pub map_high: f64,
    /// Coarsen the grid when lines would be closer than `hide_smaller_than` pixels
    pub hide_smaller: bool,
    /// Minimum on-screen distance between grid lines, in pixels
    pub hide_smaller_than: f64,
    /// Factor the step is multiplied by each time the grid is coarsened
    pub hide_factor: f64,
    /// Highlight every n-th line
    pub highlight1: bool,
    /// Line interval for the first highlight
    pub highlight1_line_num: f64,
    /// Highlight lines on multiples of a world unit interval
    pub highlight2: bool,
    /// World unit interval for the second highlight
    pub highlight2_unit_num: f64,
    /// Ordinary grid line colour
    pub grid_lines: Colour,
    /// Colour of the axis lines through zero
    pub zero_lines: Colour,
    /// Colour of the map boundary rectangle
    pub boundary_lines: Colour,
    /// First highlight colour
    pub highlight1_colour: Colour,
    /// Second highlight colour
    pub highlight2_colour: Colour,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            map_low: -4096.0,
            map_high: 4096.0,
            hide_smaller: true,
            hide_smaller_than: 4.0,
            hide_factor: 8.0,
            highlight1: true,
            highlight1_line_num: 8.0,
            highlight2: true,
            highlight2_unit_num: 1024.0,
            grid_lines: Colour::rgb(75, 75, 75),
            zero_lines: Colour::rgb(0, 100, 100),
            boundary_lines: Colour::RED,
            highlight1_colour: Colour::rgb(115, 115, 115),
            highlight2_colour: Colour::rgb(100, 46, 0),
        }
    }
}

/// Tints used by the selection passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayColours {
    /// Selection outline in the static 2D batch, left behind while transforming
    pub selection_ghost_2d: Colour,
    /// Selection outline in the transformed 2D batch
    pub selection_2d: Colour,
    /// Selection outline drawn over shaded 3D views
    pub selection_outline_3d: Colour,
    /// Translucent mask drawn over selected faces in 3D
    pub face_mask: Colour,
}

impl Default for OverlayColours {
    fn default() -> Self {
        Self {
            selection_ghost_2d: Colour::rgb(128, 0, 0),
            selection_2d: Colour::RED,
            selection_outline_3d: Colour::YELLOW,
            face_mask: Colour::RED.with_alpha(64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        let mut path = std::env::temp_dir();
        path.push(format!("render_cache_{}_{}", std::process::id(), name));
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_default_config() {
        let config = RenderCacheConfig::default();
        assert!((config.opacity_threshold - 0.1).abs() < f32::EPSILON);
        assert!(config.model_rendering);
        assert_eq!(config.grid.map_high, 4096.0);
        assert_eq!(config.colours.face_mask, Colour::rgba(255, 0, 0, 64));
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("config.toml");
        let mut config = RenderCacheConfig::default();
        config.model_rendering = false;
        config.grid.hide_factor = 4.0;

        config.save_to_file(&path).unwrap();
        let loaded = RenderCacheConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(&path, "opacity_threshold = 0.25\n[grid]\nhide_smaller = false\n").unwrap();
        let loaded = RenderCacheConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!((loaded.opacity_threshold - 0.25).abs() < f32::EPSILON);
        assert!(!loaded.grid.hide_smaller);
        assert_eq!(loaded.grid.hide_factor, 8.0);
        assert!(loaded.model_rendering);
    }

    #[test]
    fn test_unsupported_format() {
        let result = RenderCacheConfig::default().save_to_file("render.ini");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = RenderCacheConfig::load_from_file(&temp_path("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
