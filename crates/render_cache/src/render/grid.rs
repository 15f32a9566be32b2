//! Background grid for 2D views
//!
//! The grid depends on the zoom level, so it is generated every frame and
//! drawn immediately instead of being cached.

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::foundation::colour::Colour;
use super::backend::GridLine;

/// Grid settings owned by the document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// World units between grid lines at full detail
    pub spacing: f64,
    /// Draw the grid behind 2D views
    pub show_in_2d: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { spacing: 64.0, show_in_2d: true }
    }
}

/// Step actually drawn at `zoom`: the spacing, coarsened by the hide factor
/// until lines are at least `hide_smaller_than` pixels apart.
pub fn effective_step(config: &GridConfig, spacing: f64, zoom: f64) -> f64 {
    let mut step = spacing;
    if !config.hide_smaller || config.hide_factor <= 1.0 || zoom <= 0.0 {
        return step;
    }
    while step * zoom < config.hide_smaller_than {
        step *= config.hide_factor;
    }
    step
}

#[allow(clippy::float_cmp)]
fn line_colour(config: &GridConfig, coordinate: f64, step: f64) -> Colour {
    if coordinate == 0.0 {
        config.zero_lines
    } else if config.highlight2 && coordinate % config.highlight2_unit_num == 0.0 {
        config.highlight2_colour
    } else if config.highlight1 && coordinate % (step * config.highlight1_line_num) == 0.0 {
        config.highlight1_colour
    } else {
        config.grid_lines
    }
}

/// Upper bound on grid steps per axis
pub const MAX_GRID_STEPS: usize = 4096;

/// Grid lines for the current zoom, one horizontal and one vertical line per
/// step, followed by the four sides of the map boundary.
///
/// The step is doubled until at most [`MAX_GRID_STEPS`] fit on the map.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn grid_lines(config: &GridConfig, spacing: f64, zoom: f64) -> Vec<GridLine> {
    let (low, high) = (config.map_low, config.map_high);
    if !spacing.is_finite() || spacing <= 0.0 || high < low {
        return Vec::new();
    }
    let mut step = effective_step(config, spacing, zoom);
    while (high - low) / step > MAX_GRID_STEPS as f64 {
        step *= 2.0;
    }
    let count = ((high - low) / step).floor() as usize;

    let (l, h) = (low as f32, high as f32);
    let mut lines = Vec::with_capacity(2 * (count + 1) + 4);
    for index in 0..=count {
        let coordinate = low + step * index as f64;
        let colour = line_colour(config, coordinate, step);
        let c = coordinate as f32;
        lines.push(GridLine { from: [l, c], to: [h, c], colour });
        lines.push(GridLine { from: [c, l], to: [c, h], colour });
    }

    let colour = config.boundary_lines;
    lines.extend([
        GridLine { from: [l, h], to: [h, h], colour },
        GridLine { from: [l, l], to: [l, h], colour },
        GridLine { from: [h, l], to: [h, h], colour },
        GridLine { from: [l, l], to: [h, l], colour },
    ]);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_unchanged_when_zoomed_in() {
        let config = GridConfig::default();
        assert_eq!(effective_step(&config, 16.0, 1.0), 16.0);
    }

    #[test]
    fn test_step_coarsened_when_zoomed_out() {
        let config = GridConfig::default();
        // 16 * 0.01 = 0.16px -> 128 * 0.01 = 1.28px -> 1024 * 0.01 = 10.24px
        assert_eq!(effective_step(&config, 16.0, 0.01), 1024.0);

        let no_hiding = GridConfig { hide_smaller: false, ..GridConfig::default() };
        assert_eq!(effective_step(&no_hiding, 16.0, 0.01), 16.0);
    }

    #[test]
    fn test_line_count_and_boundary() {
        let config = GridConfig { map_low: -256.0, map_high: 256.0, ..GridConfig::default() };
        let lines = grid_lines(&config, 64.0, 1.0);

        // 9 coordinates, two lines each, plus the boundary
        assert_eq!(lines.len(), 9 * 2 + 4);
        assert!(lines[18..].iter().all(|line| line.colour == config.boundary_lines));
    }

    #[test]
    fn test_line_colours() {
        let config = GridConfig::default();
        assert_eq!(line_colour(&config, 0.0, 64.0), config.zero_lines);
        assert_eq!(line_colour(&config, 2048.0, 64.0), config.highlight2_colour);
        assert_eq!(line_colour(&config, 512.0, 64.0), config.highlight1_colour);
        assert_eq!(line_colour(&config, 64.0, 64.0), config.grid_lines);

        let plain = GridConfig { highlight1: false, highlight2: false, ..GridConfig::default() };
        assert_eq!(line_colour(&plain, 2048.0, 64.0), plain.grid_lines);
    }

    #[test]
    fn test_degenerate_spacing_draws_nothing() {
        assert!(grid_lines(&GridConfig::default(), 0.0, 1.0).is_empty());
        assert!(grid_lines(&GridConfig::default(), f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn test_tiny_spacing_is_capped() {
        let config = GridConfig { hide_smaller: false, ..GridConfig::default() };
        let lines = grid_lines(&config, 1e-9, 1.0);

        assert!(lines.len() <= 2 * (MAX_GRID_STEPS + 1) + 4);
        assert!(lines.len() > 4);
    }
}
