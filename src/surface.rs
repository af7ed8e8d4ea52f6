use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::TileSize;

/// sRGB RGBA.
pub type Color = [f32; 4];

/// Named style colours looked up by the rendering passes.
pub const GRID: &str = "grid";
pub const FOCUS: &str = "focus";
pub const GHOST: &str = "ghost";
pub const PATH: &str = "path";
pub const WINDOW: &str = "window";

const FALLBACK_COLOR: Color = [1.0, 0.0, 1.0, 1.0];

/// Visual configuration of a world: tile geometry, image paths and colours.
///
/// Loaded from RON (see `loading::load_surface`). Any field left out of the
/// file takes its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSurface {
    pub name: String,
    pub tile_size: TileSize,
    /// Image path by terrain/settlement/unit type id.
    pub images: HashMap<String, String>,
    /// Style colours by name (`grid`, `focus`, `ghost`, `path`, `window`).
    pub colors: HashMap<String, Color>,
    /// Flat fill per terrain type for scaled (minimap/preview) views.
    pub mini_colors: HashMap<String, Color>,
    /// Banner colour per owner.
    pub owner_colors: HashMap<String, Color>,
}

impl Default for WorldSurface {
    fn default() -> Self {
        let colors = [
            (GRID, [0.15, 0.15, 0.15, 1.0]),
            (FOCUS, [1.0, 0.85, 0.2, 1.0]),
            (GHOST, [1.0, 0.85, 0.2, 0.4]),
            (PATH, [0.1, 0.7, 0.2, 0.8]),
            (WINDOW, [0.0, 0.0, 0.0, 1.0]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            name: "default".to_string(),
            tile_size: TileSize::default(),
            images: HashMap::new(),
            colors,
            mini_colors: HashMap::new(),
            owner_colors: HashMap::new(),
        }
    }
}

impl WorldSurface {
    pub fn image(&self, id: &str) -> Option<&str> {
        self.images.get(id).map(String::as_str)
    }

    pub fn color(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(FALLBACK_COLOR)
    }

    pub fn mini_color(&self, terrain: &str) -> Color {
        self.mini_colors
            .get(terrain)
            .copied()
            .unwrap_or_else(|| self.color(GRID))
    }

    pub fn owner_color(&self, owner: Option<&str>) -> Color {
        owner
            .and_then(|o| self.owner_colors.get(o))
            .copied()
            .unwrap_or([0.5, 0.5, 0.5, 1.0])
    }

    /// Every distinct image path, sorted. This is the load set for a view.
    pub fn image_paths(&self) -> Vec<String> {
        self.images
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_style_colors() {
        let s = WorldSurface::default();
        for name in [GRID, FOCUS, GHOST, PATH, WINDOW] {
            assert_ne!(s.color(name), FALLBACK_COLOR, "{name}");
        }
        assert_eq!(s.tile_size, TileSize::new(128, 128));
    }

    #[test]
    fn unknown_color_falls_back() {
        let s = WorldSurface::default();
        assert_eq!(s.color("nope"), FALLBACK_COLOR);
    }

    #[test]
    fn image_paths_are_deduplicated() {
        let mut s = WorldSurface::default();
        s.images.insert("plains".into(), "img/plains.png".into());
        s.images.insert("grass".into(), "img/plains.png".into());
        s.images.insert("hills".into(), "img/hills.png".into());
        assert_eq!(
            s.image_paths(),
            vec!["img/hills.png".to_string(), "img/plains.png".to_string()]
        );
    }

    #[test]
    fn mini_color_defaults_to_grid() {
        let s = WorldSurface::default();
        assert_eq!(s.mini_color("lava"), s.color(GRID));
    }
}
