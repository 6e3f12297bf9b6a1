//! Material kinds

use serde::{Deserialize, Serialize};

/// The closed set of materials a cell can hold
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialType {
    /// Air. Massless, never moves, displaced by everything
    #[default]
    Empty,
    /// Granular material that falls, piles and slides (sand)
    Solid,
    /// Falls and spreads sideways up to its viscosity (water)
    Liquid,
    /// Rigid structure held up by chains of support
    Scaffolding,
}

impl MaterialType {
    /// Every material, in display order
    pub const ALL: [MaterialType; 4] = [
        MaterialType::Empty,
        MaterialType::Solid,
        MaterialType::Liquid,
        MaterialType::Scaffolding,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaterialType::Empty => "empty",
            MaterialType::Solid => "solid",
            MaterialType::Liquid => "liquid",
            MaterialType::Scaffolding => "scaffolding",
        }
    }

    /// Undarkened RGBA color a renderer should start from
    pub fn base_color(self) -> [u8; 4] {
        match self {
            MaterialType::Empty => [0, 0, 0, 0],
            MaterialType::Solid => [255, 255, 0, 255],
            MaterialType::Liquid => [0, 0, 255, 255],
            MaterialType::Scaffolding => [139, 69, 19, 255],
        }
    }

    /// Largest fraction of each channel removed by the per-cell shade
    pub fn shade_range(self) -> f32 {
        match self {
            MaterialType::Empty => 0.0,
            MaterialType::Liquid => 1.0 / 6.0,
            MaterialType::Solid | MaterialType::Scaffolding => 0.25,
        }
    }

    /// Single character used by text renderers
    pub fn glyph(self) -> char {
        match self {
            MaterialType::Empty => '.',
            MaterialType::Solid => '#',
            MaterialType::Liquid => '~',
            MaterialType::Scaffolding => 'H',
        }
    }

    pub fn is_movable(self) -> bool {
        matches!(self, MaterialType::Solid | MaterialType::Liquid)
    }
}

impl std::str::FromStr for MaterialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "empty" | "air" => Ok(MaterialType::Empty),
            "solid" | "sand" => Ok(MaterialType::Solid),
            "liquid" | "water" => Ok(MaterialType::Liquid),
            "scaffolding" | "scaffold" => Ok(MaterialType::Scaffolding),
            other => Err(format!("unknown material '{}'", other)),
        }
    }
}
