//! The atomic simulation unit

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{MaterialType, Physics};

/// Structural stability record, only meaningful for scaffolding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    /// Rests on solid ground or the world floor. Sticky once set
    pub anchored: bool,
    pub vertical_stable: bool,
    pub horizontal_stable: bool,
    /// Scaffold cells between this one and its anchor
    pub vertical_chain: u32,
    /// Sideways distance to the supporting strut
    pub horizontal_chain: u32,
}

impl Support {
    /// Stability record of an anchor
    pub fn anchor() -> Self {
        Self {
            anchored: true,
            vertical_stable: true,
            horizontal_stable: true,
            vertical_chain: 0,
            horizontal_chain: 0,
        }
    }
}

/// One grid position worth of material
///
/// Cells are small `Copy` values. A swap exchanges the complete cell, so motion
/// state, support and color all travel with the material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub material: MaterialType,
    pub physics: Physics,
    pub support: Support,
    /// RGBA display color
    pub color: [u8; 4],
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        material: MaterialType::Empty,
        physics: Physics::EMPTY,
        support: Support {
            anchored: false,
            vertical_stable: false,
            horizontal_stable: false,
            vertical_chain: 0,
            horizontal_chain: 0,
        },
        color: [0, 0, 0, 0],
    };

    /// Cell with the material's default physics and undarkened base color
    pub fn new(material: MaterialType) -> Self {
        Self {
            material,
            physics: Physics::for_material(material),
            support: Support::default(),
            color: material.base_color(),
        }
    }

    /// Cell whose color is darkened per channel by `shade` (each in `[0, 1)`),
    /// scaled by the material's shade range
    pub fn shaded(material: MaterialType, shade: [f32; 3]) -> Self {
        let mut cell = Self::new(material);
        let range = material.shade_range() * 255.0;
        for (channel, amount) in cell.color.iter_mut().zip(shade) {
            let darken = (amount.clamp(0.0, 1.0) * range) as u8;
            *channel = channel.saturating_sub(darken);
        }
        cell
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.material == MaterialType::Empty
    }

    /// Whether `other` may displace this cell, i.e. `other` is strictly heavier
    #[inline]
    pub fn is_empty_for(&self, other: &Cell) -> bool {
        other.physics.mass > self.physics.mass
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::new(MaterialType::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mass={:.2} falling={} lock=({}, {}) momentum={:.2} dir=({}, {})",
            self.material.name(),
            self.physics.mass,
            self.physics.is_falling(),
            self.physics.cancel_horizontal_motion(),
            self.physics.cancel_vertical_motion(),
            self.physics.momentum,
            self.physics.momentum_direction.x,
            self.physics.momentum_direction.y,
        )?;
        if self.material == MaterialType::Scaffolding {
            write!(
                f,
                " anchored={} stable=({}, {}) chain=({}, {})",
                self.support.anchored,
                self.support.vertical_stable,
                self.support.horizontal_stable,
                self.support.vertical_chain,
                self.support.horizontal_chain,
            )?;
        }
        Ok(())
    }
}
