//! Brush footprints for painting areas of cells

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest radius a brush footprint is allowed to cover
pub const MAX_BRUSH_RADIUS: i32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrushShape {
    #[default]
    Circle,
    Square,
}

impl BrushShape {
    /// Offsets (relative to the brush center) covered at `radius`
    ///
    /// Radius 0 paints a single cell. Negative radii are treated as 0 and
    /// anything past [`MAX_BRUSH_RADIUS`] is clamped.
    pub fn footprint(self, radius: i32) -> impl Iterator<Item = IVec2> {
        let r = radius.clamp(0, MAX_BRUSH_RADIUS);
        (-r..=r)
            .flat_map(move |dy| (-r..=r).map(move |dx| IVec2::new(dx, dy)))
            .filter(move |offset| match self {
                BrushShape::Circle => offset.length_squared() <= r * r,
                BrushShape::Square => true,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            BrushShape::Circle => "circle",
            BrushShape::Square => "square",
        }
    }
}

impl FromStr for BrushShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circle" | "round" => Ok(BrushShape::Circle),
            "square" | "box" => Ok(BrushShape::Square),
            other => Err(format!("unknown brush shape '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_zero_is_single_cell() {
        for shape in [BrushShape::Circle, BrushShape::Square] {
            let cells: Vec<_> = shape.footprint(0).collect();
            assert_eq!(cells, vec![IVec2::ZERO]);
        }
    }

    #[test]
    fn test_circle_footprint() {
        let cells: Vec<_> = BrushShape::Circle.footprint(1).collect();
        assert_eq!(cells.len(), 5);
        assert!(!cells.contains(&IVec2::new(1, 1)));

        // r = 2 covers the 5x5 box minus its 4 corners and the 8 cells next to them
        assert_eq!(BrushShape::Circle.footprint(2).count(), 13);
    }

    #[test]
    fn test_square_footprint() {
        assert_eq!(BrushShape::Square.footprint(1).count(), 9);
        assert_eq!(BrushShape::Square.footprint(3).count(), 49);
    }

    #[test]
    fn test_radius_is_clamped() {
        let side = (2 * MAX_BRUSH_RADIUS + 1) as usize;
        assert_eq!(BrushShape::Square.footprint(1000).count(), side * side);
        assert_eq!(BrushShape::Square.footprint(-4).count(), 1);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Circle".parse::<BrushShape>(), Ok(BrushShape::Circle));
        assert_eq!("box".parse::<BrushShape>(), Ok(BrushShape::Square));
        assert!("triangle".parse::<BrushShape>().is_err());
    }
}
