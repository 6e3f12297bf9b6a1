//! Scripted scenes for the headless driver

use std::fmt;
use std::str::FromStr;

use glam::IVec2;
use sandfall_core::simulation::MaterialType;
use sandfall_core::world::{BrushShape, World};

/// How many ticks the pour scenario keeps its tap open
const POUR_TICKS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// A tall column of sand dropped onto an empty floor
    Pile,
    /// Water poured from a tap into a basin
    Pour,
    /// Scaffold tower with a strut, then sand dropped onto it
    Bridge,
    /// Everything at once
    Mixed,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Pile,
        Scenario::Pour,
        Scenario::Bridge,
        Scenario::Mixed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Pile => "pile",
            Scenario::Pour => "pour",
            Scenario::Bridge => "bridge",
            Scenario::Mixed => "mixed",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::Pile => "column of sand collapsing into a heap",
            Scenario::Pour => "water poured into a basin with solid walls",
            Scenario::Bridge => "scaffold tower with an overhanging strut catching sand",
            Scenario::Mixed => "sand, water and scaffolding in one world",
        }
    }

    /// Paint the initial scene
    pub fn setup(self, world: &mut World) {
        let (w, h) = (world.width(), world.height());
        let floor = h - 1;
        log::info!("[SCENARIO] Setting up '{}' on a {}x{} world", self.name(), w, h);

        match self {
            Scenario::Pile => {
                for y in 0..h / 2 {
                    for x in w / 2 - 1..=w / 2 + 1 {
                        world.paint_cell(IVec2::new(x, y), MaterialType::Solid);
                    }
                }
            }
            Scenario::Pour => {
                let left = w / 4;
                let right = w - w / 4;
                for y in h / 2..h {
                    world.paint_cell(IVec2::new(left, y), MaterialType::Solid);
                    world.paint_cell(IVec2::new(right, y), MaterialType::Solid);
                }
                for x in left..=right {
                    world.paint_cell(IVec2::new(x, floor), MaterialType::Solid);
                }
            }
            Scenario::Bridge => {
                let tower_x = w / 3;
                let top = h / 2;
                for y in top..h {
                    world.paint_cell(IVec2::new(tower_x, y), MaterialType::Scaffolding);
                }
                for x in tower_x + 1..=tower_x + 5 {
                    world.paint_cell(IVec2::new(x, top), MaterialType::Scaffolding);
                }
                world.paint_area(
                    IVec2::new(tower_x + 3, top / 3),
                    2,
                    BrushShape::Circle,
                    MaterialType::Solid,
                );
            }
            Scenario::Mixed => {
                world.paint_area(
                    IVec2::new(w / 5, h / 4),
                    (h / 6).max(1),
                    BrushShape::Circle,
                    MaterialType::Solid,
                );
                world.paint_area(
                    IVec2::new(w - w / 4, h / 3),
                    (h / 5).max(1),
                    BrushShape::Circle,
                    MaterialType::Liquid,
                );
                let tower_x = w / 2;
                for y in h - h / 3..h {
                    world.paint_cell(IVec2::new(tower_x, y), MaterialType::Scaffolding);
                }
                for x in tower_x - 3..tower_x {
                    world.paint_cell(IVec2::new(x, h - h / 3), MaterialType::Scaffolding);
                }
            }
        }
    }

    /// Per-tick input after setup; returns true while the scenario is still adding cells
    pub fn feed(self, world: &mut World, tick: u64) -> bool {
        match self {
            Scenario::Pour if tick <= POUR_TICKS => {
                let tap = IVec2::new(world.width() / 2, 0);
                world.paint_cell(tap, MaterialType::Liquid);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Scenario::ALL.iter().map(|s| s.name()).collect();
                anyhow::anyhow!("Unknown scenario '{}'. Available: {}", s, names.join(", "))
            })
    }
}

/// Render the whole world as text, one glyph per cell
pub fn render_ascii(world: &World) -> String {
    let width = world.width().max(0) as usize;
    let mut out = String::with_capacity((width + 1) * world.height().max(0) as usize);
    for y in 0..world.height() {
        for x in 0..world.width() {
            let glyph = world
                .get_cell_at(IVec2::new(x, y))
                .map_or(' ', |cell| cell.material.glyph());
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
