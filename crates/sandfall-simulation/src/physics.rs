//! Per-cell physical parameters and motion state

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::MaterialType;

/// Physical parameters plus the motion state a behavior mutates every tick
///
/// The parameters are plain fields. The falling/locked flags are private so the
/// setters can keep `is_falling` and `cancel_vertical_motion` mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Density used for displacement (heavier cells sink through lighter ones)
    pub mass: f32,
    /// Chance of halting sideways motion per tick, also the slide friction
    pub horizontal_stability: f32,
    /// Chance of halting vertical motion per tick
    pub vertical_stability: f32,
    /// Lateral search radius for liquids
    pub viscosity: i32,
    /// Scales the halt roll; zero disables halting
    pub halt_threshold: f32,
    /// Momentum gained per falling tick, multiplied by mass
    pub momentum_rate: f32,
    /// Upper bound for accumulated momentum
    pub max_momentum: f32,
    /// Accumulated while falling, consumed while sliding
    pub momentum: f32,
    /// Zero, or a unit horizontal vector while sliding
    pub momentum_direction: IVec2,
    is_falling: bool,
    cancel_horizontal_motion: bool,
    cancel_vertical_motion: bool,
}

impl Physics {
    /// Massless and locked on both axes
    pub const EMPTY: Physics = Physics {
        mass: 0.0,
        horizontal_stability: 0.0,
        vertical_stability: 0.0,
        viscosity: 0,
        halt_threshold: 0.0,
        momentum_rate: 0.0,
        max_momentum: 0.0,
        momentum: 0.0,
        momentum_direction: IVec2::ZERO,
        is_falling: false,
        cancel_horizontal_motion: true,
        cancel_vertical_motion: true,
    };

    /// Default parameters for a freshly created cell of `material`
    pub fn for_material(material: MaterialType) -> Self {
        match material {
            MaterialType::Empty => Self::EMPTY,
            MaterialType::Solid => Self {
                mass: 0.33,
                horizontal_stability: 0.25,
                vertical_stability: 0.75,
                viscosity: 0,
                halt_threshold: 0.5,
                momentum_rate: 1.0,
                max_momentum: 3.0,
                ..Self::loose()
            },
            MaterialType::Liquid => Self {
                mass: 0.2,
                horizontal_stability: 0.5,
                vertical_stability: 0.1,
                viscosity: 8,
                halt_threshold: 0.05,
                momentum_rate: 0.5,
                max_momentum: 2.0,
                ..Self::loose()
            },
            MaterialType::Scaffolding => Self {
                mass: 10.0,
                horizontal_stability: 1.0,
                vertical_stability: 1.0,
                viscosity: 0,
                halt_threshold: 1.0,
                momentum_rate: 0.0,
                max_momentum: 0.0,
                ..Self::loose()
            },
        }
    }

    fn loose() -> Self {
        Self {
            mass: 0.0,
            horizontal_stability: 0.0,
            vertical_stability: 0.0,
            viscosity: 0,
            halt_threshold: 0.0,
            momentum_rate: 0.0,
            max_momentum: 0.0,
            momentum: 0.0,
            momentum_direction: IVec2::ZERO,
            is_falling: false,
            cancel_horizontal_motion: false,
            cancel_vertical_motion: false,
        }
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.is_falling
    }

    #[inline]
    pub fn cancel_horizontal_motion(&self) -> bool {
        self.cancel_horizontal_motion
    }

    #[inline]
    pub fn cancel_vertical_motion(&self) -> bool {
        self.cancel_vertical_motion
    }

    /// Entering free fall unlocks the vertical axis
    pub fn set_falling(&mut self, falling: bool) {
        self.is_falling = falling;
        if falling {
            self.cancel_vertical_motion = false;
        }
    }

    pub fn set_cancel_horizontal_motion(&mut self, cancel: bool) {
        self.cancel_horizontal_motion = cancel;
    }

    /// Locking the vertical axis ends any free fall
    pub fn set_cancel_vertical_motion(&mut self, cancel: bool) {
        self.cancel_vertical_motion = cancel;
        if cancel {
            self.is_falling = false;
        }
    }

    /// Re-enable motion on both axes
    pub fn unlock(&mut self) {
        self.cancel_horizontal_motion = false;
        self.cancel_vertical_motion = false;
    }

    /// Lock both axes and drop all motion (the Empty resting state)
    pub fn lock(&mut self) {
        self.cancel_horizontal_motion = true;
        self.set_cancel_vertical_motion(true);
        self.reset_momentum();
    }

    /// Sudden stop: lock the horizontal axis and drop momentum
    pub fn halt(&mut self) {
        self.cancel_horizontal_motion = true;
        self.is_falling = false;
        self.reset_momentum();
    }

    /// Add one tick of falling momentum, capped at `max_momentum`
    pub fn accrue_momentum(&mut self) {
        self.momentum = (self.momentum + self.mass * self.momentum_rate).min(self.max_momentum);
    }

    pub fn reset_momentum(&mut self) {
        self.momentum = 0.0;
        self.momentum_direction = IVec2::ZERO;
    }

    /// Spend one slide step worth of momentum, resetting direction when exhausted
    pub fn consume_momentum(&mut self) {
        self.momentum -= self.horizontal_stability.max(f32::EPSILON);
        if self.momentum <= 0.0 {
            self.reset_momentum();
        }
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::for_material(MaterialType::Empty)
    }
}
