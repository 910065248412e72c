//! Position and rectangle types for game objects and tiles

use serde::{Deserialize, Serialize};

/// 2D vector in pixel space (positions, velocities, accelerations)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Build a vector from integer components, as stored in map property bags
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
        }
    }
}

/// Integer pixel rectangle (source or destination of a blit)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle at a pixel offset computed in 64-bit space
    ///
    /// Offsets past `i32::MAX` saturate instead of wrapping negative.
    pub fn from_pixels(x: u64, y: u64, width: u32, height: u32) -> Self {
        let clamp = |v: u64| i32::try_from(v).unwrap_or(i32::MAX);
        Self {
            x: clamp(x),
            y: clamp(y),
            width,
            height,
        }
    }
}
