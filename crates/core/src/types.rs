//! Core type definitions

use serde::{Deserialize, Serialize};

/// Sprite flip mode, as stored in the `flip` object property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlipMode {
    #[default]
    None = 0,
    Horizontal = 1,
    Vertical = 2,
}

impl FlipMode {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Horizontal),
            2 => Some(Self::Vertical),
            _ => None,
        }
    }
}
