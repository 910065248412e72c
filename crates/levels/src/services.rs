//! Collaborators the loader drives while building a level
//!
//! Passed in explicitly so the loader never reaches for process-wide state.

use crate::objects::SharedObject;
use tilelevel_core::Vector2D;

/// Texture store filled while the map is loaded
pub trait TextureRegistry {
    /// Load the image at `path` under `id`
    ///
    /// Must be idempotent per id. Returns `false` if the image could not be
    /// loaded.
    fn load(&mut self, path: &str, id: &str) -> bool;
}

/// Viewport that follows the player
pub trait Camera {
    fn set_target(&mut self, target: SharedObject);

    fn set_position(&mut self, position: Vector2D);
}
