//! Game objects placed by object layers
//!
//! The object hierarchy itself belongs to the game; the loader only needs a
//! way to build an object from a type name, hand it its initial parameters and
//! ask whether it takes part in collision or is the player.

use crate::level::CollisionLayers;
use crate::{LevelError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tilelevel_core::{FlipMode, Vector2D};

/// Initial parameters handed once to [`GameObject::load`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderParams {
    pub width: i32,
    pub height: i32,
    pub texture_id: String,
    pub current_row: i32,
    pub num_frames: i32,
    pub flip: FlipMode,
    pub callback_id: i32,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub max_velocity: Vector2D,
    pub acceleration: Vector2D,
    pub friction: Vector2D,
}

/// A game-defined object instantiated from an `<object>` element
///
/// Objects are shared through [`SharedObject`] handles, so they must be
/// safe to move and reference across threads.
pub trait GameObject: fmt::Debug + Send + Sync {
    /// Type name the object was created under
    fn type_name(&self) -> &str;

    /// Initialize from the object's property bag
    fn load(&mut self, params: &LoaderParams);

    fn position(&self) -> Vector2D;

    /// Collision capability, if this object collides with tile layers
    fn as_collision_object(&mut self) -> Option<&mut dyn CollisionObject> {
        None
    }
}

/// Objects that query the level's collision layers
pub trait CollisionObject {
    fn set_collision_layers(&mut self, layers: CollisionLayers);

    fn set_collision_margin(&mut self, margin: i32);

    /// Player capability; only players may become the camera target
    fn as_player(&self) -> Option<&dyn Player> {
        None
    }
}

/// Marker for the object the camera follows
pub trait Player {}

/// Shared handle to a placed object
///
/// Held by its object layer, and by the level and camera for the player.
pub type SharedObject = Arc<RwLock<Box<dyn GameObject>>>;

/// Creator closure registered for a type name
pub type Creator = Box<dyn Fn() -> Box<dyn GameObject>>;

/// Builds game objects from the `type` attribute of `<object>` elements
#[derive(Default)]
pub struct GameObjectFactory {
    creators: HashMap<String, Creator>,
}

impl GameObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a creator for `type_name`
    ///
    /// Returns `false` and keeps the existing creator if the name is taken.
    pub fn register_type<F>(&mut self, type_name: impl Into<String>, creator: F) -> bool
    where
        F: Fn() -> Box<dyn GameObject> + 'static,
    {
        let type_name = type_name.into();
        if self.creators.contains_key(&type_name) {
            return false;
        }
        self.creators.insert(type_name, Box::new(creator));
        true
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.creators.contains_key(type_name)
    }

    pub fn create(&self, type_name: &str) -> Result<Box<dyn GameObject>> {
        self.creators
            .get(type_name)
            .map(|creator| creator())
            .ok_or_else(|| LevelError::UnknownType(type_name.to_string()))
    }
}

impl fmt::Debug for GameObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.creators.keys().collect();
        types.sort();
        f.debug_struct("GameObjectFactory").field("types", &types).finish()
    }
}

/// An ordered collection of placed objects
#[derive(Debug, Default)]
pub struct ObjectLayer {
    pub name: String,
    objects: Vec<SharedObject>,
}

impl ObjectLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
        }
    }

    pub fn push(&mut self, object: SharedObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SharedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
