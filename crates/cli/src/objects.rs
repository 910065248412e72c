//! Minimal collaborators for loading levels outside a game
//!
//! Objects only remember what the loader told them; textures are checked for
//! existence on disk; the camera records its target.

use std::collections::HashMap;
use std::path::PathBuf;
use tilelevel_core::Vector2D;
use tilelevel_levels::{
    Camera, CollisionLayers, CollisionObject, GameObject, GameObjectFactory, LoaderParams, Player,
    SharedObject, TextureRegistry,
};
use tilelevel_config::LoaderConfig;
use tracing::warn;

/// Decorative object without collision
#[derive(Debug)]
pub struct Sprite {
    type_name: String,
    params: LoaderParams,
}

impl Sprite {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            params: LoaderParams::default(),
        }
    }
}

impl GameObject for Sprite {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn load(&mut self, params: &LoaderParams) {
        self.params = params.clone();
    }

    fn position(&self) -> Vector2D {
        self.params.position
    }
}

/// Object that collides with the level's collidable tile layers
#[derive(Debug)]
pub struct Collider {
    type_name: String,
    player: bool,
    params: LoaderParams,
    layers: CollisionLayers,
    margin: i32,
}

impl Collider {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            player: false,
            params: LoaderParams::default(),
            layers: CollisionLayers::new(),
            margin: 0,
        }
    }

    /// A collider the camera follows
    pub fn player(type_name: impl Into<String>) -> Self {
        Self {
            player: true,
            ..Self::new(type_name)
        }
    }

    /// Whether the object's box, shrunk by the collision margin, touches a
    /// solid tile
    ///
    /// Only layers loaded before the object are visible at spawn time.
    pub fn is_blocked(&self) -> bool {
        let margin = self.margin as f32;
        let Vector2D { x, y } = self.params.position;
        let right = x + self.params.width as f32 - margin - 1.0;
        let bottom = y + self.params.height as f32 - margin - 1.0;
        let (left, top) = (x + margin, y + margin);

        [(left, top), (right, top), (left, bottom), (right, bottom)]
            .iter()
            .any(|&(px, py)| self.layers.is_solid_at(px, py))
    }
}

impl GameObject for Collider {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn load(&mut self, params: &LoaderParams) {
        self.params = params.clone();
        if self.is_blocked() {
            warn!(
                type_name = %self.type_name,
                x = params.position.x,
                y = params.position.y,
                "Object spawns inside a solid tile"
            );
        }
    }

    fn position(&self) -> Vector2D {
        self.params.position
    }

    fn as_collision_object(&mut self) -> Option<&mut dyn CollisionObject> {
        Some(self)
    }
}

impl CollisionObject for Collider {
    fn set_collision_layers(&mut self, layers: CollisionLayers) {
        self.layers = layers;
    }

    fn set_collision_margin(&mut self, margin: i32) {
        self.margin = margin;
    }

    fn as_player(&self) -> Option<&dyn Player> {
        if self.player {
            Some(self)
        } else {
            None
        }
    }
}

impl Player for Collider {}

/// Register the object types named in the configuration
pub fn build_factory(config: &LoaderConfig) -> GameObjectFactory {
    let mut factory = GameObjectFactory::new();

    let player = config.player_type.clone();
    factory.register_type(config.player_type.as_str(), move || {
        Box::new(Collider::player(player.as_str()))
    });

    for name in &config.collider_types {
        let type_name = name.clone();
        factory.register_type(name.as_str(), move || Box::new(Collider::new(type_name.as_str())));
    }
    for name in &config.prop_types {
        let type_name = name.clone();
        factory.register_type(name.as_str(), move || Box::new(Sprite::new(type_name.as_str())));
    }

    factory
}

/// Texture registry that accepts any image present on disk
#[derive(Debug, Default)]
pub struct FileTextures {
    textures: HashMap<String, PathBuf>,
}

impl FileTextures {
    pub fn len(&self) -> usize {
        self.textures.len()
    }
}

impl TextureRegistry for FileTextures {
    fn load(&mut self, path: &str, id: &str) -> bool {
        let path = PathBuf::from(path);
        if !path.is_file() {
            return false;
        }
        self.textures.insert(id.to_string(), path);
        true
    }
}

/// Camera that just remembers where it was pointed
#[derive(Debug, Default)]
pub struct FollowCamera {
    target: Option<SharedObject>,
    position: Vector2D,
}

impl FollowCamera {
    pub fn target(&self) -> Option<&SharedObject> {
        self.target.as_ref()
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }
}

impl Camera for FollowCamera {
    fn set_target(&mut self, target: SharedObject) {
        self.target = Some(target);
    }

    fn set_position(&mut self, position: Vector2D) {
        self.position = position;
    }
}
