//! Fakes for the loader's collaborators

use crate::codec::{encode_tile_ids, Compression};
use crate::level::CollisionLayers;
use crate::objects::{CollisionObject, GameObject, GameObjectFactory, LoaderParams, Player, SharedObject};
use crate::services::{Camera, TextureRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use tilelevel_core::Vector2D;

/// Plain object without capabilities
#[derive(Debug, Default)]
pub struct Prop {
    pub type_name: String,
    pub params: Option<LoaderParams>,
}

impl Prop {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }
}

impl GameObject for Prop {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn load(&mut self, params: &LoaderParams) {
        self.params = Some(params.clone());
    }

    fn position(&self) -> Vector2D {
        self.params.as_ref().map(|p| p.position).unwrap_or_default()
    }
}

/// Colliding object; a player when `player` is set
#[derive(Debug, Default)]
pub struct Walker {
    pub type_name: String,
    pub player: bool,
    pub params: Option<LoaderParams>,
    pub layers: Option<CollisionLayers>,
    pub margin: i32,
}

impl Walker {
    pub fn new(type_name: &str, player: bool) -> Self {
        Self {
            type_name: type_name.to_string(),
            player,
            ..Default::default()
        }
    }
}

impl GameObject for Walker {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn load(&mut self, params: &LoaderParams) {
        self.params = Some(params.clone());
    }

    fn position(&self) -> Vector2D {
        self.params.as_ref().map(|p| p.position).unwrap_or_default()
    }

    fn as_collision_object(&mut self) -> Option<&mut dyn CollisionObject> {
        Some(self)
    }
}

impl CollisionObject for Walker {
    fn set_collision_layers(&mut self, layers: CollisionLayers) {
        self.layers = Some(layers);
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

impl Player for Walker {}

/// What a [`Recorder`] was told during loading
#[derive(Debug, Default)]
pub struct CallLog {
    pub layers: Vec<CollisionLayers>,
    pub margins: Vec<i32>,
    pub loads: Vec<LoaderParams>,
}

/// Colliding object that reports its calls to a shared log
#[derive(Debug)]
pub struct Recorder {
    log: Arc<Mutex<CallLog>>,
    player: bool,
}

impl GameObject for Recorder {
    fn type_name(&self) -> &str {
        "Recorder"
    }

    fn load(&mut self, params: &LoaderParams) {
        self.log.lock().loads.push(params.clone());
    }

    fn position(&self) -> Vector2D {
        self.log
            .lock()
            .loads
            .last()
            .map(|p| p.position)
            .unwrap_or_default()
    }

    fn as_collision_object(&mut self) -> Option<&mut dyn CollisionObject> {
        Some(self)
    }
}

impl CollisionObject for Recorder {
    fn set_collision_layers(&mut self, layers: CollisionLayers) {
        self.log.lock().layers.push(layers);
    }

    fn set_collision_margin(&mut self, margin: i32) {
        self.log.lock().margins.push(margin);
    }

    fn as_player(&self) -> Option<&dyn Player> {
        if self.player {
            Some(self)
        } else {
            None
        }
    }
}

impl Player for Recorder {}

/// Factory whose `Recorder` type logs into the returned log
pub fn recorder_factory(player: bool) -> (GameObjectFactory, Arc<Mutex<CallLog>>) {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let mut factory = GameObjectFactory::new();
    let sink = log.clone();
    factory.register_type("Recorder", move || {
        Box::new(Recorder {
            log: sink.clone(),
            player,
        })
    });
    (factory, log)
}

/// Factory with `Prop`, `Enemy` and `Player` registered
pub fn factory() -> GameObjectFactory {
    let mut factory = GameObjectFactory::new();
    factory.register_type("Prop", || Box::new(Prop::new("Prop")));
    factory.register_type("Enemy", || Box::new(Walker::new("Enemy", false)));
    factory.register_type("Player", || Box::new(Walker::new("Player", true)));
    factory
}

/// Records every load request; fails for paths listed in `missing`
#[derive(Debug, Default)]
pub struct RecordingTextures {
    pub loaded: Vec<(String, String)>,
    pub missing: Vec<String>,
}

impl TextureRegistry for RecordingTextures {
    fn load(&mut self, path: &str, id: &str) -> bool {
        if self.missing.iter().any(|m| m == path) {
            return false;
        }
        self.loaded.push((path.to_string(), id.to_string()));
        true
    }
}

#[derive(Debug, Default)]
pub struct RecordingCamera {
    pub target: Option<SharedObject>,
    pub position: Option<Vector2D>,
}

impl Camera for RecordingCamera {
    fn set_target(&mut self, target: SharedObject) {
        self.target = Some(target);
    }

    fn set_position(&mut self, position: Vector2D) {
        self.position = Some(position);
    }
}

/// `<data>` element for a zlib-compressed base64 layer
pub fn data_xml(ids: &[u32]) -> String {
    let payload = encode_tile_ids(ids, Compression::Zlib).unwrap();
    format!(
        r#"<data encoding="base64" compression="zlib">
   {}
  </data>"#,
        payload
    )
}

/// `<map>` document around the given sections
pub fn map_xml(width: usize, height: usize, sections: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.0" orientation="orthogonal" width="{}" height="{}" tilewidth="32" tileheight="32">
{}
</map>"#,
        width, height, sections
    )
}

/// 4-column, 32px tileset starting at gid 1
pub const GROUND_TILESET: &str = r#"<tileset firstgid="1" name="ground" tilewidth="32" tileheight="32" spacing="0" margin="0">
  <image source="ground.png" width="128" height="128"/>
</tileset>"#;
