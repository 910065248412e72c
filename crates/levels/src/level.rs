//! Level structure
//!
//! A loaded map: layers in render/update order, the tileset registry, the
//! collidable tile layers and the player the camera follows.

use crate::objects::{ObjectLayer, SharedObject};
use crate::tiles::TileLayer;
use crate::tileset::{SharedTilesets, TilesetRegistry};
use crate::codec::BYTES_PER_TILE;
use crate::{LevelError, Result};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use std::sync::Arc;
use tilelevel_core::Vector2D;

/// A single layer of a level
#[derive(Debug)]
pub enum Layer {
    /// Decoded tile grid; shared with the collision list when collidable
    Tile(Arc<TileLayer>),
    /// Placed game objects
    Object(ObjectLayer),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Tile(layer) => layer.name(),
            Layer::Object(layer) => &layer.name,
        }
    }

    pub fn as_tile(&self) -> Option<&Arc<TileLayer>> {
        match self {
            Layer::Tile(layer) => Some(layer),
            Layer::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectLayer> {
        match self {
            Layer::Object(layer) => Some(layer),
            Layer::Tile(_) => None,
        }
    }
}

/// The level's collidable tile layers
///
/// Cloned into every collision object. Objects can only read it; the loader
/// is the only writer.
#[derive(Debug, Clone, Default)]
pub struct CollisionLayers {
    layers: Arc<RwLock<Vec<Arc<TileLayer>>>>,
}

impl CollisionLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, layer: Arc<TileLayer>) {
        self.layers.write().push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.read().is_empty()
    }

    /// Snapshot of the current layers
    pub fn layers(&self) -> Vec<Arc<TileLayer>> {
        self.layers.read().clone()
    }

    /// Whether any collidable layer has a tile under the pixel
    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        self.layers.read().iter().any(|layer| layer.is_solid_at(x, y))
    }

    /// Whether two handles point at the same list
    pub fn same_list(&self, other: &CollisionLayers) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers)
    }
}

/// Map dimensions from the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapInfo {
    /// Width in tiles
    pub width: usize,
    /// Height in tiles
    pub height: usize,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl MapInfo {
    /// Tiles per layer
    ///
    /// Fails when the count, or its binary payload size, overflows `usize`.
    pub fn tile_count(&self) -> Result<usize> {
        self.width
            .checked_mul(self.height)
            .filter(|count| count.checked_mul(BYTES_PER_TILE).is_some())
            .ok_or(LevelError::Oversized {
                width: self.width,
                height: self.height,
            })
    }

    /// Map size in pixels, saturating at `u64::MAX`
    pub fn pixel_size(&self) -> (u64, u64) {
        let span = |tiles: usize, size: u32| {
            u64::try_from(tiles)
                .unwrap_or(u64::MAX)
                .saturating_mul(u64::from(size))
        };
        (
            span(self.width, self.tile_width),
            span(self.height, self.tile_height),
        )
    }
}

/// A loaded level
#[derive(Debug)]
pub struct Level {
    pub info: MapInfo,

    /// Layers in document order (render/update order)
    layers: Vec<Layer>,

    tilesets: SharedTilesets,

    collision_layers: CollisionLayers,

    /// Camera-follow target
    player: Option<SharedObject>,
}

impl Level {
    /// Create an empty level
    pub fn new(info: MapInfo) -> Self {
        Self {
            info,
            layers: Vec::new(),
            tilesets: Arc::new(RwLock::new(TilesetRegistry::new())),
            collision_layers: CollisionLayers::new(),
            player: None,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn tilesets(&self) -> RwLockReadGuard<'_, TilesetRegistry> {
        self.tilesets.read()
    }

    pub(crate) fn shared_tilesets(&self) -> &SharedTilesets {
        &self.tilesets
    }

    pub fn collision_layers(&self) -> &CollisionLayers {
        &self.collision_layers
    }

    pub fn player(&self) -> Option<&SharedObject> {
        self.player.as_ref()
    }

    pub(crate) fn set_player(&mut self, player: SharedObject) {
        self.player = Some(player);
    }

    pub fn tile_layers(&self) -> impl Iterator<Item = &Arc<TileLayer>> {
        self.layers.iter().filter_map(Layer::as_tile)
    }

    pub fn object_layers(&self) -> impl Iterator<Item = &ObjectLayer> {
        self.layers.iter().filter_map(Layer::as_object)
    }

    /// Check every tile layer against the final tileset registry
    pub fn validate_tiles(&self) -> Result<()> {
        self.tile_layers().try_for_each(|layer| layer.validate())
    }

    /// Serializable overview of the level
    pub fn summary(&self) -> LevelSummary {
        let tilesets = self
            .tilesets()
            .iter()
            .map(|t| TilesetSummary {
                name: t.name().to_string(),
                first_gid: t.first_gid(),
                columns: t.columns(),
                tile_count: t.tile_count(),
            })
            .collect();

        let layers = self
            .layers
            .iter()
            .map(|layer| match layer {
                Layer::Tile(tiles) => LayerSummary {
                    name: tiles.name().to_string(),
                    kind: LayerKind::Tile,
                    collidable: tiles.is_collidable(),
                    entries: tiles.grid().occupied(),
                },
                Layer::Object(objects) => LayerSummary {
                    name: objects.name.clone(),
                    kind: LayerKind::Object,
                    collidable: false,
                    entries: objects.len(),
                },
            })
            .collect();

        LevelSummary {
            width: self.info.width,
            height: self.info.height,
            tile_width: self.info.tile_width,
            tile_height: self.info.tile_height,
            pixel_size: self.info.pixel_size(),
            tilesets,
            layers,
            collision_layers: self.collision_layers.len(),
            player: self.player.as_ref().map(|p| p.read().position()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Tile,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilesetSummary {
    pub name: String,
    pub first_gid: u32,
    pub columns: u32,
    pub tile_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub kind: LayerKind,
    pub collidable: bool,
    /// Non-empty tiles or placed objects
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub width: usize,
    pub height: usize,
    pub tile_width: u32,
    pub tile_height: u32,
    pub pixel_size: (u64, u64),
    pub tilesets: Vec<TilesetSummary>,
    pub layers: Vec<LayerSummary>,
    pub collision_layers: usize,
    pub player: Option<Vector2D>,
}
