//! # Tilelevel Levels
//!
//! Loads tile-map level files into in-memory levels.
//!
//! ## Features
//! - XML map documents parsed into an owned element tree
//! - base64 tile payloads (zlib, gzip or uncompressed) and CSV payloads
//! - Multiple tilesets per map, inline or external (`.tsx`)
//! - Tile and object layers kept in document order
//! - Game objects built through a registered factory, with collision
//!   layers wired into every collision-capable object
//! - Player detection and camera targeting
//!
//! ## Level Format
//!
//! A `<map>` root with `width`/`height` in tiles and `tilewidth`/`tileheight`
//! in pixels, followed by sections:
//! - **tileset**: tile sheet image and geometry
//! - **properties**: textures to preload (`name` = id, `value` = path)
//! - **layer / objectgroup**: a `data` child makes it a tile layer, `object`
//!   children make it an object layer

pub mod codec;
pub mod document;
pub mod error;
pub mod grid;
pub mod level;
pub mod objects;
pub mod parser;
pub mod resolver;
pub mod services;
pub mod tiles;
pub mod tileset;

#[cfg(test)]
mod testutil;

pub use codec::{CodecError, Compression, DataFormat, Encoding};
pub use document::{Document, Element};
pub use error::{LevelError, Result};
pub use grid::TileGrid;
pub use level::{CollisionLayers, Layer, Level, LevelSummary, MapInfo};
pub use objects::{
    CollisionObject, GameObject, GameObjectFactory, LoaderParams, ObjectLayer, Player,
    SharedObject,
};
pub use parser::{LevelParser, ParserOptions};
pub use services::{Camera, TextureRegistry};
pub use tiles::{TileDraw, TileLayer};
pub use tileset::{TileGeometry, TileGid, Tileset, TilesetRegistry};
