//! Tilesets and global tile id resolution
//!
//! Each tileset covers the global ids starting at its `first_gid`. A nonzero
//! id belongs to the tileset with the greatest `first_gid <= id`; id 0 is the
//! empty tile and belongs to none.

use crate::{LevelError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tilelevel_core::Rect;

/// Horizontal flip flag carried in the top bit of a global tile id
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;

/// Vertical flip flag
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;

/// Anti-diagonal flip flag
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;

const FLIP_FLAGS: u32 = FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY;

/// Empty tile id
pub const EMPTY_TILE: u32 = 0;

/// A global tile id as stored in layer data, flip flags included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileGid(pub u32);

impl TileGid {
    /// The id with flip flags stripped
    #[inline]
    pub fn id(self) -> u32 {
        self.0 & !FLIP_FLAGS
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.id() == EMPTY_TILE
    }

    pub fn flipped_horizontally(self) -> bool {
        self.0 & FLIPPED_HORIZONTALLY != 0
    }

    pub fn flipped_vertically(self) -> bool {
        self.0 & FLIPPED_VERTICALLY != 0
    }

    pub fn flipped_diagonally(self) -> bool {
        self.0 & FLIPPED_DIAGONALLY != 0
    }
}

/// Pixel geometry of a tileset image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileGeometry {
    pub tile_width: u32,
    pub tile_height: u32,
    pub margin: u32,
    pub spacing: u32,
    pub image_width: u32,
    pub image_height: u32,
}

/// A source image plus the geometry that maps ids onto it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    name: String,
    first_gid: u32,
    image_source: String,
    geometry: TileGeometry,
    columns: u32,
}

impl Tileset {
    /// Build a tileset, deriving its column count
    ///
    /// `columns = image_width / (tile_width + spacing)`; a zero stride or a
    /// zero column count leaves no way to address tiles and is rejected.
    pub fn new(
        name: impl Into<String>,
        first_gid: u32,
        image_source: impl Into<String>,
        geometry: TileGeometry,
    ) -> Result<Self> {
        let name = name.into();

        let stride = |tile: u32, axis: &str| {
            tile.checked_add(geometry.spacing)
                .ok_or_else(|| LevelError::InvalidTileset {
                    name: name.clone(),
                    reason: format!("tile {} plus spacing overflows", axis),
                })
        };
        let column_stride = stride(geometry.tile_width, "width")?;
        stride(geometry.tile_height, "height")?;

        if column_stride == 0 {
            return Err(LevelError::InvalidTileset {
                name,
                reason: "tile width plus spacing is zero".into(),
            });
        }
        if geometry.tile_height == 0 {
            return Err(LevelError::InvalidTileset {
                name,
                reason: "tile height is zero".into(),
            });
        }

        let columns = geometry.image_width / column_stride;
        if columns == 0 {
            return Err(LevelError::InvalidTileset {
                name,
                reason: format!(
                    "image width {} holds no {}px column",
                    geometry.image_width, column_stride
                ),
            });
        }

        Ok(Self {
            name,
            first_gid,
            image_source: image_source.into(),
            geometry,
            columns,
        })
    }

    /// Name; also the texture id its image is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_gid(&self) -> u32 {
        self.first_gid
    }

    pub fn image_source(&self) -> &str {
        &self.image_source
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }

    pub fn tile_width(&self) -> u32 {
        self.geometry.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.geometry.tile_height
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        // the stride was checked for overflow on construction
        self.geometry.image_height / (self.geometry.tile_height + self.geometry.spacing)
    }

    pub fn tile_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows())
    }

    /// Source rectangle of a tile by its index within this tileset
    ///
    /// Offsets are computed in 64 bits; ids far past the image saturate at
    /// `i32::MAX` rather than wrapping.
    pub fn pixel_rect(&self, local_id: u32) -> Rect {
        let g = &self.geometry;
        let column = u64::from(local_id % self.columns);
        let row = u64::from(local_id / self.columns);
        let offset = |index: u64, tile: u32| {
            u64::from(g.margin) + index * (u64::from(tile) + u64::from(g.spacing))
        };

        Rect::from_pixels(
            offset(column, g.tile_width),
            offset(row, g.tile_height),
            g.tile_width,
            g.tile_height,
        )
    }
}

/// A tile id resolved to its owning tileset
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTile<'a> {
    pub tileset: &'a Tileset,
    pub local_id: u32,
}

impl ResolvedTile<'_> {
    pub fn pixel_rect(&self) -> Rect {
        self.tileset.pixel_rect(self.local_id)
    }
}

/// Registry shared between a level and its tile layers
pub type SharedTilesets = Arc<RwLock<TilesetRegistry>>;

/// Ordered list of the map's tilesets
#[derive(Debug, Clone, Default)]
pub struct TilesetRegistry {
    tilesets: Vec<Tileset>,
}

impl TilesetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tileset, keeping document order
    pub fn register(&mut self, tileset: Tileset) {
        self.tilesets.push(tileset);
    }

    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tileset> {
        self.tilesets.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|t| t.name == name)
    }

    /// Find the tileset owning `gid`
    ///
    /// Returns `Ok(None)` for the empty tile and `UnresolvedTile` when no
    /// tileset starts at or below the id.
    pub fn resolve(&self, gid: u32) -> Result<Option<ResolvedTile<'_>>> {
        let id = TileGid(gid).id();
        if id == EMPTY_TILE {
            return Ok(None);
        }

        self.tilesets
            .iter()
            .filter(|t| t.first_gid <= id)
            .max_by_key(|t| t.first_gid)
            .map(|tileset| {
                Some(ResolvedTile {
                    tileset,
                    local_id: id - tileset.first_gid,
                })
            })
            .ok_or(LevelError::UnresolvedTile(id))
    }

    /// Source rectangle of a global tile id
    pub fn pixel_rect(&self, gid: u32) -> Result<Option<Rect>> {
        Ok(self.resolve(gid)?.map(|tile| tile.pixel_rect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(tile: u32, margin: u32, spacing: u32, width: u32, height: u32) -> TileGeometry {
        TileGeometry {
            tile_width: tile,
            tile_height: tile,
            margin,
            spacing,
            image_width: width,
            image_height: height,
        }
    }

    fn registry() -> TilesetRegistry {
        let mut registry = TilesetRegistry::new();
        registry.register(Tileset::new("ground", 1, "ground.png", geometry(32, 0, 0, 128, 64)).unwrap());
        registry.register(Tileset::new("props", 9, "props.png", geometry(16, 2, 1, 70, 70)).unwrap());
        registry
    }

    #[test]
    fn test_columns_derived() {
        let registry = registry();
        let ground = registry.get("ground").unwrap();
        assert_eq!(ground.columns(), 4);
        assert_eq!(ground.rows(), 2);
        assert_eq!(ground.tile_count(), 8);

        // 70 / (16 + 1)
        assert_eq!(registry.get("props").unwrap().columns(), 4);
    }

    #[test]
    fn test_resolve_empty_and_first_ids() {
        let registry = registry();
        assert!(registry.resolve(0).unwrap().is_none());

        for tileset in registry.iter() {
            let resolved = registry.resolve(tileset.first_gid()).unwrap().unwrap();
            assert_eq!(resolved.tileset.name(), tileset.name());
            assert_eq!(resolved.local_id, 0);
        }
    }

    #[test]
    fn test_resolve_picks_greatest_first_gid() {
        let registry = registry();

        let tile = registry.resolve(8).unwrap().unwrap();
        assert_eq!(tile.tileset.name(), "ground");
        assert_eq!(tile.local_id, 7);

        let tile = registry.resolve(12).unwrap().unwrap();
        assert_eq!(tile.tileset.name(), "props");
        assert_eq!(tile.local_id, 3);
    }

    #[test]
    fn test_resolve_out_of_order_registration() {
        let mut registry = TilesetRegistry::new();
        registry.register(Tileset::new("late", 50, "late.png", geometry(8, 0, 0, 64, 64)).unwrap());
        registry.register(Tileset::new("early", 1, "early.png", geometry(8, 0, 0, 64, 64)).unwrap());

        assert_eq!(registry.resolve(49).unwrap().unwrap().tileset.name(), "early");
        assert_eq!(registry.resolve(50).unwrap().unwrap().tileset.name(), "late");
    }

    #[test]
    fn test_unresolved_tile() {
        let mut registry = TilesetRegistry::new();
        registry.register(Tileset::new("props", 10, "p.png", geometry(16, 0, 0, 64, 64)).unwrap());

        assert!(matches!(registry.resolve(3), Err(LevelError::UnresolvedTile(3))));
        assert!(matches!(TilesetRegistry::new().resolve(1), Err(LevelError::UnresolvedTile(1))));
    }

    #[test]
    fn test_pixel_rect() {
        let registry = registry();

        // id 5 -> local 4 -> row 1, col 0
        assert_eq!(registry.pixel_rect(5).unwrap(), Some(Rect::new(0, 32, 32, 32)));
        assert_eq!(registry.pixel_rect(4).unwrap(), Some(Rect::new(96, 0, 32, 32)));
        assert_eq!(registry.pixel_rect(0).unwrap(), None);

        // margin 2, spacing 1: local 5 -> row 1, col 1
        assert_eq!(registry.pixel_rect(14).unwrap(), Some(Rect::new(19, 19, 16, 16)));
    }

    #[test]
    fn test_flip_flags_stripped() {
        let registry = registry();
        let gid = 5 | FLIPPED_HORIZONTALLY | FLIPPED_DIAGONALLY;

        let flagged = TileGid(gid);
        assert_eq!(flagged.id(), 5);
        assert!(flagged.flipped_horizontally());
        assert!(!flagged.flipped_vertically());
        assert!(flagged.flipped_diagonally());

        assert_eq!(registry.resolve(gid).unwrap().unwrap().local_id, 4);
        assert!(TileGid(FLIPPED_VERTICALLY).is_empty());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let result = Tileset::new("bad", 1, "bad.png", geometry(0, 0, 0, 64, 64));
        assert!(matches!(result, Err(LevelError::InvalidTileset { .. })));

        let result = Tileset::new("narrow", 1, "n.png", geometry(32, 0, 0, 16, 64));
        assert!(matches!(result, Err(LevelError::InvalidTileset { name, .. }) if name == "narrow"));
    }

    #[test]
    fn test_stride_overflow_rejected() {
        let wide = TileGeometry {
            tile_width: u32::MAX,
            tile_height: 32,
            spacing: 1,
            image_width: 64,
            image_height: 64,
            ..Default::default()
        };
        match Tileset::new("wide", 1, "w.png", wide) {
            Err(LevelError::InvalidTileset { name, reason }) => {
                assert_eq!(name, "wide");
                assert!(reason.contains("width"));
            }
            other => panic!("expected InvalidTileset, got {:?}", other),
        }

        let tall = TileGeometry {
            tile_width: 32,
            tile_height: u32::MAX,
            ..wide
        };
        assert!(matches!(
            Tileset::new("tall", 1, "t.png", tall),
            Err(LevelError::InvalidTileset { reason, .. }) if reason.contains("height")
        ));
    }

    #[test]
    fn test_oversized_sheet_saturates() {
        let sheet = Tileset::new("sheet", 1, "s.png", geometry(1, 0, 0, u32::MAX, u32::MAX)).unwrap();
        assert_eq!(sheet.columns(), u32::MAX);
        assert_eq!(sheet.tile_count(), u32::MAX);

        let rect = sheet.pixel_rect(u32::MAX - 1);
        assert_eq!(rect.x, i32::MAX);
        assert_eq!(rect.y, 0);
        assert_eq!(sheet.pixel_rect(u32::MAX).y, 1);
    }
}
