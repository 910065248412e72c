//! Tile layers
//!
//! A tile layer is a `height x width` grid of global tile ids bound to the
//! level's tileset registry. Id 0 is an empty cell.

use crate::grid::TileGrid;
use crate::tileset::{SharedTilesets, TileGid};
use crate::Result;
use tilelevel_core::Rect;

/// One tile blit: which texture, which part of it, and where on the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDraw {
    /// Texture id (the owning tileset's name)
    pub texture_id: String,
    pub gid: TileGid,
    pub source: Rect,
    pub destination: Rect,
}

/// A decoded tile layer
#[derive(Debug)]
pub struct TileLayer {
    name: String,
    tile_width: u32,
    tile_height: u32,
    grid: TileGrid,
    tilesets: SharedTilesets,
    collidable: bool,
}

impl TileLayer {
    /// Create a tile layer
    ///
    /// # Arguments
    /// * `tile_width`, `tile_height` - Map tile size in pixels
    /// * `grid` - Decoded ids, one row per map row
    /// * `tilesets` - The level's registry, shared rather than copied
    pub fn new(
        name: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        grid: TileGrid,
        tilesets: SharedTilesets,
    ) -> Self {
        Self {
            name: name.into(),
            tile_width,
            tile_height,
            grid,
            tilesets,
            collidable: false,
        }
    }

    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_collidable(&self) -> bool {
        self.collidable
    }

    /// Map tile size in pixels
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn tilesets(&self) -> &SharedTilesets {
        &self.tilesets
    }

    /// Tile at grid position; `None` outside the layer
    #[inline]
    pub fn tile_at(&self, row: usize, col: usize) -> Option<TileGid> {
        self.grid.get(row, col).map(TileGid)
    }

    /// Tile under a pixel position; `None` outside the layer
    pub fn tile_at_pixel(&self, x: f32, y: f32) -> Option<TileGid> {
        if x < 0.0 || y < 0.0 || self.tile_width == 0 || self.tile_height == 0 {
            return None;
        }
        let col = (x / self.tile_width as f32) as usize;
        let row = (y / self.tile_height as f32) as usize;
        self.tile_at(row, col)
    }

    /// Whether a non-empty tile covers the pixel
    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        self.tile_at_pixel(x, y).is_some_and(|gid| !gid.is_empty())
    }

    /// Check that every non-empty cell belongs to a tileset
    pub fn validate(&self) -> Result<()> {
        let tilesets = self.tilesets.read();
        for (_, _, gid) in self.grid.cells() {
            tilesets.resolve(gid)?;
        }
        Ok(())
    }

    /// Blits needed to draw this layer, in row-major order
    ///
    /// Destinations beyond `i32::MAX` pixels saturate.
    pub fn draw_list(&self) -> Result<Vec<TileDraw>> {
        let tilesets = self.tilesets.read();
        let span = |cells: usize, size: u32| {
            u64::try_from(cells)
                .unwrap_or(u64::MAX)
                .saturating_mul(u64::from(size))
        };
        let mut draws = Vec::with_capacity(self.grid.occupied());

        for (row, col, gid) in self.grid.cells() {
            let Some(tile) = tilesets.resolve(gid)? else {
                continue;
            };
            let source = tile.pixel_rect();
            draws.push(TileDraw {
                texture_id: tile.tileset.name().to_string(),
                gid: TileGid(gid),
                source,
                destination: Rect::from_pixels(
                    span(col, self.tile_width),
                    span(row, self.tile_height),
                    source.width,
                    source.height,
                ),
            });
        }

        Ok(draws)
    }
}
