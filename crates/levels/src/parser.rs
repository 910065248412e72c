//! Level file parser
//!
//! Walks a map document section by section, in document order:
//! - `tileset` → registered, and its image preloaded
//! - `properties` → each `property` names a texture to preload
//! - `layer` / `objectgroup` → a tile layer if it has a `data` child,
//!   otherwise an object layer if it has an `object` child
//!
//! Any failure aborts the whole load. The camera is only told about the
//! player once every section has been parsed.

use crate::codec::{decode_tile_ids, DataFormat};
use crate::document::{Document, Element};
use crate::grid::TileGrid;
use crate::level::{Layer, Level, MapInfo};
use crate::objects::{GameObjectFactory, SharedObject};
use crate::resolver::ObjectResolver;
use crate::services::{Camera, TextureRegistry};
use crate::tiles::TileLayer;
use crate::tileset::{TileGeometry, Tileset};
use crate::{LevelError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tilelevel_core::Vector2D;
use tracing::{debug, info, warn};

/// Loader settings
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Directory texture paths are resolved against
    ///
    /// Defaults to the map file's directory.
    pub asset_root: Option<PathBuf>,

    /// Fail the load when the texture registry rejects an image
    pub strict_textures: bool,
}

/// How a `layer` / `objectgroup` section is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Tiles,
    Objects,
}

/// Builds a [`Level`] from a map document
///
/// # Example
/// ```rust,no_run
/// use tilelevel_levels::{Camera, GameObjectFactory, LevelParser, SharedObject, TextureRegistry};
/// use tilelevel_core::Vector2D;
///
/// struct Textures;
/// impl TextureRegistry for Textures {
///     fn load(&mut self, _path: &str, _id: &str) -> bool { true }
/// }
///
/// struct FixedCamera;
/// impl Camera for FixedCamera {
///     fn set_target(&mut self, _target: SharedObject) {}
///     fn set_position(&mut self, _position: Vector2D) {}
/// }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = GameObjectFactory::new();
/// let (mut textures, mut camera) = (Textures, FixedCamera);
/// let level = LevelParser::new(&mut textures, &factory, &mut camera)
///     .parse_file("assets/map1.tmx")?;
/// println!("{} layers", level.layers().len());
/// # Ok(())
/// # }
/// ```
pub struct LevelParser<'a> {
    textures: &'a mut dyn TextureRegistry,
    factory: &'a GameObjectFactory,
    camera: &'a mut dyn Camera,
    options: ParserOptions,
}

impl<'a> LevelParser<'a> {
    pub fn new(
        textures: &'a mut dyn TextureRegistry,
        factory: &'a GameObjectFactory,
        camera: &'a mut dyn Camera,
    ) -> Self {
        Self {
            textures,
            factory,
            camera,
            options: ParserOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a level from a map file
    ///
    /// External tilesets and (without an explicit asset root) image paths
    /// are resolved relative to the map's directory.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Level> {
        let path = path.as_ref();
        let document = Document::load_file(path)?;
        let base_dir = path.parent().map(Path::to_path_buf);

        info!("Loading level {}", path.display());
        self.parse_document(document.root(), base_dir.as_deref())
    }

    /// Parse level data from a string
    pub fn parse_str(&mut self, content: &str) -> Result<Level> {
        let document = Document::parse(content)?;
        self.parse_document(document.root(), None)
    }

    /// Build a level from an already parsed `<map>` element
    pub fn parse_document(&mut self, root: &Element, base_dir: Option<&Path>) -> Result<Level> {
        if root.name != "map" {
            return Err(LevelError::Document(format!(
                "expected <map> root element, found <{}>",
                root.name
            )));
        }

        let info = MapInfo {
            width: root.required_parse("width")?,
            height: root.required_parse("height")?,
            tile_width: root.required_parse("tilewidth")?,
            tile_height: root.required_parse("tileheight")?,
        };
        info.tile_count()?;
        let mut level = Level::new(info);
        let mut player: Option<(SharedObject, Vector2D)> = None;

        for (index, section) in root.children().enumerate() {
            match section.name.as_str() {
                "tileset" => {
                    let tileset = self.parse_tileset(section, base_dir)?;
                    level.shared_tilesets().write().register(tileset);
                }
                "properties" => self.parse_textures(section, base_dir)?,
                "layer" | "objectgroup" => match Self::classify(section, index)? {
                    SectionKind::Tiles => {
                        let layer = Arc::new(Self::parse_tile_layer(section, index, &level)?);
                        if layer.is_collidable() {
                            level.collision_layers().push(layer.clone());
                        }
                        level.push_layer(Layer::Tile(layer));
                    }
                    SectionKind::Objects => {
                        let resolver = ObjectResolver::new(self.factory, level.collision_layers());
                        let name = Self::section_name(section, index);
                        let (layer, players) = resolver.resolve_layer(section, name)?;
                        debug!("Object layer '{}': {} objects", layer.name, layer.len());

                        for candidate in players {
                            if player.is_some() {
                                warn!("Multiple player objects; the last one becomes the camera target");
                            }
                            player = Some(candidate);
                        }
                        level.push_layer(Layer::Object(layer));
                    }
                },
                other => debug!("Skipping <{}> section at position {}", other, index),
            }
        }

        level.validate_tiles()?;

        if let Some((object, position)) = player {
            level.set_player(object.clone());
            self.camera.set_target(object);
            self.camera.set_position(position);
        }

        info!(
            "Level loaded: {}x{} tiles, {} tilesets, {} layers ({} collidable)",
            level.info.width,
            level.info.height,
            level.tilesets().len(),
            level.layers().len(),
            level.collision_layers().len()
        );

        Ok(level)
    }

    /// Tile layer if there is a `data` child, else object layer if there is
    /// an `object` child
    fn classify(section: &Element, index: usize) -> Result<SectionKind> {
        if section.has_child("data") {
            Ok(SectionKind::Tiles)
        } else if section.has_child("object") {
            Ok(SectionKind::Objects)
        } else {
            Err(LevelError::UnrecognizedSection {
                element: section.name.clone(),
                index,
            })
        }
    }

    fn section_name(section: &Element, index: usize) -> String {
        section
            .attr("name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", section.name, index))
    }

    /// Parse a `tileset` section and preload its image
    fn parse_tileset(&mut self, element: &Element, base_dir: Option<&Path>) -> Result<Tileset> {
        let first_gid: u32 = element.required_parse("firstgid")?;

        let external;
        let (definition, definition_dir) = match element.attr("source") {
            Some(source) => {
                let path = join(base_dir, source);
                let document = Document::load_file(&path)?;
                external = document.into_root();
                if external.name != "tileset" {
                    return Err(LevelError::Document(format!(
                        "{} is not a tileset (root <{}>)",
                        path.display(),
                        external.name
                    )));
                }
                debug!("Loaded external tileset {}", path.display());
                (&external, path.parent().map(Path::to_path_buf))
            }
            None => (element, base_dir.map(Path::to_path_buf)),
        };

        let image = definition
            .child("image")
            .ok_or_else(|| LevelError::missing(&definition.name, "image"))?;

        let name = definition.required_attr("name")?;
        let source = image.required_attr("source")?;
        let geometry = TileGeometry {
            tile_width: definition.required_parse("tilewidth")?,
            tile_height: definition.required_parse("tileheight")?,
            margin: definition.parse_attr("margin")?.unwrap_or(0),
            spacing: definition.parse_attr("spacing")?.unwrap_or(0),
            image_width: image.required_parse("width")?,
            image_height: image.required_parse("height")?,
        };

        let tileset = Tileset::new(name, first_gid, source, geometry)?;
        self.load_texture(source, name, definition_dir.as_deref())?;

        debug!(
            "Tileset '{}': firstgid {}, {} columns",
            tileset.name(),
            tileset.first_gid(),
            tileset.columns()
        );
        Ok(tileset)
    }

    /// Preload the textures named by a top-level `properties` section
    fn parse_textures(&mut self, section: &Element, base_dir: Option<&Path>) -> Result<()> {
        for property in section.children_named("property") {
            let id = property.required_attr("name")?;
            let path = property.required_attr("value")?;
            self.load_texture(path, id, base_dir)?;
        }
        Ok(())
    }

    fn load_texture(&mut self, source: &str, id: &str, base_dir: Option<&Path>) -> Result<()> {
        let root = self.options.asset_root.as_deref().or(base_dir);
        let path = join(root, source).to_string_lossy().into_owned();

        if self.textures.load(&path, id) {
            debug!("Texture '{}' loaded from {}", id, path);
            return Ok(());
        }

        if self.options.strict_textures {
            return Err(LevelError::Texture {
                id: id.to_string(),
                path,
            });
        }
        warn!("Failed to load texture '{}' from {}", id, path);
        Ok(())
    }

    /// Decode a tile layer section into a grid of map size
    fn parse_tile_layer(section: &Element, index: usize, level: &Level) -> Result<TileLayer> {
        let name = Self::section_name(section, index);
        let MapInfo {
            width,
            height,
            tile_width,
            tile_height,
        } = level.info;

        let collidable = section
            .children_named("properties")
            .flat_map(|bag| bag.children_named("property"))
            .any(|property| property.attr("name") == Some("collidable"));

        let data = section
            .child("data")
            .ok_or_else(|| LevelError::UnrecognizedSection {
                element: section.name.clone(),
                index,
            })?;

        let codec_error = |source| LevelError::Codec {
            layer: name.clone(),
            source,
        };
        let format = DataFormat::from_attributes(data.attr("encoding"), data.attr("compression"))
            .map_err(codec_error)?;
        let ids = decode_tile_ids(data.text(), format, level.info.tile_count()?)
            .map_err(codec_error)?;
        let grid = TileGrid::from_flat(&ids, width, height)?;

        debug!(
            "Tile layer '{}': {} tiles{}",
            name,
            grid.occupied(),
            if collidable { " (collidable)" } else { "" }
        );

        Ok(
            TileLayer::new(name, tile_width, tile_height, grid, level.shared_tilesets().clone())
                .with_collidable(collidable),
        )
    }
}

fn join(base: Option<&Path>, relative: &str) -> PathBuf {
    match base {
        Some(base) => base.join(relative),
        None => PathBuf::from(relative),
    }
}
