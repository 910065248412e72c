//! Object property resolver
//!
//! Turns `<object>` elements into loaded game objects. Each object's property
//! bag is scanned for a fixed set of names; every field starts at zero/empty,
//! unknown names are skipped, and later duplicates overwrite earlier ones.

use crate::document::Element;
use crate::level::CollisionLayers;
use crate::objects::{GameObjectFactory, LoaderParams, ObjectLayer, SharedObject};
use crate::{LevelError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tilelevel_core::{FlipMode, Vector2D};
use tracing::debug;

/// Typed fields read from an object's property bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectProperties {
    pub width: i32,
    pub height: i32,
    pub texture_id: String,
    pub num_frames: i32,
    pub callback_id: i32,
    pub current_row: i32,
    pub flip: FlipMode,
    pub position: (i32, i32),
    pub velocity: (i32, i32),
    pub max_velocity: (i32, i32),
    pub acceleration: (i32, i32),
    pub friction: (i32, i32),
    pub collision_margin: i32,
}

impl ObjectProperties {
    /// Scan the `<properties>` children of an object element
    ///
    /// `width`/`height` start from the object's geometry and are overridden
    /// by `textureWidth`/`textureHeight`.
    pub fn scan(object: &Element, width: i32, height: i32) -> Result<Self> {
        let mut props = Self {
            width,
            height,
            ..Default::default()
        };

        for property in object
            .children_named("properties")
            .flat_map(|bag| bag.children_named("property"))
        {
            let name = property.required_attr("name")?;
            // multi-line string values live in the element text
            let value = property.attr("value").unwrap_or_else(|| property.text());
            props.apply(name, value)?;
        }

        Ok(props)
    }

    fn apply(&mut self, name: &str, value: &str) -> Result<()> {
        let int = || -> Result<i32> {
            value
                .trim()
                .parse()
                .map_err(|_| LevelError::invalid("property", name, value))
        };

        match name {
            "textureWidth" => self.width = int()?,
            "textureHeight" => self.height = int()?,
            "textureID" => self.texture_id = value.to_string(),
            "numFrames" => self.num_frames = int()?,
            "callbackId" => self.callback_id = int()?,
            "currentRow" => self.current_row = int()?,
            "flip" => {
                self.flip = FlipMode::from_i32(int()?)
                    .ok_or_else(|| LevelError::invalid("property", name, value))?;
            }
            "px" => self.position.0 = int()?,
            "py" => self.position.1 = int()?,
            "vx" => self.velocity.0 = int()?,
            "vy" => self.velocity.1 = int()?,
            "mvx" => self.max_velocity.0 = int()?,
            "mvy" => self.max_velocity.1 = int()?,
            "ax" => self.acceleration.0 = int()?,
            "ay" => self.acceleration.1 = int()?,
            "fx" => self.friction.0 = int()?,
            "fy" => self.friction.1 = int()?,
            "m_collisionMargin" => self.collision_margin = int()?,
            _ => {}
        }
        Ok(())
    }

    /// Parameter bundle for [`crate::objects::GameObject::load`]
    pub fn loader_params(&self) -> LoaderParams {
        let vector = |(x, y): (i32, i32)| Vector2D::from_ints(x, y);
        LoaderParams {
            width: self.width,
            height: self.height,
            texture_id: self.texture_id.clone(),
            current_row: self.current_row,
            num_frames: self.num_frames,
            flip: self.flip,
            callback_id: self.callback_id,
            position: vector(self.position),
            velocity: vector(self.velocity),
            max_velocity: vector(self.max_velocity),
            acceleration: vector(self.acceleration),
            friction: vector(self.friction),
        }
    }
}

/// Read an object's `width`/`height` attribute as whole pixels
///
/// Editors write fractional sizes; the fraction is truncated toward zero.
/// Values that are not finite or do not fit an `i32` are rejected.
fn pixel_extent(element: &Element, key: &str) -> Result<i32> {
    let Some(value) = element.parse_attr::<f64>(key)? else {
        return Ok(0);
    };
    let whole = value.trunc();
    if !whole.is_finite() || whole < f64::from(i32::MIN) || whole > f64::from(i32::MAX) {
        let raw = element.attr(key).unwrap_or_default();
        return Err(LevelError::invalid(&element.name, key, raw));
    }
    Ok(whole as i32)
}

/// A loaded object and whether it is a player
#[derive(Debug)]
pub struct ResolvedObject {
    pub object: SharedObject,
    pub params: LoaderParams,
    pub is_player: bool,
}

/// Players found while resolving a layer, in document order
pub type PlayerCandidates = Vec<(SharedObject, Vector2D)>;

/// Builds game objects through the factory and wires collision capability
pub struct ObjectResolver<'a> {
    factory: &'a GameObjectFactory,
    collision_layers: &'a CollisionLayers,
}

impl<'a> ObjectResolver<'a> {
    pub fn new(factory: &'a GameObjectFactory, collision_layers: &'a CollisionLayers) -> Self {
        Self {
            factory,
            collision_layers,
        }
    }

    /// Resolve every `<object>` child of an object-layer section
    pub fn resolve_layer(
        &self,
        section: &Element,
        name: impl Into<String>,
    ) -> Result<(ObjectLayer, PlayerCandidates)> {
        let mut layer = ObjectLayer::new(name);
        let mut players = Vec::new();

        for element in section.children_named("object") {
            let resolved = self.resolve(element)?;
            if resolved.is_player {
                players.push((resolved.object.clone(), resolved.params.position));
            }
            layer.push(resolved.object);
        }

        Ok((layer, players))
    }

    /// Build, wire and load a single object
    pub fn resolve(&self, element: &Element) -> Result<ResolvedObject> {
        let type_name = element
            .attr("type")
            .or_else(|| element.attr("class"))
            .ok_or_else(|| LevelError::missing(&element.name, "type"))?;

        let width = pixel_extent(element, "width")?;
        let height = pixel_extent(element, "height")?;

        let mut object = self.factory.create(type_name)?;
        let props = ObjectProperties::scan(element, width, height)?;

        let mut is_player = false;
        if let Some(collider) = object.as_collision_object() {
            collider.set_collision_layers(self.collision_layers.clone());
            collider.set_collision_margin(props.collision_margin);
            is_player = collider.as_player().is_some();
        }

        let params = props.loader_params();
        object.load(&params);

        debug!(
            type_name,
            width,
            height,
            texture = %params.texture_id,
            player = is_player,
            "Placed object"
        );

        Ok(ResolvedObject {
            object: Arc::new(RwLock::new(object)),
            params,
            is_player,
        })
    }
}
