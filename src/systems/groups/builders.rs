//! Object builder registry
//!
//! Maps an item `type` to the factory that turns its config into a body and a
//! visual. Failures are never fatal: the item is skipped with a warning.

use std::collections::HashMap;

use crate::core::{BuildError, Vec2};
use crate::domain::{ItemConfig, ShapeLibrary, SpriteConfig, StaticConfig};
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::scene::{Scene, VisualId, VisualKind};

/// Default depth of group members and sprites
pub const DEFAULT_DEPTH: i32 = 100;

/// Engine capabilities a builder may use
pub struct EngineContext<'a> {
    pub world: &'a mut PhysicsWorld,
    pub scene: &'a mut Scene,
    pub shapes: &'a ShapeLibrary,
}

impl<'a> EngineContext<'a> {
    pub fn new(world: &'a mut PhysicsWorld, scene: &'a mut Scene, shapes: &'a ShapeLibrary) -> Self {
        Self { world, scene, shapes }
    }

    /// Look up a named shape
    pub fn shape(&self, name: &str) -> Result<Shape, BuildError> {
        self.shapes
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownShape(name.to_string()))
    }
}

/// The group an item is being built into
#[derive(Clone, Debug, PartialEq)]
pub struct GroupInfo {
    pub id: String,
    pub origin: Vec2,
}

/// What a builder produced. `body` is `None` for decorative members.
#[derive(Clone, Debug, PartialEq)]
pub struct Built {
    pub body: Option<BodyId>,
    pub visual: VisualId,
    /// Secondary bodies owned by the member (destroyed with it)
    pub parts: Vec<BodyId>,
    /// Secondary visuals owned by the member (destroyed with it)
    pub extra_visuals: Vec<VisualId>,
}

impl Built {
    pub fn visual(visual: VisualId) -> Self {
        Self {
            body: None,
            visual,
            parts: Vec::new(),
            extra_visuals: Vec::new(),
        }
    }

    pub fn with_body(body: BodyId, visual: VisualId) -> Self {
        Self {
            body: Some(body),
            ..Self::visual(visual)
        }
    }

    pub fn with_parts(mut self, parts: Vec<BodyId>) -> Self {
        self.parts = parts;
        self
    }

    pub fn with_extra_visual(mut self, visual: VisualId) -> Self {
        self.extra_visuals.push(visual);
        self
    }
}

pub type ObjectBuilder = Box<dyn Fn(&mut EngineContext<'_>, &GroupInfo, &ItemConfig) -> Result<Built, BuildError>>;

#[derive(Default)]
pub struct BuilderRegistry {
    builders: HashMap<String, ObjectBuilder>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `static` and `sprite` builders
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.add_object_builder("static", build_static);
        registry.add_object_builder("sprite", build_sprite);
        registry
    }

    /// Register `builder` for `name`. The first registration wins; a duplicate
    /// is ignored with a warning and `false` is returned.
    pub fn add_object_builder<F>(&mut self, name: impl Into<String>, builder: F) -> bool
    where
        F: Fn(&mut EngineContext<'_>, &GroupInfo, &ItemConfig) -> Result<Built, BuildError> + 'static,
    {
        let name = name.into();
        if self.builders.contains_key(&name) {
            log::warn!("Object builder with name {name} already exists.");
            return false;
        }
        self.builders.insert(name, Box::new(builder));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Build `item` (already placed in world space). Unknown types and builder
    /// errors are logged and yield `None`.
    pub fn create_machine_obj_from_config(
        &self,
        ctx: &mut EngineContext<'_>,
        group: &GroupInfo,
        item: &ItemConfig,
    ) -> Option<Built> {
        let Some(builder) = self.builders.get(&item.kind) else {
            log::warn!("No object builder found for type {}", item.kind);
            return None;
        };
        match builder(ctx, group, item) {
            Ok(built) => Some(built),
            Err(err) => {
                log::warn!(
                    "skipping `{}` in group `{}`: {err}",
                    item.id.as_deref().unwrap_or(&item.kind),
                    group.id
                );
                None
            }
        }
    }
}

fn build_static(ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: StaticConfig = item.typed()?;
    let shape = match (&config.shape_name, &config.shape) {
        (Some(name), _) => Some(ctx.shape(name)?),
        (None, shape) => shape.clone(),
    };
    if shape.is_none() && config.sprite.is_none() {
        return Err(BuildError::MissingSpriteOrShape { x: item.x, y: item.y });
    }

    let depth = item.depth.unwrap_or(DEFAULT_DEPTH);
    let position = item.position();

    let visual = match &config.sprite {
        Some(sprite) => ctx.scene.add(
            VisualKind::Sprite {
                texture: sprite.clone(),
            },
            position,
            depth,
        ),
        None => {
            // collider only; keep an invisible outline so the member has a visual
            let half = shape.as_ref().map(Shape::half_extents).unwrap_or_default();
            let id = ctx.scene.add(
                VisualKind::RoundedRect {
                    width: half.x * 2.0,
                    height: half.y * 2.0,
                    radius: 0.0,
                    fill: None,
                    stroke: Some(0xffff00),
                    line_width: 1.0,
                },
                position,
                depth,
            );
            ctx.scene.set_visible(id, false);
            id
        }
    };

    let Some(shape) = shape else {
        return Ok(Built::visual(visual));
    };

    let label = config
        .label
        .or(config.shape_name)
        .unwrap_or_else(|| item.kind.clone());
    let body = ctx
        .world
        .create_static_body(position, shape, BodyOptions::labelled(label));
    ctx.scene.attach_to_body(visual, body, true);
    Ok(Built::with_body(body, visual))
}

fn build_sprite(ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: SpriteConfig = item.typed()?;
    let body_config = config.body.clone().unwrap_or_default();
    let shape = match &config.shape_name {
        Some(name) => Some(ctx.shape(name)?),
        None => body_config.shape.clone(),
    };

    let position = item.position();
    let visual = ctx.scene.add(
        VisualKind::Sprite {
            texture: config.sprite.clone(),
        },
        position,
        item.depth.unwrap_or(DEFAULT_DEPTH),
    );
    if let Some(v) = ctx.scene.get_mut(visual) {
        v.display_size = config
            .display_width
            .zip(config.display_height)
            .map(|(w, h)| Vec2::new(w, h));
    }

    let Some(shape) = shape else {
        return Ok(Built::visual(visual));
    };

    let mut opts = BodyOptions::labelled(body_config.label.unwrap_or_else(|| config.sprite.clone()));
    if let Some(friction) = body_config.friction {
        opts.friction = friction;
    }
    if let Some(restitution) = body_config.restitution {
        opts.restitution = restitution;
    }
    let body = if body_config.is_static {
        ctx.world.create_static_body(position, shape, opts)
    } else {
        ctx.world.create_dynamic_body(position, shape, opts)
    };
    ctx.scene.attach_to_body(visual, body, true);
    Ok(Built::with_body(body, visual))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (PhysicsWorld, Scene, ShapeLibrary) {
        let mut shapes = ShapeLibrary::new();
        shapes.insert("crate", Shape::rect(20.0, 20.0));
        (PhysicsWorld::new(Vec2::zero()), Scene::new(), shapes)
    }

    fn group() -> GroupInfo {
        GroupInfo {
            id: "g".to_string(),
            origin: Vec2::zero(),
        }
    }

    #[test]
    fn static_with_shape_name_creates_static_body() {
        let (mut world, mut scene, shapes) = fixture();
        let registry = BuilderRegistry::with_builtins();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let item = ItemConfig::new("static", 5.0, 6.0)
            .with_param("sprite", "crate")
            .with_param("shapeName", "crate");
        let built = registry.create_machine_obj_from_config(&mut ctx, &group(), &item).unwrap();
        let body = world.body(built.body.unwrap()).unwrap();
        assert!(body.is_static);
        assert_eq!(body.label, "crate");
        assert_eq!(body.position, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn static_without_sprite_or_shape_is_skipped() {
        let (mut world, mut scene, shapes) = fixture();
        let registry = BuilderRegistry::with_builtins();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let item = ItemConfig::new("static", 0.0, 0.0);
        assert!(registry.create_machine_obj_from_config(&mut ctx, &group(), &item).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn unknown_shape_name_is_skipped() {
        let (mut world, mut scene, shapes) = fixture();
        let registry = BuilderRegistry::with_builtins();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let item = ItemConfig::new("static", 0.0, 0.0).with_param("shapeName", "nope");
        assert!(registry.create_machine_obj_from_config(&mut ctx, &group(), &item).is_none());
    }

    #[test]
    fn sprite_without_shape_is_decorative() {
        let (mut world, mut scene, shapes) = fixture();
        let registry = BuilderRegistry::with_builtins();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let item = ItemConfig::new("sprite", 1.0, 2.0).with_param("sprite", "cover");
        let built = registry.create_machine_obj_from_config(&mut ctx, &group(), &item).unwrap();
        assert!(built.body.is_none());
        assert_eq!(scene.get(built.visual).unwrap().texture(), Some("cover"));
    }

    #[test]
    fn sprite_with_shape_is_dynamic() {
        let (mut world, mut scene, shapes) = fixture();
        let registry = BuilderRegistry::with_builtins();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let item = ItemConfig::new("sprite", 0.0, 0.0)
            .with_param("sprite", "box")
            .with_param("matterBodyConfig", serde_json::json!({"shape": {"type": "circle", "radius": 4}}));
        let built = registry.create_machine_obj_from_config(&mut ctx, &group(), &item).unwrap();
        assert!(!world.body(built.body.unwrap()).unwrap().is_static);
    }

    #[test]
    fn first_registration_wins() {
        let (mut world, mut scene, shapes) = fixture();
        let mut registry = BuilderRegistry::new();
        let first = |ctx: &mut EngineContext<'_>, _: &GroupInfo, item: &ItemConfig| -> Result<Built, BuildError> {
            let texture = "first".to_string();
            Ok(Built::visual(ctx.scene.add(VisualKind::Sprite { texture }, item.position(), 0)))
        };
        let second = |ctx: &mut EngineContext<'_>, _: &GroupInfo, item: &ItemConfig| -> Result<Built, BuildError> {
            let texture = "second".to_string();
            Ok(Built::visual(ctx.scene.add(VisualKind::Sprite { texture }, item.position(), 0)))
        };
        assert!(registry.add_object_builder("x", first));
        assert!(!registry.add_object_builder("x", second));
        assert_eq!(registry.len(), 1);

        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let built = registry
            .create_machine_obj_from_config(&mut ctx, &group(), &ItemConfig::new("x", 0.0, 0.0))
            .unwrap();
        assert_eq!(scene.get(built.visual).unwrap().texture(), Some("first"));
    }

    #[test]
    fn unknown_type_returns_none() {
        let (mut world, mut scene, shapes) = fixture();
        let registry = BuilderRegistry::with_builtins();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let item = ItemConfig::new("teleporter", 0.0, 0.0);
        assert!(registry.create_machine_obj_from_config(&mut ctx, &group(), &item).is_none());
        assert!(scene.is_empty());
    }
}
