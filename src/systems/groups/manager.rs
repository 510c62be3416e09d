//! Group manager
//!
//! Owns every group and is the only writer of a member's relative position.
//! Lookups are linear scans; scenes hold tens of members, not thousands.

use crate::core::{BuildError, Vec2};
use crate::domain::{GroupConfig, ItemConfig};
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::scene::{Scene, VisualId, VisualKind};

use super::builders::{BuilderRegistry, Built, EngineContext, GroupInfo, DEFAULT_DEPTH};

pub const HANDLE_LABEL: &str = "groupHandle";
pub const HANDLE_RADIUS: f32 = 10.0;
const HANDLE_DEPTH: i32 = 1000;

/// One member entity of a group
#[derive(Clone, Debug, PartialEq)]
pub struct MachineObject {
    id: String,
    kind: String,
    relative_position: Vec2,
    body: Option<BodyId>,
    visual: VisualId,
    parts: Vec<BodyId>,
    extra_visuals: Vec<VisualId>,
    group: String,
    /// Index of the item in the group's config
    config_index: usize,
}

impl MachineObject {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn relative_position(&self) -> Vec2 {
        self.relative_position
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    pub fn visual(&self) -> VisualId {
        self.visual
    }

    pub fn parts(&self) -> &[BodyId] {
        &self.parts
    }

    pub fn extra_visuals(&self) -> &[VisualId] {
        &self.extra_visuals
    }

    pub fn group_id(&self) -> &str {
        &self.group
    }

    /// Body position for physical members, visual position otherwise
    pub fn world_position(&self, world: &PhysicsWorld, scene: &Scene) -> Vec2 {
        if let Some(body) = self.body.and_then(|id| world.body(id)) {
            return body.position;
        }
        scene
            .get(self.visual)
            .map(|v| v.position)
            .unwrap_or_default()
    }

    /// Move to `target`, dragging secondary bodies along by the same delta
    fn place(&self, world: &mut PhysicsWorld, scene: &mut Scene, target: Vec2) {
        match self.body.and_then(|id| world.body(id)).map(|b| b.position) {
            Some(current) => {
                let delta = target - current;
                if let Some(body) = self.body {
                    world.set_position(body, target);
                }
                for &part in &self.parts {
                    if let Some(pos) = world.body(part).map(|b| b.position) {
                        world.set_position(part, pos + delta);
                    }
                }
            }
            None => scene.set_position(self.visual, target),
        }
    }

    fn destroy(&self, world: &mut PhysicsWorld, scene: &mut Scene) {
        if let Some(body) = self.body {
            world.remove_body(body);
        }
        for &part in &self.parts {
            world.remove_body(part);
        }
        scene.destroy(self.visual);
        for &visual in &self.extra_visuals {
            scene.destroy(visual);
        }
    }
}

/// A draggable cluster of members sharing one origin
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    id: String,
    origin: Vec2,
    show_handle: bool,
    objects: Vec<MachineObject>,
    config: GroupConfig,
    handle: BodyId,
    handle_visual: VisualId,
}

impl Group {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn show_handle(&self) -> bool {
        self.show_handle
    }

    pub fn objects(&self) -> &[MachineObject] {
        &self.objects
    }

    /// The config the group was created from
    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    /// Sensor body at the origin used to drag the whole group
    pub fn handle(&self) -> BodyId {
        self.handle
    }

    pub fn handle_visual(&self) -> VisualId {
        self.handle_visual
    }

    pub fn object(&self, id: &str) -> Option<&MachineObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn move_handle(&self, world: &mut PhysicsWorld) {
        world.set_position(self.handle, self.origin);
    }
}

pub struct GroupManager {
    registry: BuilderRegistry,
    groups: Vec<Group>,
}

impl GroupManager {
    /// Manager with the `static` and `sprite` builders registered
    pub fn new() -> Self {
        Self::with_registry(BuilderRegistry::with_builtins())
    }

    pub fn with_registry(registry: BuilderRegistry) -> Self {
        Self {
            registry,
            groups: Vec::new(),
        }
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    /// See [`BuilderRegistry::add_object_builder`]
    pub fn add_object_builder<F>(&mut self, name: impl Into<String>, builder: F) -> bool
    where
        F: Fn(&mut EngineContext<'_>, &GroupInfo, &ItemConfig) -> Result<Built, BuildError> + 'static,
    {
        self.registry.add_object_builder(name, builder)
    }

    /// Materialize `config`: every item is placed at `origin + (x, y)`; items
    /// that fail to build are skipped. A group id that already exists is
    /// rejected with a warning and the existing group is returned.
    pub fn create_group_from_config(&mut self, ctx: &mut EngineContext<'_>, config: GroupConfig) -> &Group {
        if let Some(idx) = self.groups.iter().position(|g| g.id == config.id) {
            log::warn!("Group {} already exists; keeping the existing one.", config.id);
            return &self.groups[idx];
        }

        let info = GroupInfo {
            id: config.id.clone(),
            origin: config.origin,
        };

        let mut objects = Vec::with_capacity(config.objects.len());
        for (index, item) in config.objects.iter().enumerate() {
            let placed = item.placed_at(info.origin);
            let Some(built) = self.registry.create_machine_obj_from_config(ctx, &info, &placed) else {
                continue;
            };
            ctx.scene.set_depth(built.visual, item.depth.unwrap_or(DEFAULT_DEPTH));
            objects.push(MachineObject {
                id: item
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{}#{}", config.id, index)),
                kind: item.kind.clone(),
                relative_position: item.position(),
                body: built.body,
                visual: built.visual,
                parts: built.parts,
                extra_visuals: built.extra_visuals,
                group: config.id.clone(),
                config_index: index,
            });
        }

        let handle = ctx.world.create_static_body(
            info.origin,
            Shape::circle(HANDLE_RADIUS),
            BodyOptions {
                is_sensor: true,
                ..BodyOptions::labelled(HANDLE_LABEL)
            },
        );
        let handle_visual = ctx.scene.add(
            VisualKind::Handle {
                radius: HANDLE_RADIUS,
            },
            info.origin,
            HANDLE_DEPTH,
        );
        ctx.scene.set_visible(handle_visual, config.show_handle);
        ctx.scene.attach_to_body(handle_visual, handle, false);

        log::debug!(
            "group `{}` created with {}/{} objects",
            config.id,
            objects.len(),
            config.objects.len()
        );

        let idx = self.groups.len();
        self.groups.push(Group {
            id: config.id.clone(),
            origin: info.origin,
            show_handle: config.show_handle,
            objects,
            config,
            handle,
            handle_visual,
        });
        &self.groups[idx]
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get_group_by_id(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn get_machine_object_by_id(&self, id: &str) -> Option<&MachineObject> {
        self.groups.iter().flat_map(|g| g.objects.iter()).find(|o| o.id == id)
    }

    pub fn get_machine_object_by_body(&self, body: BodyId) -> Option<&MachineObject> {
        self.groups
            .iter()
            .flat_map(|g| g.objects.iter())
            .find(|o| o.body == Some(body))
    }

    /// Group whose handle is `body`
    pub fn group_for_handle(&self, body: BodyId) -> Option<&Group> {
        self.groups.iter().find(|g| g.handle == body)
    }

    pub fn is_handle(&self, body: BodyId) -> bool {
        self.group_for_handle(body).is_some()
    }

    /// Body of the member with `id`, if it has one
    pub fn body_of(&self, id: &str) -> Option<BodyId> {
        self.get_machine_object_by_id(id).and_then(|o| o.body)
    }

    /// Move the origin and translate every member with it; relative
    /// positions are unchanged.
    pub fn move_group_rigid(&mut self, world: &mut PhysicsWorld, scene: &mut Scene, id: &str, origin: Vec2) -> bool {
        let Some(group) = self.groups.iter_mut().find(|g| g.id == id) else {
            return false;
        };
        group.origin = origin;
        group.move_handle(world);
        for member in &group.objects {
            member.place(world, scene, origin + member.relative_position);
        }
        true
    }

    /// Move the origin only; members keep their world positions and their
    /// relative positions are recomputed against the new origin.
    pub fn reanchor_group(&mut self, world: &mut PhysicsWorld, scene: &mut Scene, id: &str, origin: Vec2) -> bool {
        let Some(group) = self.groups.iter_mut().find(|g| g.id == id) else {
            return false;
        };
        group.origin = origin;
        group.move_handle(world);
        for member in &mut group.objects {
            member.relative_position = member.world_position(world, scene) - origin;
        }
        true
    }

    /// Move one member to `position`; its relative offset tracks the origin
    pub fn move_member(&mut self, world: &mut PhysicsWorld, scene: &mut Scene, id: &str, position: Vec2) -> bool {
        for group in &mut self.groups {
            let origin = group.origin;
            if let Some(member) = group.objects.iter_mut().find(|o| o.id == id) {
                member.place(world, scene, position);
                member.relative_position = position - origin;
                return true;
            }
        }
        false
    }

    /// Destroy one member's bodies and visuals
    pub fn remove_machine_object(&mut self, world: &mut PhysicsWorld, scene: &mut Scene, id: &str) -> bool {
        for group in &mut self.groups {
            if let Some(idx) = group.objects.iter().position(|o| o.id == id) {
                let member = group.objects.remove(idx);
                member.destroy(world, scene);
                log::debug!("removed `{}` from group `{}`", member.id, group.id);
                return true;
            }
        }
        false
    }

    /// Destroy a group, its members and its handle
    pub fn remove_group(&mut self, world: &mut PhysicsWorld, scene: &mut Scene, id: &str) -> bool {
        let Some(idx) = self.groups.iter().position(|g| g.id == id) else {
            return false;
        };
        let group = self.groups.remove(idx);
        for member in &group.objects {
            member.destroy(world, scene);
        }
        world.remove_body(group.handle);
        scene.destroy(group.handle_visual);
        true
    }

    pub fn clear(&mut self, world: &mut PhysicsWorld, scene: &mut Scene) {
        let ids: Vec<String> = self.groups.iter().map(|g| g.id.clone()).collect();
        for id in ids {
            self.remove_group(world, scene, &id);
        }
    }

    /// The group's config with the current origin and each surviving member's
    /// relative position written back
    pub fn serialize_group_config(&self, id: &str) -> Option<GroupConfig> {
        let group = self.get_group_by_id(id)?;
        let mut config = group.config.clone();
        config.origin = group.origin;
        for member in &group.objects {
            if let Some(item) = config.objects.get_mut(member.config_index) {
                item.x = member.relative_position.x;
                item.y = member.relative_position.y;
            }
        }
        Some(config)
    }
}

impl Default for GroupManager {
    fn default() -> Self {
        Self::new()
    }
}
