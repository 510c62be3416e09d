use crate::core::{DioramaResult, Rng};
use crate::domain::{scene_data, GroupConfig, ShapeLibrary};
use crate::features::{Culling, Effects, FeatureSet};
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::collisions::CollisionRouter;
use crate::systems::drag::{BrowserClipboard, Clipboard, DragManager};
use crate::systems::groups::{EngineContext, GroupManager};
use crate::systems::scene::Scene;

use super::settings::DioramaSettings;
use super::DioramaCore;

pub(super) fn create_core(settings: DioramaSettings, clipboard: Option<Box<dyn Clipboard>>) -> DioramaResult<DioramaCore> {
    settings.validate()?;
    let shapes = ShapeLibrary::builtin()?;

    let mut groups = GroupManager::new();
    let mut router = CollisionRouter::new(settings.seed);
    let effects = Effects::new();
    let features = FeatureSet::new(settings.ball_spawn_interval_ms, settings.max_balls);
    features.install(&mut groups, &mut router, &effects);

    let clipboard = clipboard.unwrap_or_else(|| Box::new(BrowserClipboard));
    let drag = DragManager::new(settings.center_no_swing_ratio, settings.grab_stiffness, clipboard);

    log::info!(
        "diorama core created ({}x{}, {} builders, {} collision handlers)",
        settings.width,
        settings.height,
        groups.registry().len(),
        router.len()
    );

    Ok(DioramaCore {
        world: PhysicsWorld::new(settings.gravity),
        scene: Scene::new(),
        groups,
        shapes,
        router,
        drag,
        features,
        effects,
        culling: Culling::new(settings.width, settings.height, settings.removal_distance),
        rng: Rng::new(settings.seed),
        clock_ms: 0.0,
        frame: 0,
        destroyed: false,
        settings,
    })
}

pub(super) fn load_default_scene(core: &mut DioramaCore) -> DioramaResult<usize> {
    let configs = scene_data::default_groups()?;
    let count = configs.len();
    for config in configs {
        load_group(core, config);
    }
    log::info!("default scene loaded: {count} groups, {} bodies", core.world.body_count());
    Ok(count)
}

pub(super) fn load_group(core: &mut DioramaCore, config: GroupConfig) -> String {
    let mut ctx = EngineContext::new(&mut core.world, &mut core.scene, &core.shapes);
    let group = core.groups.create_group_from_config(&mut ctx, config);
    group.id().to_string()
}

pub(super) fn destroy(core: &mut DioramaCore) {
    if core.destroyed {
        return;
    }
    core.router.destroy();
    core.groups.clear(&mut core.world, &mut core.scene);
    core.world.clear();
    core.scene.clear();
    core.effects.drain();
    core.destroyed = true;
    log::info!("diorama core destroyed after {} frames", core.frame);
}
