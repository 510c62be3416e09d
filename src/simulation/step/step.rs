use crate::features::FeatureContext;
use crate::systems::collisions::CollisionPhase;

use super::DioramaCore;

/// Longest frame fed to the physics step; slower frames run in slow motion
pub const MAX_STEP_MS: f64 = 50.0;

/// One frame, in this order: feature pre-update, physics step, collision
/// dispatch (start, active, end), deferred handler removal, feature update,
/// visual sync, out-of-bounds culling.
pub(super) fn update(core: &mut DioramaCore, dt_ms: f64) {
    if core.destroyed {
        return;
    }
    if dt_ms.is_nan() || dt_ms <= 0.0 {
        return;
    }
    let dt_ms = dt_ms.min(MAX_STEP_MS);
    core.clock_ms += dt_ms;
    core.frame += 1;

    {
        let mut ctx = FeatureContext {
            world: &mut core.world,
            scene: &mut core.scene,
            groups: &mut core.groups,
            shapes: &core.shapes,
            effects: &core.effects,
            rng: &mut core.rng,
            now_ms: core.clock_ms,
            dt_ms,
        };
        core.features.pre_update(&mut ctx);
    }

    let events = core.world.step((dt_ms / 1000.0) as f32);
    let now = core.clock_ms;
    core.router.dispatch(CollisionPhase::Start, &events.start, &mut core.world, now);
    core.router.dispatch(CollisionPhase::Active, &events.active, &mut core.world, now);
    core.router.dispatch(CollisionPhase::End, &events.end, &mut core.world, now);
    core.router.after_update();

    {
        let mut ctx = FeatureContext {
            world: &mut core.world,
            scene: &mut core.scene,
            groups: &mut core.groups,
            shapes: &core.shapes,
            effects: &core.effects,
            rng: &mut core.rng,
            now_ms: now,
            dt_ms,
        };
        core.features.update(&mut ctx);
    }

    core.scene.sync_attached(&core.world);
    core.culling.run(&mut core.world, &mut core.scene, &mut core.groups);
}
