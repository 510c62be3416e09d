//! Fan: smoke drifting through the blades spins them up. At full speed with
//! the wind machine sitting on the fan paddle, the wind machine starts.

use crate::core::Vec2;
use crate::systems::scene::{Attachment, VisualId, VisualKind};

use super::{Effect, Feature, FeatureContext};

pub const BLADES_ID: &str = "fanBlades";
pub const WIND_MACHINE_ID: &str = "windMachine";
pub const FAN_PADDLE_ID: &str = "fanPaddle";
/// Dynamic bodies with this label push the blades
pub const SMOKE_LABEL: &str = "smoke";

const INITIAL_BOOST: f32 = 0.0001;
const MAX_BOOST: f32 = 0.0015;
const BOOST_FACTOR: f32 = 1.005;
/// Radians per frame
pub const MAX_ROTATION_SPEED: f32 = 0.1;
const DECAY: f32 = 0.992;
const STOP_BELOW: f32 = 0.002;
/// Radius around the blades where smoke counts
const BLADES_RADIUS: f32 = 50.0;

const GAUGE_COUNT: usize = 3;
const GAUGE_OFFSET: Vec2 = Vec2::new(18.0, -17.0);
const GAUGE_IDLE_COLOR: u32 = 0xffffff;
const GAUGE_RUNNING_COLOR: u32 = 0xf47d8a;

#[derive(Debug, Default)]
pub struct Fan {
    angle: f32,
    speed: f32,
    boost: f32,
    started: bool,
    gauges: Option<VisualId>,
    /// Extra smoke positions fed by the page (particles it owns)
    air_sources: Vec<Vec2>,
}

impl Fan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotation_speed(&self) -> f32 {
        self.speed
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn set_air_sources(&mut self, sources: Vec<Vec2>) {
        self.air_sources = sources;
    }

    /// Boost once per smoke source inside the blade circle. Returns whether
    /// anything hit the blades.
    fn boost(&mut self, center: Vec2, sources: &[Vec2]) -> bool {
        let mut boosting = false;
        for source in sources {
            if (*source - center).length_squared() >= BLADES_RADIUS * BLADES_RADIUS {
                continue;
            }
            boosting = true;
            self.boost = if self.boost == 0.0 {
                INITIAL_BOOST
            } else {
                (self.boost * BOOST_FACTOR).min(MAX_BOOST)
            };
            self.speed += self.boost;
        }
        boosting
    }

    fn decay(&mut self) {
        self.speed *= DECAY;
        if self.speed < STOP_BELOW {
            self.speed = 0.0;
            self.boost = 0.0;
        }
    }

    fn ensure_gauges(&mut self, ctx: &mut FeatureContext<'_>) -> Option<VisualId> {
        let wind = ctx.groups.get_machine_object_by_id(WIND_MACHINE_ID)?;
        let body = wind.body()?;
        if let Some(gauges) = self.gauges.filter(|g| ctx.scene.contains(*g)) {
            return Some(gauges);
        }
        let depth = ctx.scene.get(wind.visual()).map_or(0, |v| v.depth) + 1;
        let position = wind.world_position(ctx.world, ctx.scene);
        let gauges = ctx.scene.add(
            VisualKind::Gauges {
                fills: vec![0.0; GAUGE_COUNT],
                fg_color: GAUGE_IDLE_COLOR,
                animated: false,
            },
            position + GAUGE_OFFSET,
            depth,
        );
        ctx.scene
            .attach(gauges, Attachment::new(body, true).with_offset(GAUGE_OFFSET));
        self.gauges = Some(gauges);
        Some(gauges)
    }

    fn set_gauges(&self, ctx: &mut FeatureContext<'_>, fill: Option<f32>, running: bool) {
        let Some(visual) = self.gauges.and_then(|g| ctx.scene.get_mut(g)) else {
            return;
        };
        if let VisualKind::Gauges {
            fills,
            fg_color,
            animated,
        } = &mut visual.kind
        {
            if let Some(fill) = fill {
                fills.iter_mut().for_each(|f| *f = fill);
            }
            if running {
                *fg_color = GAUGE_RUNNING_COLOR;
                *animated = true;
            }
        }
    }
}

impl Feature for Fan {
    fn name(&self) -> &'static str {
        "fan"
    }

    fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        let Some(blades) = ctx.groups.get_machine_object_by_id(BLADES_ID) else {
            return;
        };
        let blades_body = blades.body();
        let center = blades.world_position(ctx.world, ctx.scene);

        let mut sources: Vec<Vec2> = ctx
            .world
            .bodies()
            .iter()
            .filter(|b| b.label == SMOKE_LABEL && !b.is_static)
            .map(|b| b.position)
            .collect();
        sources.extend_from_slice(&self.air_sources);

        let wind_on_paddle = match (ctx.groups.body_of(WIND_MACHINE_ID), ctx.groups.body_of(FAN_PADDLE_ID)) {
            (Some(wind), Some(paddle)) => ctx.world.is_touching(wind, paddle),
            _ => false,
        };

        if !self.boost(center, &sources) {
            self.decay();
        }

        let gauges = self.ensure_gauges(ctx);
        if gauges.is_none() {
            self.gauges = None;
        }
        if !self.started && wind_on_paddle {
            let percent = (self.speed / MAX_ROTATION_SPEED).clamp(0.0, 1.0);
            self.set_gauges(ctx, Some(percent), false);
        }
        if self.speed > MAX_ROTATION_SPEED {
            self.speed = MAX_ROTATION_SPEED;
            if !self.started && wind_on_paddle {
                log::info!("fan at full speed, starting the wind machine");
                self.started = true;
                self.set_gauges(ctx, None, true);
                ctx.effects.emit(Effect::FanMaxed);
            }
        }

        self.angle += self.speed;
        if let Some(body) = blades_body {
            ctx.world.set_angle(body, self.angle);
        }
    }
}
