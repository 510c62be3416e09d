//! One-shot effect events for the page (particles, sounds, callbacks)

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::core::Vec2;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    /// Coffee sprayed around `angle_deg` (screen degrees)
    #[serde(rename_all = "camelCase")]
    CoffeeSplash {
        position: Vec2,
        angle_deg: f32,
        speed_min: f32,
        speed_max: f32,
    },
    /// Shot poured from the machine spout
    CoffeePour { position: Vec2 },
    #[serde(rename_all = "camelCase")]
    GlassShards {
        position: Vec2,
        count: u32,
        /// hits / max hits
        damage: f32,
    },
    BugjarBroken { position: Vec2 },
    /// Fan reached full speed with the wind machine on its paddle
    FanMaxed,
}

/// Shared effect queue. Clones push into the same buffer, so collision
/// callbacks can hold one.
#[derive(Clone, Debug, Default)]
pub struct Effects {
    queue: Rc<RefCell<Vec<Effect>>>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, effect: Effect) {
        log::debug!("effect: {:?}", effect);
        self.queue.borrow_mut().push(effect);
    }

    /// Take every pending effect
    pub fn drain(&self) -> Vec<Effect> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
