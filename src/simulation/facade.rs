use wasm_bindgen::prelude::*;

use crate::core::{DioramaError, Vec2};
use crate::systems::drag::PointerEvent;

use super::{DioramaCore, DioramaSettings};

fn to_js(err: DioramaError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// The desk scene as seen from JavaScript
#[wasm_bindgen]
pub struct Machine {
    core: DioramaCore,
}

#[wasm_bindgen]
impl Machine {
    /// Build the default desk. `options` is a JSON object of settings; an
    /// empty string uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: &str) -> Result<Machine, JsValue> {
        let settings = DioramaSettings::from_json(options).map_err(to_js)?;
        crate::core::logging::init(settings.debug);
        let mut core = DioramaCore::new(settings).map_err(to_js)?;
        core.load_default_scene().map_err(to_js)?;
        Ok(Self { core })
    }

    /// Advance one animation frame
    pub fn step(&mut self, dt_ms: f64) {
        self.core.update(dt_ms);
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32, shift: bool) {
        self.core.pointer_down(PointerEvent::at(x, y).with_modifier(shift));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32, shift: bool) {
        self.core.pointer_move(PointerEvent::at(x, y).with_modifier(shift));
    }

    /// Returns the edited group's JSON when a group drag ended
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> Option<String> {
        self.core.pointer_up()
    }

    /// JSON draw list and pending effects for this frame
    #[wasm_bindgen(js_name = renderJson)]
    pub fn render_json(&mut self) -> Result<String, JsValue> {
        self.core.render_json().map_err(to_js)
    }

    /// Create a group from its JSON config; returns the group id
    #[wasm_bindgen(js_name = loadGroup)]
    pub fn load_group(&mut self, json: &str) -> Result<String, JsValue> {
        self.core.load_group_json(json).map_err(to_js)
    }

    #[wasm_bindgen(js_name = groupConfigJson)]
    pub fn group_config_json(&self, id: &str) -> Result<String, JsValue> {
        self.core.group_config_json(id).map_err(to_js)
    }

    /// Flat `[x0, y0, x1, y1, ...]` positions of page-side air particles
    #[wasm_bindgen(js_name = setAirSources)]
    pub fn set_air_sources(&mut self, coords: Vec<f32>) {
        let sources = coords.chunks_exact(2).map(|p| Vec2::new(p[0], p[1])).collect();
        self.core.set_air_sources(sources);
    }

    #[wasm_bindgen(js_name = setGravity)]
    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.core.set_gravity(x, y);
    }

    #[wasm_bindgen(js_name = setDebug)]
    pub fn set_debug(&mut self, debug: bool) {
        self.core.set_debug(debug);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.core.resize(width, height);
    }

    #[wasm_bindgen(getter)]
    pub fn frame(&self) -> u64 {
        self.core.frame()
    }

    #[wasm_bindgen(getter, js_name = timeMs)]
    pub fn time_ms(&self) -> f64 {
        self.core.time_ms()
    }

    #[wasm_bindgen(getter, js_name = faultLevel)]
    pub fn fault_level(&self) -> f32 {
        self.core.features().computer.fault_level()
    }

    #[wasm_bindgen(getter, js_name = bodyCount)]
    pub fn body_count(&self) -> usize {
        self.core.world().body_count()
    }

    pub fn destroy(&mut self) {
        self.core.destroy();
    }
}
