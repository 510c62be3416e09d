#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

use diorama_engine::Machine;

#[wasm_bindgen_test]
fn machine_steps_and_renders() {
    diorama_engine::init();
    let mut machine = Machine::new("").unwrap();
    for _ in 0..10 {
        machine.step(16.0);
    }
    assert_eq!(machine.frame(), 10);
    let json = machine.render_json().unwrap();
    assert!(json.contains("\"visuals\""));
    assert_eq!(machine.fault_level(), 0.0);
    machine.destroy();
    assert_eq!(machine.body_count(), 0);
}
