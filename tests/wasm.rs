#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Reflect};
use reversi::{WasmGame, wasm_ready};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn field(value: &JsValue, name: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(name)).unwrap()
}

#[wasm_bindgen_test]
fn module_is_ready() {
    assert!(wasm_ready());
}

#[wasm_bindgen_test]
fn state_reports_turn_and_placeable_cells() {
    let game = WasmGame::new(1);

    let state = game.state().unwrap();
    let snapshot = field(&state, "snapshot");

    assert_eq!(field(&snapshot, "turn").as_string().as_deref(), Some("x"));
    assert_eq!(Array::from(&field(&snapshot, "discs")).length(), 4);
    assert_eq!(Array::from(&field(&state, "placeable")).length(), 4);
    assert_eq!(
        field(&field(&state, "message"), "label").as_string().as_deref(),
        Some("'s turn")
    );
}

#[wasm_bindgen_test]
fn placing_updates_count_and_changed_cells() {
    let mut game = WasmGame::new(1);

    assert!(game.place(3, 2).unwrap());

    let state = game.state().unwrap();
    let count = field(&state, "count");
    assert_eq!(field(&count, "dark").as_f64(), Some(4.0));
    assert_eq!(field(&count, "light").as_f64(), Some(1.0));
    assert_eq!(Array::from(&field(&state, "changed")).length(), 2);
}

#[wasm_bindgen_test]
fn computer_side_moves_on_request() {
    let mut game = WasmGame::new(7);
    game.change_player_kind(0, 1).unwrap();

    assert!(game.is_computer_turn());
    assert!(game.computer_move());
    assert!(!game.is_computer_turn());
    assert!(game.change_player_kind(2, 0).is_err());
}

#[wasm_bindgen_test]
fn saved_json_loads_back() {
    let mut game = WasmGame::new(1);
    game.place(3, 2).unwrap();
    let json = game.save_state().unwrap();

    let mut restored = WasmGame::new(2);

    assert!(restored.load_state(&json));
    assert_eq!(restored.save_state().unwrap(), json);
    assert!(!restored.load_state("garbage"));
}
