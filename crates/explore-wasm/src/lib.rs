// crates/explore-wasm/src/lib.rs

use wasm_bindgen::prelude::*;

mod engine;
mod utils;

pub use engine::SpatialEngine;

// パニック時のスタックトレース表示とロガーの初期化
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    utils::init_logger(log::LevelFilter::Info);
}

/// ログレベルを変更（"error" | "warn" | "info" | "debug" | "trace" | "off"）
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter: log::LevelFilter = level.parse().map_err(utils::to_js_error)?;
    log::set_max_level(filter);
    Ok(())
}
