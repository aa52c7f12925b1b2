use pwa_kit_core::constants::PRELOADER_DELAY_MS;
use pwa_kit_core::hide_preloader;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::dom::{PageDom, js_error_message, sleep_ms};

/// JavaScript entry point: fade out `#preloader` shortly after startup.
#[wasm_bindgen(js_name = initPreloader)]
pub fn init_preloader() {
    spawn_local(async {
        if let Err(err) = sleep_ms(PRELOADER_DELAY_MS).await {
            log::warn!("preloader timer failed: {}", js_error_message(&err));
            return;
        }
        if !hide_preloader(&PageDom) {
            log::debug!("no #preloader on this page");
        }
    });
}
