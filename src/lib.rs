pub mod app;
pub mod auth;
pub mod autosave;
pub mod exercises;
pub mod log;
pub mod pages;
pub mod sheets;
pub mod storage;
pub mod types;

use leptos::*;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // Coming back from the Google consent screen the token rides in the
    // URL fragment; store it before the app mounts.
    let store = storage::Store::browser();
    auth::capture_redirect_token(&store);

    mount_to_body(app::App);
}
