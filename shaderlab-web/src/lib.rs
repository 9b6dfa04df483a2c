//! ShaderLab host runtime
//!
//! Owns everything on the host side of the native boundary: the free-flying
//! camera, input mapping, frame transport into the native module's memory,
//! mono/stereo presentation, playback time and scene persistence. The browser
//! bindings live in `app` and only exist on wasm32; everything else runs and
//! is tested natively.

#[cfg(target_arch = "wasm32")]
mod app;
pub mod camera;
pub mod clock;
pub mod error;
mod hosted;
pub mod input;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod stereo;
pub mod transport;

#[cfg(test)]
mod testing;

pub use camera::Camera;
pub use error::{OptionsError, SceneLoadError, TransportError};
pub use options::ViewerOptions;
pub use renderer::{RendererContext, TickOutcome};
pub use transport::NativeModule;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("ShaderLab runtime initialized");
}

/// Create the viewer on `canvas_id`. `options_toml` overrides the default
/// viewer options; a malformed preset is rejected.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn create_app(canvas_id: String, options_toml: Option<String>) -> Result<app::App, JsValue> {
    let options = match options_toml {
        Some(text) => ViewerOptions::from_toml(&text).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => ViewerOptions::default(),
    };
    app::App::new(&canvas_id, options).await
}
