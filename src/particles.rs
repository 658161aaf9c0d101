use crate::state::Theme;
use leptos::logging::warn;
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub const CONTAINER_ID: &str = "particles-js";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = tsParticles, js_name = load)]
    fn ts_particles_load(id: &str, options: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = tsParticles, js_name = domItem)]
    fn ts_particles_dom_item(index: u32) -> Result<JsValue, JsValue>;
}

pub fn options(theme: Theme) -> Value {
    let color = theme.particle_color();
    json!({
        "fullScreen": { "enable": false },
        "background": { "color": { "value": "transparent" } },
        "particles": {
            "number": { "value": 80, "density": { "enable": true, "area": 900 } },
            "color": { "value": color },
            "shape": { "type": "circle" },
            "opacity": { "value": 0.6, "random": true },
            "size": { "value": { "min": 1, "max": 4 } },
            "links": { "enable": true, "distance": 120, "color": color, "opacity": 0.3, "width": 1 },
            "move": { "enable": true, "speed": 0.8, "outModes": { "default": "bounce" } }
        },
        "interactivity": {
            "events": {
                "onHover": { "enable": false },
                "onClick": { "enable": false },
                "resize": true
            }
        },
        "detectRetina": true
    })
}

fn destroy_current() {
    let Ok(item) = ts_particles_dom_item(0) else {
        return;
    };
    if item.is_undefined() || item.is_null() {
        return;
    }
    let destroy = js_sys::Reflect::get(&item, &JsValue::from_str("destroy"))
        .ok()
        .and_then(|destroy| destroy.dyn_into::<js_sys::Function>().ok());
    if let Some(destroy) = destroy {
        if let Err(err) = destroy.call0(&item) {
            warn!("Particles destroy failed {err:?}");
        }
    }
}

/// Tears down the running particle system and starts one in the theme's palette.
pub fn reload(theme: Theme) {
    let has_container = leptos::document().get_element_by_id(CONTAINER_ID).is_some();
    if !has_container {
        return;
    }
    destroy_current();
    let options = match options(theme).serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
        Ok(options) => options,
        Err(err) => {
            warn!("Particles options {err}");
            return;
        }
    };
    if let Err(err) = ts_particles_load(CONTAINER_ID, options) {
        warn!("Particles unavailable {err:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_follows_theme() {
        let dark = options(Theme::Dark);
        assert_eq!(dark["particles"]["color"]["value"], "#8ab4f8");
        assert_eq!(dark["particles"]["links"]["color"], "#8ab4f8");
        let light = options(Theme::Light);
        assert_eq!(light["particles"]["color"]["value"], "#6078ea");
    }
}
