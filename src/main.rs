mod admin;
mod api;
mod app;
mod config;
mod conversation;
mod error;
mod export;
mod loading;
mod message;
mod modals;
mod nav;
mod particles;
mod prefs;
mod render;
mod sidebar;
mod state;
mod toast;
mod transcript;
mod voice;

use admin::Admin;
use app::App;
use config::Config;
use leptos::logging::error;
use leptos::*;

fn main() {
    console_error_panic_hook::set_once();
    let config = match Config::from_page() {
        Ok(config) => config,
        Err(err) => {
            error!("Cannot start: {err}");
            mount_to_body(|| view! { <p class="fatal">"⚠️ Theramind could not start."</p> });
            return;
        }
    };
    let admin = window()
        .location()
        .pathname()
        .map(|path| path.starts_with("/admin"))
        .unwrap_or(false);
    mount_to_body(move || {
        if admin {
            view! { <Admin config /> }.into_view()
        } else {
            view! { <App config /> }.into_view()
        }
    })
}
