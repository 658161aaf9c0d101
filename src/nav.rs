use crate::app::{Modal, Shell};
use crate::state::Theme;
use leptos::*;

#[component]
fn ThemeToggle() -> impl IntoView {
    let shell = expect_context::<Shell>();
    let option = move |theme: Theme, text: &'static str| {
        view! {
            <label>
                <input
                    type="radio"
                    name="theme"
                    value=theme.as_str()
                    prop:checked=move || shell.theme.get() == theme
                    on:change=move |_| shell.set_theme(theme)
                />
                {text}
            </label>
        }
    };
    view! {
        <div class="theme-toggle" role="radiogroup" aria-label="Theme">
            {option(Theme::Light, "☀️ Light")}
            {option(Theme::Dark, "🌙 Dark")}
        </div>
    }
}

#[component]
pub fn Nav() -> impl IntoView {
    let shell = expect_context::<Shell>();
    let sidebar = shell.sidebar;
    let toggle = move |_: ev::MouseEvent| sidebar.update(|sidebar| sidebar.toggle());
    let dismiss = move |_: ev::MouseEvent| sidebar.update(|sidebar| sidebar.dismiss());
    // Picking an action closes the overlay on small screens.
    let act = move |action: fn(Shell)| {
        move |_: ev::MouseEvent| {
            sidebar.update(|sidebar| sidebar.dismiss());
            action(shell);
        }
    };
    let open = move |modal: Modal| {
        move |_: ev::MouseEvent| {
            sidebar.update(|sidebar| sidebar.dismiss());
            shell.modal.set(Some(modal));
        }
    };

    view! {
        <button
            id="sidebarToggle"
            class="sidebar-toggle"
            class:hidden=move || !sidebar.get().overlay()
            aria-controls="sidebar"
            aria-expanded=move || sidebar.get().expanded().to_string()
            on:click=toggle
        >
            <svg viewBox="0 0 10 8" width="20">
                <path
                    d="M1 1h8M1 4h 8M1 7h8"
                    stroke="currentColor"
                    fill="currentColor"
                    stroke-width="2"
                    stroke-linecap="round"
                />
            </svg>
            <span class="sr-only">Menu</span>
        </button>
        <Show when=move || sidebar.get().backdrop()>
            <div class="sidebar-backdrop" on:click=dismiss />
        </Show>
        <nav
            id="sidebar"
            class="sidebar"
            class:overlay=move || sidebar.get().overlay()
            class:hidden=move || !sidebar.get().visible()
        >
            <div class="sidebar-header">
                <h5>{move || shell.persona.get()}</h5>
                <Show when=move || sidebar.get().overlay()>
                    <button class="sidebar-close" on:click=dismiss>
                        <svg viewBox="0 0 10 10" width="20">
                            <path
                                d="M1 1L9 9M1 9L9 1"
                                stroke="currentColor"
                                fill="currentColor"
                                stroke-width="2"
                                stroke-linecap="round"
                            />
                        </svg>
                        <span class="sr-only">Close menu</span>
                    </button>
                </Show>
            </div>
            <ul class="sidebar-actions">
                <li>
                    <button id="new-chat" on:click=act(Shell::new_chat)>
                        "🆕 New chat"
                    </button>
                </li>
                <li>
                    <button id="clear-chat" on:click=act(Shell::new_chat)>
                        "🧹 Clear chat"
                    </button>
                </li>
                <li>
                    <button id="save-chat" on:click=open(Modal::Save)>
                        "💾 Save chat"
                    </button>
                </li>
                <li>
                    <button id="view-saved" on:click=act(Shell::show_saved)>
                        "📂 Saved chats"
                    </button>
                </li>
                <li>
                    <button id="export-chat" on:click=act(Shell::export_json)>
                        "⬇️ Export JSON"
                    </button>
                </li>
                <li>
                    <button id="export-chat-pdf" on:click=act(Shell::export_pdf)>
                        "📄 Download PDF"
                    </button>
                </li>
                <li>
                    <button id="rename-companion" on:click=open(Modal::Persona)>
                        "✏️ Rename companion"
                    </button>
                </li>
            </ul>
            <ThemeToggle />
        </nav>
    }
}
