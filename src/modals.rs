use crate::app::{Modal, Shell};
use crate::loading::Loading;
use crate::render::SavedChats;
use crate::state::ChatSummary;
use leptos::ev::{KeyboardEvent, MouseEvent};
use leptos::html::Input;
use leptos::*;

/// Shared frame; only the active modal is shown.
#[component]
fn Frame(modal: Modal, #[prop(into)] title: String, children: Children) -> impl IntoView {
    let shell = expect_context::<Shell>();
    let close = move |_: MouseEvent| shell.modal.set(None);
    view! {
        <div class="modal" class:active=move || shell.modal.get() == Some(modal) role="dialog">
            <div class="modal-content">
                <div class="modal-header">
                    <h3>{title}</h3>
                    <button class="modal-close" aria-label="Close" on:click=close>
                        "✖"
                    </button>
                </div>
                {children()}
            </div>
        </div>
    }
}

#[component]
pub fn SaveModal() -> impl IntoView {
    let shell = expect_context::<Shell>();
    let title = create_node_ref::<Input>();

    // Clear the field whenever the modal opens.
    create_effect(move |_| {
        if shell.modal.get() == Some(Modal::Save) {
            if let Some(title) = title.get_untracked() {
                title.set_value("");
                let _ = title.focus();
            }
        }
    });

    let submit = move || {
        if let Some(input) = title.get_untracked() {
            shell.save(input.value());
        }
    };
    let on_keydown = move |ev: KeyboardEvent| {
        if ev.key() == "Enter" {
            ev.prevent_default();
            submit();
        }
    };

    view! {
        <Frame modal=Modal::Save title="Save chat">
            <label for="chat-title" class="sr-only">
                Chat title
            </label>
            <input
                id="chat-title"
                type="text"
                placeholder="Give this chat a title"
                node_ref=title
                on:keydown=on_keydown
            />
            <div class="modal-actions">
                <button id="confirm-save" on:click=move |_| submit()>
                    "Save"
                </button>
                <button class="secondary" on:click=move |_| shell.modal.set(None)>
                    "Cancel"
                </button>
            </div>
        </Frame>
    }
}

#[component]
fn SavedChat(chat: ChatSummary) -> impl IntoView {
    let shell = expect_context::<Shell>();
    let id = chat.id;
    view! {
        <li
            class="saved-chat"
            class:current=move || shell.transcript.with(|transcript| transcript.active() == Some(id))
        >
            <span class="saved-title" role="button" on:click=move |_| shell.load(id)>
                {chat.title}
            </span>
            {chat.created_at.map(|created| view! { <small class="saved-date">{created}</small> })}
            <button class="saved-rename" title="Rename" on:click=move |_| shell.rename(id)>
                "✏️"
            </button>
            <button class="saved-delete" title="Delete" on:click=move |_| shell.delete(id)>
                "🗑️"
            </button>
        </li>
    }
}

#[component]
pub fn SavedChatsModal() -> impl IntoView {
    let shell = expect_context::<Shell>();
    view! {
        <Frame modal=Modal::Saved title="Saved chats">
            <div id="saved-chats" class="saved-chats">
                {move || match shell.saved.get() {
                    SavedChats::Loading => view! { <Loading text="Loading..." /> }.into_view(),
                    SavedChats::Empty => view! { <p class="empty">"No saved chats"</p> }.into_view(),
                    SavedChats::Chats(chats) => view! {
                        <ul>
                            {chats
                                .into_iter()
                                .map(|chat| view! { <SavedChat chat /> })
                                .collect::<Vec<_>>()}
                        </ul>
                    }
                    .into_view(),
                }}
            </div>
        </Frame>
    }
}

#[component]
pub fn PersonaModal() -> impl IntoView {
    let shell = expect_context::<Shell>();
    let name = create_node_ref::<Input>();

    create_effect(move |_| {
        if shell.modal.get() == Some(Modal::Persona) {
            if let Some(name) = name.get_untracked() {
                name.set_value(&shell.persona.get_untracked());
                let _ = name.focus();
            }
        }
    });

    let submit = move || {
        if let Some(input) = name.get_untracked() {
            shell.rename_persona(input.value());
        }
    };
    let on_keydown = move |ev: KeyboardEvent| {
        if ev.key() == "Enter" {
            ev.prevent_default();
            submit();
        }
    };

    view! {
        <Frame modal=Modal::Persona title="Rename your companion">
            <label for="persona-name" class="sr-only">
                Companion name
            </label>
            <input id="persona-name" type="text" node_ref=name on:keydown=on_keydown />
            <div class="modal-actions">
                <button id="confirm-persona" on:click=move |_| submit()>
                    "Set"
                </button>
                <button class="secondary" on:click=move |_| shell.modal.set(None)>
                    "Cancel"
                </button>
            </div>
        </Frame>
    }
}
