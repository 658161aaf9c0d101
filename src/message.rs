use crate::render::{label, message_html};
use crate::state::{CrisisResource, ReplyAction, Role};
use crate::transcript::Entry;
use leptos::IntoView;
use leptos::*;

#[component]
fn CrisisCard(resources: Vec<CrisisResource>) -> impl IntoView {
    view! {
        <div class="crisis-card" role="note">
            <p>"If you are in danger or thinking about ending your life, please reach out now:"</p>
            <ul>
                {resources
                    .into_iter()
                    .map(|resource| {
                        view! {
                            <li>
                                <strong>{resource.label}</strong>
                                {resource
                                    .phone
                                    .map(|phone| {
                                        let href = format!("tel:{phone}");
                                        view! { " · " <a href=href>{phone}</a> }
                                    })}
                                {resource
                                    .url
                                    .map(|url| {
                                        view! { " · " <a href=url target="_blank" rel="noopener">"Website"</a> }
                                    })}
                            </li>
                        }
                    })
                    .collect::<Vec<_>>()}
            </ul>
        </div>
    }
}

#[component]
pub fn Message(
    entry: Entry,
    #[prop(into)] persona: Signal<String>,
    #[prop(into)] speaking: Signal<bool>,
    on_speak: Option<Callback<u64>>,
) -> impl IntoView {
    let role = entry.message.role;
    let parsed = message_html(&entry.message);
    let class = match role {
        Role::User => "message user",
        Role::Bot => "message bot",
    };
    let id = entry.id;
    let speak = on_speak.map(|on_speak| {
        view! {
            <button
                class="speak-btn"
                aria-label="Read aloud"
                aria-pressed=move || speaking.get().to_string()
                on:click=move |_| on_speak.call(id)
            >
                {move || if speaking.get() { "⏹️" } else { "🔊" }}
            </button>
        }
    });
    let action = entry.action.map(|action| match action {
        ReplyAction::Crisis { resources } => view! { <CrisisCard resources /> }.into_view(),
        ReplyAction::InlineBreathing { .. } => view! {
            <a class="breathing-link" href="/breathing">
                "Open the guided breathing exercise"
            </a>
        }
        .into_view(),
    });
    view! {
        <div class=class>
            <span class="label">{move || label(role, &persona.get())}": "</span>
            <span class="chat-text" inner_html=parsed />
            {speak}
            {action}
            <div class="timestamp">{entry.message.timestamp}</div>
        </div>
    }
}
