use crate::app::Shell;
use crate::message::Message;
use crate::render::{speakable, typing_text};
use leptos::ev::{KeyboardEvent, SubmitEvent};
use leptos::html::Div;
use leptos::*;

#[component]
pub fn Conversation() -> impl IntoView {
    let shell = expect_context::<Shell>();
    let chat_box = create_node_ref::<Div>();

    // Keep the newest message in view.
    create_effect(move |_| {
        shell.transcript.with(|_| ());
        request_animation_frame(move || {
            if let Some(chat_box) = chat_box.get_untracked() {
                chat_box.set_scroll_top(chat_box.scroll_height());
            }
        });
    });

    let entries = move || shell.transcript.with(|transcript| transcript.entries().to_vec());
    let typing = move || shell.transcript.with(|transcript| transcript.typing());

    let update_message = move |ev| {
        shell.input.set(event_target_value(&ev));
    };
    let send_message = move |ev: SubmitEvent| {
        ev.prevent_default();
        shell.send();
    };
    let on_keydown = move |ev: KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            shell.send();
        }
    };

    view! {
        <section class="chat">
            <div id="chat-box" class="chat-box" node_ref=chat_box>
                <For
                    each=entries
                    key=|entry| entry.id
                    children=move |entry| {
                        let id = entry.id;
                        let speakable = speakable(
                            entry.message.role,
                            shell.synthesis_supported.get_untracked(),
                        );
                        view! {
                            <Message
                                entry=entry
                                persona=shell.persona
                                speaking=Signal::derive(move || shell.speaking.get() == Some(id))
                                on_speak=speakable.then(|| Callback::new(move |_| shell.toggle_speech(id)))
                            />
                        }
                    }
                />
                <Show when=typing>
                    <div class="message bot typing-indicator">
                        {move || typing_text(&shell.persona.get())}
                    </div>
                </Show>
            </div>
            <div
                id="voice-indicator"
                class="voice-indicator"
                style:display=move || if shell.listening.get() { "block" } else { "none" }
            >
                "🎙️ Listening..."
            </div>
            <form class="chat-input" on:submit=send_message>
                <label for="user-input" class="sr-only">
                    Your message
                </label>
                <textarea
                    id="user-input"
                    rows="1"
                    placeholder="Share what's on your mind..."
                    on:input=update_message
                    on:keydown=on_keydown
                    prop:value=move || shell.input.get()
                />
                <button
                    id="speak"
                    type="button"
                    class="mic-btn"
                    disabled=move || !shell.voice_supported.get()
                    title=move || {
                        if shell.voice_supported.get() { "Voice input" } else { "Voice input is not supported in this browser" }
                    }
                    on:click=move |_| shell.toggle_listening()
                >
                    {move || if shell.listening.get() { "⏹️ Stop" } else { "🎙️ Speak" }}
                </button>
                <button id="send" type="submit" class="send-btn">
                    "Send"
                </button>
            </form>
        </section>
    }
}
