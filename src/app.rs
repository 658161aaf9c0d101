use crate::api::{parse_entries, Client, HttpTransport};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::error::Error;
use crate::export;
use crate::modals::{PersonaModal, SaveModal, SavedChatsModal};
use crate::nav::Nav;
use crate::particles;
use crate::prefs::{LocalStore, Preferences};
use crate::render::SavedChats;
use crate::sidebar::Sidebar;
use crate::state::Theme;
use crate::toast::{ToastStack, Toasts};
use crate::transcript::{Sequence, Transcript};
use crate::voice::browser::{BrowserRecognizer, BrowserSynthesis};
use crate::voice::input::{InputEffect, RecognitionEvent, VoiceInput};
use crate::voice::output::VoiceOutput;
use leptos::logging::{error, log, warn};
use leptos::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Save,
    Saved,
    Persona,
}

/// Page-wide state and the operations the controls trigger.
#[derive(Clone, Copy)]
pub struct Shell {
    pub client: StoredValue<Client<HttpTransport>>,
    pub transcript: RwSignal<Transcript>,
    pub input: RwSignal<String>,
    pub prefs: StoredValue<Preferences<LocalStore>>,
    pub theme: RwSignal<Theme>,
    pub persona: RwSignal<String>,
    pub toasts: Toasts,
    pub modal: RwSignal<Option<Modal>>,
    pub saved: RwSignal<SavedChats>,
    saved_seq: StoredValue<Sequence>,
    pub sidebar: RwSignal<Sidebar>,
    voice_in: StoredValue<VoiceInput<BrowserRecognizer>>,
    pub listening: RwSignal<bool>,
    pub voice_supported: RwSignal<bool>,
    voice_out: StoredValue<Option<VoiceOutput<BrowserSynthesis>>>,
    pub synthesis_supported: RwSignal<bool>,
    /// Transcript entry being read aloud.
    pub speaking: RwSignal<Option<u64>>,
}

pub fn viewport_width() -> f64 {
    window()
        .inner_width()
        .ok()
        .and_then(|width| width.as_f64())
        .unwrap_or(1024.0)
}

fn apply_theme(theme: Theme) {
    if let Some(body) = document().body() {
        let classes = body.class_list();
        for candidate in [Theme::Dark, Theme::Light] {
            if let Err(err) = classes.toggle_with_force(candidate.body_class(), candidate == theme) {
                warn!("Theme class {err:?}");
            }
        }
    }
    particles::reload(theme);
}

impl Shell {
    fn new(config: &Config) -> Self {
        let store = LocalStore::new()
            .map_err(|err| warn!("Preferences will not persist: {err}"))
            .ok();
        let prefs = Preferences::load(store);
        let mut transcript = Transcript::default();
        transcript.reset();
        let shell = Self {
            client: store_value(Client::new(HttpTransport::new(config.api_base.clone()))),
            transcript: create_rw_signal(transcript),
            input: create_rw_signal(String::new()),
            theme: create_rw_signal(prefs.theme()),
            persona: create_rw_signal(prefs.persona().to_owned()),
            prefs: store_value(prefs),
            toasts: Toasts::new(Duration::from_millis(config.toast_ms)),
            modal: create_rw_signal(None),
            saved: create_rw_signal(SavedChats::Loading),
            saved_seq: store_value(Sequence::default()),
            sidebar: create_rw_signal(Sidebar::new(viewport_width(), config.sidebar_breakpoint)),
            voice_in: store_value(VoiceInput::new(None)),
            listening: create_rw_signal(false),
            voice_supported: create_rw_signal(false),
            voice_out: store_value(None),
            synthesis_supported: create_rw_signal(false),
            speaking: create_rw_signal(None),
        };

        match BrowserRecognizer::new(move |event| shell.on_recognition(event)) {
            Ok(recognizer) => {
                shell.voice_in.set_value(VoiceInput::new(Some(recognizer)));
                shell.voice_supported.set(true);
            }
            Err(err) => {
                warn!("{err}");
                shell.toasts.show("⚠️ Speech recognition not supported.");
            }
        }
        match BrowserSynthesis::new(move || {
            shell
                .voice_out
                .update_value(|output| output.iter_mut().for_each(VoiceOutput::refresh_voices))
        }) {
            Ok(engine) => {
                shell.voice_out.set_value(Some(VoiceOutput::new(engine)));
                shell.synthesis_supported.set(true);
            }
            Err(err) => {
                warn!("{err}");
                shell.toasts.show("⚠️ Text-to-speech not supported.");
            }
        }
        shell
    }

    /// Toasts the user-facing part of `err`, logging the rest.
    pub fn notify(self, err: &Error, fallback: &str) {
        match err {
            Error::Validation(message) => self.toasts.show(*message),
            Error::Rejected(message) => self.toasts.show(format!("⚠️ {message}")),
            Error::Unsupported(_) => self.toasts.show(format!("⚠️ {err}")),
            _ => {
                error!("{fallback} {err}");
                self.toasts.show(fallback);
            }
        }
    }

    fn restore_session(self) {
        let ticket = self.transcript.with_untracked(Transcript::begin_restore);
        let client = self.client.get_value();
        spawn_local(async move {
            let messages = client.current_session().await.unwrap_or_else(|err| {
                warn!("No session to restore: {err}");
                vec![]
            });
            let restored = self
                .transcript
                .try_update(|transcript| transcript.restore(ticket, messages));
            if restored == Some(false) {
                log!("Kept the current view over the stored session");
            }
        });
    }

    pub fn send(self) {
        self.send_text(false);
    }

    fn send_text(self, spoken: bool) {
        let text = self.input.get_untracked();
        let Some((pending, text)) = self
            .transcript
            .try_update(|transcript| transcript.submit(&text))
            .flatten()
        else {
            return;
        };
        self.input.set(String::new());
        let client = self.client.get_value();
        spawn_local(async move {
            let reply = client.send_message(&text).await;
            let received = self
                .transcript
                .try_update(|transcript| transcript.receive(pending, reply))
                .flatten();
            match received {
                Some(entry) if spoken => self.speak_entry(entry),
                Some(_) => {}
                None => log!("Dropped reply for a conversation no longer shown"),
            }
        });
    }

    pub fn new_chat(self) {
        self.stop_speaking();
        self.transcript.update(Transcript::reset);
        let client = self.client.get_value();
        spawn_local(async move {
            if let Err(err) = client.reset_session().await {
                warn!("Session reset failed: {err}");
            }
        });
    }

    pub fn save(self, title: String) {
        let exchanged = self.transcript.with_untracked(Transcript::exchanged);
        let client = self.client.get_value();
        spawn_local(async move {
            match client.save_conversation(&title, exchanged).await {
                Ok(()) => {
                    self.toasts.show("✅ Chat saved!");
                    self.show_saved();
                }
                Err(err) => self.notify(&err, "⚠️ Failed to save chat."),
            }
        });
    }

    /// Opens the saved-chats modal and (re)fetches its list.
    pub fn show_saved(self) {
        let Some(ticket) = self.saved_seq.try_update_value(Sequence::next) else {
            return;
        };
        self.saved.set(SavedChats::Loading);
        self.modal.set(Some(Modal::Saved));
        let client = self.client.get_value();
        spawn_local(async move {
            let result = client.list_conversations().await;
            if !self.saved_seq.with_value(|seq| seq.is_current(ticket)) {
                return;
            }
            match result {
                Ok(chats) => self.saved.set(chats.into()),
                Err(err) => {
                    self.modal.set(None);
                    self.notify(&err, "⚠️ Failed to load saved chats.");
                }
            }
        });
    }

    pub fn load(self, id: u32) {
        self.stop_speaking();
        let Some(ticket) = self
            .transcript
            .try_update(|transcript| transcript.begin_load(id))
        else {
            return;
        };
        let client = self.client.get_value();
        spawn_local(async move {
            let loaded = client.load_conversation(id).await;
            match self
                .transcript
                .try_update(|transcript| transcript.finish_load(ticket, loaded))
            {
                Some(Ok(true)) => self.modal.set(None),
                Some(Err(err)) => {
                    error!("Loading conversation {id} failed: {err}");
                    self.toasts.show("⚠️ Failed to load conversation.");
                }
                _ => {}
            }
        });
    }

    pub fn delete(self, id: u32) {
        let client = self.client.get_value();
        spawn_local(async move {
            match client.delete_conversation(id).await {
                Ok(()) => {
                    self.toasts.show("🗑️ Chat deleted!");
                    self.show_saved();
                }
                Err(err) => self.notify(&err, "⚠️ Failed to delete chat."),
            }
        });
    }

    pub fn rename(self, id: u32) {
        let title = match window().prompt_with_message("Enter new chat name:") {
            Ok(Some(title)) => title,
            Ok(None) => return,
            Err(err) => {
                warn!("Prompt failed {err:?}");
                return;
            }
        };
        let client = self.client.get_value();
        spawn_local(async move {
            match client.rename_conversation(id, &title).await {
                Ok(true) => {
                    self.toasts.show("✏️ Chat renamed!");
                    self.show_saved();
                }
                Ok(false) => {}
                Err(err) => self.notify(&err, "⚠️ Failed to rename chat."),
            }
        });
    }

    pub fn export_json(self) {
        let client = self.client.get_value();
        spawn_local(async move {
            let exported = client.current_conversation().await.and_then(|history| {
                let document = export::json_document(&history)?;
                export::download(export::JSON_FILE, &document, "application/json")
            });
            match exported {
                Ok(()) => self.toasts.show("Chat exported!"),
                Err(err) => self.notify(&err, "⚠️ Failed to export chat."),
            }
        });
    }

    pub fn export_pdf(self) {
        let client = self.client.get_value();
        let persona = self.persona.get_untracked();
        spawn_local(async move {
            let exported = client
                .current_conversation()
                .await
                .and_then(|history| export::save_pdf(&parse_entries(&history), &persona));
            match exported {
                Ok(()) => self.toasts.show("✅ PDF downloaded!"),
                Err(err) => self.notify(&err, "⚠️ Failed to export chat."),
            }
        });
    }

    pub fn set_theme(self, theme: Theme) {
        self.prefs.update_value(|prefs| prefs.set_theme(theme));
        self.theme.set(theme);
    }

    pub fn rename_persona(self, name: String) {
        match self
            .prefs
            .try_update_value(|prefs| prefs.rename_persona(&name))
        {
            Some(Ok(())) => {
                let persona = self.prefs.with_value(|prefs| prefs.persona().to_owned());
                self.toasts
                    .show(format!("🤖 Companion renamed to \"{persona}\""));
                self.persona.set(persona);
                self.modal.set(None);
            }
            Some(Err(err)) => self.notify(&err, "⚠️ Could not rename companion."),
            None => {}
        }
    }

    pub fn toggle_listening(self) {
        if let Some(Err(err)) = self.voice_in.try_update_value(VoiceInput::toggle) {
            self.notify(&err, "⚠️ Voice input failed.");
            self.voice_supported
                .set(self.voice_in.with_value(VoiceInput::supported));
        }
        self.listening
            .set(self.voice_in.with_value(VoiceInput::listening));
    }

    fn on_recognition(self, event: RecognitionEvent) {
        let effect = self
            .voice_in
            .try_update_value(|input| input.handle(event))
            .unwrap_or(InputEffect::None);
        self.listening
            .set(self.voice_in.with_value(VoiceInput::listening));
        match effect {
            InputEffect::None => {}
            InputEffect::SetInput(text) => self.input.set(text),
            InputEffect::Submit(text) => {
                self.input.set(text);
                self.send_text(true);
            }
            InputEffect::Notice(notice) => {
                warn!("{notice}");
                self.toasts.show(notice);
            }
        }
    }

    fn speak_entry(self, entry: u64) {
        let text = self.transcript.with_untracked(|transcript| {
            transcript
                .find(entry)
                .map(|entry| entry.message.content.clone())
        });
        let Some(text) = text else {
            return;
        };
        let spoken = self.voice_out.try_update_value(|output| {
            output.as_mut().map(|output| {
                output
                    .speak(&text, Some(entry), move |id| self.speech_ended(id))
                    .map(|_| ())
            })
        });
        if let Some(Some(Err(err))) = spoken {
            self.notify(&err, "⚠️ Could not speak.");
        }
        self.sync_speaking();
    }

    /// Speak control on a bot message.
    pub fn toggle_speech(self, entry: u64) {
        let text = self.transcript.with_untracked(|transcript| {
            transcript
                .find(entry)
                .map(|entry| entry.message.content.clone())
        });
        let Some(text) = text else {
            return;
        };
        let toggled = self.voice_out.try_update_value(|output| {
            output
                .as_mut()
                .map(|output| output.toggle(entry, &text, move |id| self.speech_ended(id)))
        });
        if let Some(Some(Err(err))) = toggled {
            self.notify(&err, "⚠️ Could not speak.");
        }
        self.sync_speaking();
    }

    fn stop_speaking(self) {
        self.voice_out
            .update_value(|output| output.iter_mut().for_each(VoiceOutput::stop));
        self.sync_speaking();
    }

    fn speech_ended(self, utterance: u64) {
        self.voice_out.update_value(|output| {
            if let Some(output) = output {
                output.finish(utterance);
            }
        });
        self.sync_speaking();
    }

    fn sync_speaking(self) {
        let owner = self
            .voice_out
            .with_value(|output| output.as_ref().and_then(VoiceOutput::speaking_owner));
        self.speaking.set(owner);
    }
}

#[component]
pub fn App(config: Config) -> impl IntoView {
    let shell = Shell::new(&config);
    provide_context(shell);
    shell.restore_session();

    let _resize = window_event_listener(ev::resize, move |_| {
        shell
            .sidebar
            .update(|sidebar| sidebar.resize(viewport_width()))
    });
    create_effect(move |_| {
        let theme = shell.theme.get();
        request_animation_frame(move || apply_theme(theme));
    });

    view! {
        <div id={particles::CONTAINER_ID} class="particles" />
        <div class="app-shell">
            <Nav />
            <Conversation />
        </div>
        <SaveModal />
        <SavedChatsModal />
        <PersonaModal />
        <ToastStack toasts=shell.toasts />
    }
}
