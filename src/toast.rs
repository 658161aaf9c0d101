use leptos::*;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    id: u64,
    text: String,
}

/// Transient notices, each removed after `duration`.
#[derive(Clone, Copy)]
pub struct Toasts {
    items: RwSignal<Vec<Toast>>,
    next: StoredValue<u64>,
    duration: Duration,
}

impl Toasts {
    pub fn new(duration: Duration) -> Self {
        Self {
            items: create_rw_signal(vec![]),
            next: store_value(0),
            duration,
        }
    }

    pub fn show(self, text: impl Into<String>) {
        let Some(id) = self.next.try_update_value(|next| {
            *next += 1;
            *next
        }) else {
            return;
        };
        let text = text.into();
        self.items.update(|items| items.push(Toast { id, text }));
        let items = self.items;
        set_timeout(
            move || items.update(|items| items.retain(|toast| toast.id != id)),
            self.duration,
        );
    }
}

#[component]
pub fn ToastStack(toasts: Toasts) -> impl IntoView {
    view! {
        <div class="toast-stack" aria-live="polite">
            <For
                each=move || toasts.items.get()
                key=|toast| toast.id
                children=move |toast| view! { <div class="toast">{toast.text}</div> }
            />
        </div>
    }
}
