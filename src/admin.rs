use crate::api::{Client, HttpTransport, NewUser};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loading::Loading;
use crate::render::{escape, SavedChats};
use crate::state::{AdminUser, ChatSummary, Message};
use crate::toast::{ToastStack, Toasts};
use leptos::ev::{MouseEvent, SubmitEvent};
use leptos::logging::error;
use leptos::*;
use std::time::Duration;

fn user_label(user: &AdminUser) -> String {
    if user.is_admin {
        format!("{} (admin)", user.username)
    } else {
        user.username.clone()
    }
}

/// Title and body of the read-only page showing a conversation's history.
fn history_page(id: u32, messages: &[Message]) -> Result<(String, String)> {
    let json = serde_json::to_string_pretty(messages)?;
    Ok((
        format!("Conversation {id}"),
        format!(
            r#"<pre style="white-space:pre-wrap;font-family:monospace;padding:20px;">{}</pre>"#,
            escape(&json)
        ),
    ))
}

fn open_history(id: u32, messages: &[Message]) -> Result<()> {
    let (title, body) = history_page(id, messages)?;
    let opened = window()
        .open_with_url_and_target("", "_blank")?
        .ok_or(Error::Js("popup blocked".to_owned()))?;
    let document = opened
        .document()
        .ok_or(Error::Js("popup has no document".to_owned()))?;
    document.set_title(&title);
    if let Some(page) = document.body() {
        page.set_inner_html(&body);
    }
    Ok(())
}

fn confirmed(question: &str) -> bool {
    window().confirm_with_message(question).unwrap_or(false)
}

fn report(toasts: Toasts, err: &Error, fallback: &str) {
    match err {
        Error::Validation(message) => toasts.show(*message),
        Error::Rejected(message) => toasts.show(format!("{fallback}: {message}")),
        _ => {
            error!("{fallback}: {err}");
            toasts.show(format!("{fallback}."));
        }
    }
}

#[component]
pub fn Admin(config: Config) -> impl IntoView {
    let client = store_value(Client::new(HttpTransport::new(config.api_base.clone())));
    let toasts = Toasts::new(Duration::from_millis(config.toast_ms));
    let (reload, set_reload) = create_signal(0u32);
    let refresh = move || set_reload.update(|reload| *reload += 1);

    let users = create_local_resource(
        move || reload.get(),
        move |_| {
            let client = client.get_value();
            async move {
                client
                    .admin_users()
                    .await
                    .map_err(|err| error!("Loading users failed: {err}"))
                    .ok()
            }
        },
    );

    let delete = move |id: u32| {
        if !confirmed("Delete user?") {
            return;
        }
        let client = client.get_value();
        spawn_local(async move {
            match client.admin_delete_user(id).await {
                Ok(()) => {
                    toasts.show("User deleted");
                    refresh();
                }
                Err(err) => report(toasts, &err, "Delete failed"),
            }
        });
    };
    let toggle_admin = move |id: u32| {
        let client = client.get_value();
        spawn_local(async move {
            match client.admin_toggle_admin(id).await {
                Ok(true) => toasts.show("User is now an admin"),
                Ok(false) => toasts.show("Admin rights removed"),
                Err(err) => return report(toasts, &err, "Update failed"),
            }
            refresh();
        });
    };

    let (convos_reload, set_convos_reload) = create_signal(0u32);
    let refresh_convos = move || set_convos_reload.update(|reload| *reload += 1);
    let conversations = create_local_resource(
        move || convos_reload.get(),
        move |_| {
            let client = client.get_value();
            async move {
                client
                    .list_conversations()
                    .await
                    .map(SavedChats::from)
                    .map_err(|err| error!("Loading conversations failed: {err}"))
                    .ok()
            }
        },
    );
    let open_conversation = move |id: u32| {
        let client = client.get_value();
        spawn_local(async move {
            let opened = client
                .load_conversation(id)
                .await
                .and_then(|messages| open_history(id, &messages));
            if let Err(err) = opened {
                report(toasts, &err, "Open failed");
            }
        });
    };
    let delete_conversation = move |id: u32| {
        if !confirmed("Delete conversation?") {
            return;
        }
        let client = client.get_value();
        spawn_local(async move {
            match client.delete_conversation(id).await {
                Ok(()) => refresh_convos(),
                Err(err) => report(toasts, &err, "Delete failed"),
            }
        });
    };
    let conversation_row = move |chat: ChatSummary| {
        let id = chat.id;
        view! {
            <div class="list-item">
                <div>{chat.title}</div>
                <div>
                    <button class="btn" on:click=move |_: MouseEvent| open_conversation(id)>
                        "Open"
                    </button>
                    <button class="btn" on:click=move |_: MouseEvent| delete_conversation(id)>
                        "Delete"
                    </button>
                </div>
            </div>
        }
    };

    let (username, set_username) = create_signal(String::new());
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (is_admin, set_is_admin) = create_signal(false);
    let create_user = move |ev: SubmitEvent| {
        ev.prevent_default();
        let user = NewUser {
            username: username.get_untracked().trim().to_owned(),
            email: email.get_untracked().trim().to_owned(),
            password: password.get_untracked(),
            is_admin: is_admin.get_untracked(),
        };
        let client = client.get_value();
        spawn_local(async move {
            match client.admin_create_user(&user).await {
                Ok(()) => {
                    toasts.show("User created");
                    set_username.set(String::new());
                    set_email.set(String::new());
                    set_password.set(String::new());
                    set_is_admin.set(false);
                    refresh();
                }
                Err(err) => report(toasts, &err, "Create failed"),
            }
        });
    };

    view! {
        <main class="admin">
            <h1>"Admin"</h1>
            <section class="admin-panel">
                <h2>"Users"</h2>
                <div id="users-list">
                    <Suspense fallback=move || {
                        view! { <Loading text="Loading users..." /> }
                    }>
                        {move || {
                            users
                                .get()
                                .map(|users| match users {
                                    None => view! { <p>"Failed to load users"</p> }.into_view(),
                                    Some(users) if users.is_empty() => {
                                        view! { <p>"No users"</p> }.into_view()
                                    }
                                    Some(users) => {
                                        users
                                            .into_iter()
                                            .map(|user| {
                                                let label = user_label(&user);
                                                let actions = user
                                                    .id
                                                    .map(|id| {
                                                        view! {
                                                            <button
                                                                class="btn"
                                                                on:click=move |_: MouseEvent| toggle_admin(id)
                                                            >
                                                                "Toggle admin"
                                                            </button>
                                                            <button
                                                                class="btn"
                                                                on:click=move |_: MouseEvent| delete(id)
                                                            >
                                                                "Delete"
                                                            </button>
                                                        }
                                                    });
                                                view! {
                                                    <div class="list-item">
                                                        <div>{label}</div>
                                                        <div>{actions}</div>
                                                    </div>
                                                }
                                            })
                                            .collect_view()
                                    }
                                })
                        }}
                    </Suspense>
                </div>
            </section>
            <section class="admin-panel">
                <h2>"Conversations"</h2>
                <div id="convos-list">
                    <Suspense fallback=move || {
                        view! { <Loading text="Loading convos..." /> }
                    }>
                        {move || {
                            conversations
                                .get()
                                .map(|state| match state {
                                    None => view! { <p>"Failed to load convos"</p> }.into_view(),
                                    Some(SavedChats::Chats(chats)) => {
                                        chats.into_iter().map(conversation_row).collect_view()
                                    }
                                    Some(_) => view! { <p>"No saved conversations"</p> }.into_view(),
                                })
                        }}
                    </Suspense>
                </div>
            </section>
            <section class="admin-panel">
                <h2>"Create user"</h2>
                <form on:submit=create_user>
                    <input
                        id="new-username"
                        type="text"
                        placeholder="Username"
                        on:input=move |ev| set_username.set(event_target_value(&ev))
                        prop:value=username
                    />
                    <input
                        id="new-email"
                        type="email"
                        placeholder="Email"
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                        prop:value=email
                    />
                    <input
                        id="new-password"
                        type="password"
                        placeholder="Password"
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                        prop:value=password
                    />
                    <label>
                        <input
                            id="new-is-admin"
                            type="checkbox"
                            on:change=move |ev| set_is_admin.set(event_target_checked(&ev))
                            prop:checked=is_admin
                        />
                        " Admin"
                    </label>
                    <button id="create-user" type="submit" class="btn">
                        "Create"
                    </button>
                </form>
            </section>
            <ToastStack toasts />
        </main>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_are_marked() {
        let mut user = AdminUser {
            id: Some(1),
            username: "asha".to_owned(),
            email: None,
            is_admin: true,
            created_at: None,
        };
        assert_eq!(user_label(&user), "asha (admin)");
        user.is_admin = false;
        assert_eq!(user_label(&user), "asha");
    }

    #[test]
    fn history_page_escapes_content() {
        let messages = vec![Message {
            role: crate::state::Role::User,
            content: "<b>hi</b>".into(),
            timestamp: "09:00".into(),
        }];
        let (title, body) = history_page(5, &messages).unwrap();
        assert_eq!(title, "Conversation 5");
        assert!(body.starts_with("<pre "));
        assert!(body.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(body.contains("&quot;role&quot;: &quot;user&quot;"));
        assert!(!body.contains("<b>"));
    }

    #[test]
    fn conversation_list_states() {
        let chats = vec![ChatSummary {
            id: 3,
            title: "Sunday".into(),
            created_at: None,
        }];
        assert!(matches!(SavedChats::from(chats), SavedChats::Chats(chats) if chats[0].id == 3));
        assert_eq!(SavedChats::from(vec![]), SavedChats::Empty);
    }
}
