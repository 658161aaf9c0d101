use crate::config::FALLBACK_REPLY;
use crate::error::{Error, Result};
use crate::state::{AdminUser, ChatSummary, Message, ReplyAction};
use leptos::logging::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// One JSON request/response exchange with the backend.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }
}

impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self
            .base
            .join(path)
            .map_err(|_| Error::Malformed("endpoint url"))?;
        let builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = match body {
            Some(body) => builder.json(&body),
            None => builder,
        };
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default, deserialize_with = "lenient_action")]
    pub action: Option<ReplyAction>,
}

impl ChatReply {
    fn fallback() -> Self {
        Self {
            reply: FALLBACK_REPLY.to_owned(),
            action: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Never fails: any transport or parse error turns into the fallback reply.
    pub async fn send_message(&self, text: &str) -> ChatReply {
        let reply = self
            .transport
            .request(Method::Post, "chat", Some(json!({ "message": text })))
            .await
            .and_then(|value| Ok(serde_json::from_value::<ChatReply>(value)?));
        match reply {
            Ok(reply) => reply,
            Err(err) => {
                error!("Chat request failed: {err}");
                ChatReply::fallback()
            }
        }
    }

    pub async fn reset_session(&self) -> Result<()> {
        self.transport
            .request(Method::Get, "reset_session", None)
            .await?;
        Ok(())
    }

    /// The unsaved, in-progress session the backend keeps for this user.
    pub async fn current_session(&self) -> Result<Vec<Message>> {
        let value = self
            .transport
            .request(Method::Get, "get_current_session", None)
            .await?;
        match value {
            Value::Array(entries) => Ok(parse_entries(&entries)),
            Value::Null => Ok(vec![]),
            _ => Err(Error::Malformed("session history is not a list")),
        }
    }

    /// `exchanged` is the number of user/bot messages currently shown.
    pub async fn save_conversation(&self, title: &str, exchanged: usize) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Enter a title for your chat!"));
        }
        if exchanged == 0 {
            return Err(Error::Validation("Cannot save empty chat."));
        }
        let value = self
            .transport
            .request(
                Method::Post,
                "save_conversation",
                Some(json!({ "title": title })),
            )
            .await?;
        ensure_ok(&value)
    }

    pub async fn list_conversations(&self) -> Result<Vec<ChatSummary>> {
        let value = self
            .transport
            .request(Method::Get, "get_conversations", None)
            .await?;
        Ok(parse_saved_list(&value))
    }

    pub async fn load_conversation(&self, id: u32) -> Result<Vec<Message>> {
        let value = self
            .transport
            .request(Method::Get, &format!("load_conversation/{id}"), None)
            .await?;
        parse_history(&value)
    }

    pub async fn delete_conversation(&self, id: u32) -> Result<()> {
        let value = self
            .transport
            .request(Method::Delete, &format!("delete_conversation/{id}"), None)
            .await?;
        match value.get("status").and_then(Value::as_str) {
            Some("failed") => Err(rejection(&value, "Failed to delete chat.")),
            _ => Ok(()),
        }
    }

    /// Returns `false` without a request when the new title is blank.
    pub async fn rename_conversation(&self, id: u32, title: &str) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        let value = self
            .transport
            .request(
                Method::Post,
                &format!("rename_conversation/{id}"),
                Some(json!({ "title": title })),
            )
            .await?;
        ensure_ok(&value)?;
        Ok(true)
    }

    /// Canonical history of the active conversation, as raw backend entries.
    pub async fn current_conversation(&self) -> Result<Vec<Value>> {
        let value = self
            .transport
            .request(Method::Get, "get_current_conversation", None)
            .await?;
        if !is_ok(&value) {
            if let Some(message) = value.get("message").and_then(Value::as_str) {
                warn!("Nothing to export: {message}");
            }
            return Err(Error::Validation("No chat to export."));
        }
        match value.get("history") {
            Some(Value::Array(entries)) if !entries.is_empty() => Ok(entries.clone()),
            Some(Value::Array(_)) => Err(Error::Validation("No chat to export.")),
            _ => Err(Error::Malformed("history is not a list")),
        }
    }

    pub async fn admin_users(&self) -> Result<Vec<AdminUser>> {
        let value = self
            .transport
            .request(Method::Get, "admin/users", None)
            .await?;
        match value {
            Value::Array(_) => Ok(serde_json::from_value(value)?),
            _ => Err(Error::Malformed("user list is not a list")),
        }
    }

    pub async fn admin_create_user(&self, user: &NewUser) -> Result<()> {
        if (user.username.trim().is_empty() && user.email.trim().is_empty())
            || user.password.is_empty()
        {
            return Err(Error::Validation("username & password required"));
        }
        let body = serde_json::to_value(user)?;
        let value = self
            .transport
            .request(Method::Post, "admin/create_user", Some(body))
            .await?;
        ensure_status(&value, "Create failed")
    }

    pub async fn admin_delete_user(&self, id: u32) -> Result<()> {
        let value = self
            .transport
            .request(Method::Delete, &format!("admin/delete_user/{id}"), None)
            .await?;
        ensure_status(&value, "Delete failed")
    }

    /// Returns the user's new admin flag.
    pub async fn admin_toggle_admin(&self, id: u32) -> Result<bool> {
        let value = self
            .transport
            .request(Method::Post, &format!("admin/toggle_admin/{id}"), None)
            .await?;
        ensure_status(&value, "Update failed")?;
        value
            .get("is_admin")
            .and_then(Value::as_bool)
            .ok_or(Error::Malformed("missing is_admin"))
    }
}

/// Error statuses still carry the backend's `{message}` when it has one.
pub fn status_error(status: u16, body: &str) -> Error {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(|message| Error::Rejected(message.to_owned()))
        .unwrap_or(Error::Status(status))
}

fn is_ok(value: &Value) -> bool {
    value.get("ok").and_then(Value::as_bool) == Some(true)
}

fn rejection(value: &Value, default: &str) -> Error {
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(default);
    Error::Rejected(message.to_owned())
}

fn ensure_ok(value: &Value) -> Result<()> {
    if is_ok(value) {
        Ok(())
    } else {
        Err(rejection(value, "Request failed"))
    }
}

fn ensure_status(value: &Value, default: &str) -> Result<()> {
    match value.get("status").and_then(Value::as_str) {
        Some("ok") => Ok(()),
        _ => Err(rejection(value, default)),
    }
}

/// `{ok: true, history: [...]}`; anything else is a failure.
pub fn parse_history(value: &Value) -> Result<Vec<Message>> {
    if value.get("ok").is_none() {
        return Err(Error::Malformed("missing ok flag"));
    }
    if !is_ok(value) {
        return Err(rejection(value, "Failed to load conversation."));
    }
    match value.get("history") {
        Some(Value::Array(entries)) => Ok(parse_entries(entries)),
        _ => Err(Error::Malformed("history is not a list")),
    }
}

/// Entries that are not messages are skipped, order is kept.
pub fn parse_entries(entries: &[Value]) -> Vec<Message> {
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<Message>(entry.clone()) {
            Ok(message) => Some(message),
            Err(err) => {
                warn!("Skipping history entry {entry}: {err}");
                None
            }
        })
        .collect()
}

/// `{ok, chats}`; a falsy `ok` or non-list `chats` is the empty list.
pub fn parse_saved_list(value: &Value) -> Vec<ChatSummary> {
    if !is_ok(value) {
        return vec![];
    }
    match value.get("chats") {
        Some(Value::Array(chats)) => chats
            .iter()
            .filter_map(|chat| serde_json::from_value(chat.clone()).ok())
            .collect(),
        _ => vec![],
    }
}

fn lenient_action<'de, D>(deserializer: D) -> std::result::Result<Option<ReplyAction>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

#[cfg(test)]
pub mod testing {
    use super::{Method, Transport};
    use crate::error::{Error, Result};
    use serde_json::Value;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records every request.
    #[derive(Default)]
    pub struct FakeTransport {
        pub calls: RefCell<Vec<(Method, String, Option<Value>)>>,
        responses: RefCell<VecDeque<Result<Value>>>,
    }

    impl FakeTransport {
        pub fn with(responses: Vec<Result<Value>>) -> Self {
            Self {
                calls: RefCell::new(vec![]),
                responses: RefCell::new(responses.into()),
            }
        }

        pub fn paths(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|(_, path, _)| path.clone())
                .collect()
        }
    }

    impl Transport for FakeTransport {
        async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
            self.calls
                .borrow_mut()
                .push((method, path.to_owned(), body));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(Error::Status(500)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use crate::state::Role;
    use futures::executor::block_on;

    #[test]
    fn chat_failure_falls_back() {
        let client = Client::new(FakeTransport::with(vec![Err(Error::Status(502))]));
        let reply = block_on(client.send_message("hello"));
        assert_eq!(reply.reply, FALLBACK_REPLY);

        let client = Client::new(FakeTransport::with(vec![Ok(json!({ "oops": true }))]));
        let reply = block_on(client.send_message("hello"));
        assert_eq!(reply.reply, FALLBACK_REPLY);
    }

    #[test]
    fn chat_reply_with_unknown_action() {
        let client = Client::new(FakeTransport::with(vec![Ok(json!({
            "reply": "I'm listening.",
            "action": { "type": "something_new" }
        }))]));
        let reply = block_on(client.send_message("hello"));
        assert_eq!(reply.reply, "I'm listening.");
        assert_eq!(reply.action, None);
        let calls = client.transport.calls.borrow();
        assert_eq!(calls[0].0, Method::Post);
        assert_eq!(calls[0].2, Some(json!({ "message": "hello" })));
    }

    #[test]
    fn save_rejected_locally() {
        let client = Client::new(FakeTransport::default());
        let err = block_on(client.save_conversation("   ", 4)).unwrap_err();
        assert!(matches!(err, Error::Validation("Enter a title for your chat!")));
        let err = block_on(client.save_conversation("Monday", 0)).unwrap_err();
        assert!(matches!(err, Error::Validation("Cannot save empty chat.")));
        assert!(client.transport.calls.borrow().is_empty());
    }

    #[test]
    fn save_backend_rejection() {
        let client = Client::new(FakeTransport::with(vec![Ok(json!({
            "ok": false,
            "message": "Nothing to save yet"
        }))]));
        let err = block_on(client.save_conversation("Monday", 2)).unwrap_err();
        assert_eq!(err.to_string(), "Nothing to save yet");
        assert_eq!(client.transport.paths(), vec!["save_conversation"]);
    }

    #[test]
    fn load_in_order() {
        let client = Client::new(FakeTransport::with(vec![Ok(json!({
            "ok": true,
            "history": [
                { "role": "user", "content": "hi" },
                { "role": "bot", "content": "hello" }
            ]
        }))]));
        let messages = block_on(client.load_conversation(5)).unwrap();
        assert_eq!(client.transport.paths(), vec!["load_conversation/5"]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[1].role, Role::Bot);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn load_malformed() {
        assert!(parse_history(&json!({ "ok": false, "message": "Chat not found" })).is_err());
        assert!(parse_history(&json!({ "ok": true })).is_err());
        assert!(parse_history(&json!({ "ok": true, "history": "nope" })).is_err());
        assert!(parse_history(&json!({ "history": [] })).is_err());
        assert!(parse_history(&json!([{ "role": "user", "content": "hi" }])).is_err());
    }

    #[test]
    fn load_skips_bad_entries() {
        let messages = parse_history(&json!({
            "ok": true,
            "history": [
                { "role": "user", "content": "hi" },
                { "content": "no role" },
                { "role": "model", "content": "hello" }
            ]
        }))
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Bot);
    }

    #[test]
    fn saved_list_states() {
        let chats = parse_saved_list(&json!({
            "ok": true,
            "chats": [
                { "id": 9, "title": "Late night", "created_at": "2024-03-01 22:10:00" },
                { "id": 4, "title": "Work" }
            ]
        }));
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, 9);
        assert_eq!(chats[1].title, "Work");
        assert!(parse_saved_list(&json!({ "ok": true, "chats": [] })).is_empty());
        assert!(parse_saved_list(&json!({ "ok": false, "chats": [{ "id": 1, "title": "x" }] })).is_empty());
        assert!(parse_saved_list(&json!({ "ok": true, "chats": {} })).is_empty());
    }

    #[test]
    fn rename_blank_is_noop() {
        let client = Client::new(FakeTransport::default());
        assert!(!block_on(client.rename_conversation(3, "  ")).unwrap());
        assert!(client.transport.calls.borrow().is_empty());
    }

    #[test]
    fn rename_and_delete() {
        let client = Client::new(FakeTransport::with(vec![
            Ok(json!({ "ok": true, "message": "Chat renamed" })),
            Ok(json!({ "status": "deleted" })),
            Ok(json!({ "status": "failed" })),
        ]));
        assert!(block_on(client.rename_conversation(3, " Sunday ")).unwrap());
        block_on(client.delete_conversation(3)).unwrap();
        assert!(block_on(client.delete_conversation(3)).is_err());
        let calls = client.transport.calls.borrow();
        assert_eq!(calls[0].2, Some(json!({ "title": "Sunday" })));
        assert_eq!(calls[1].0, Method::Delete);
        assert_eq!(calls[1].1, "delete_conversation/3");
    }

    #[test]
    fn export_needs_history() {
        let client = Client::new(FakeTransport::with(vec![
            Ok(json!({ "ok": false, "message": "Nothing to export" })),
            Ok(json!({ "ok": true, "history": [] })),
            Ok(json!({ "ok": true, "history": [{ "role": "user", "content": "hi", "ts": "2024-03-01 09:00:00" }] })),
        ]));
        assert!(matches!(
            block_on(client.current_conversation()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            block_on(client.current_conversation()),
            Err(Error::Validation(_))
        ));
        let history = block_on(client.current_conversation()).unwrap();
        assert_eq!(history[0]["ts"], "2024-03-01 09:00:00");
    }

    #[test]
    fn admin_create_validation() {
        let client = Client::new(FakeTransport::with(vec![Ok(json!({
            "status": "failed",
            "message": "username or email already exists"
        }))]));
        let mut user = NewUser {
            username: String::new(),
            email: String::new(),
            password: "secret".into(),
            is_admin: false,
        };
        assert!(matches!(
            block_on(client.admin_create_user(&user)),
            Err(Error::Validation(_))
        ));
        user.email = "sam@example.com".into();
        let err = block_on(client.admin_create_user(&user)).unwrap_err();
        assert_eq!(err.to_string(), "username or email already exists");
        assert_eq!(client.transport.paths(), vec!["admin/create_user"]);
    }

    #[test]
    fn admin_toggle() {
        let client = Client::new(FakeTransport::with(vec![Ok(json!({
            "status": "ok",
            "is_admin": true
        }))]));
        assert!(block_on(client.admin_toggle_admin(2)).unwrap());
    }

    #[test]
    fn error_status_keeps_backend_message() {
        let err = status_error(
            400,
            r#"{"status":"failed","message":"username or email already exists"}"#,
        );
        assert!(matches!(&err, Error::Rejected(message) if message == "username or email already exists"));
        assert!(matches!(status_error(502, "<html>Bad gateway</html>"), Error::Status(502)));
        assert!(matches!(status_error(404, r#"{"message":"  "}"#), Error::Status(404)));
    }

    #[test]
    fn admin_create_rejected_with_400() {
        let client = Client::new(FakeTransport::with(vec![Err(status_error(
            400,
            r#"{"status":"failed","message":"username or email already exists"}"#,
        ))]));
        let user = NewUser {
            username: "sam".into(),
            email: String::new(),
            password: "secret".into(),
            is_admin: false,
        };
        let err = block_on(client.admin_create_user(&user)).unwrap_err();
        assert_eq!(err.to_string(), "username or email already exists");
    }

    #[test]
    fn delete_rejected_with_error_status() {
        let client = Client::new(FakeTransport::with(vec![Err(status_error(
            403,
            r#"{"status":"failed","message":"Not allowed"}"#,
        ))]));
        let err = block_on(client.delete_conversation(4)).unwrap_err();
        assert!(matches!(err, Error::Rejected(message) if message == "Not allowed"));
    }
}
