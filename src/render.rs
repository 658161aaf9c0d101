use crate::state::{ChatSummary, Message, Role};
use pulldown_cmark_escape::escape_html;

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut escaped, text);
    escaped
}

/// Drops Markdown emphasis markers; the rest of the text stays literal.
pub fn strip_emphasis(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '~' | '`'))
        .collect()
}

/// Inner HTML of a message bubble. Both roles render as literal text; bot
/// replies lose their emphasis markers first.
pub fn message_html(message: &Message) -> String {
    match message.role {
        Role::User => escape(&message.content),
        Role::Bot => escape(strip_emphasis(&message.content).trim()),
    }
}

pub fn label(role: Role, persona: &str) -> String {
    match role {
        Role::User => "You".to_owned(),
        Role::Bot => persona.to_owned(),
    }
}

/// Only bot messages get a speak control, and only with a synthesis engine.
pub fn speakable(role: Role, synthesis_supported: bool) -> bool {
    role == Role::Bot && synthesis_supported
}

pub fn typing_text(persona: &str) -> String {
    format!("{persona} is typing...")
}

/// What the saved-chats modal shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SavedChats {
    Loading,
    Empty,
    Chats(Vec<ChatSummary>),
}

impl From<Vec<ChatSummary>> for SavedChats {
    fn from(chats: Vec<ChatSummary>) -> Self {
        if chats.is_empty() {
            SavedChats::Empty
        } else {
            SavedChats::Chats(chats)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::parse_saved_list;
    use serde_json::json;

    #[test]
    fn user_text_is_escaped() {
        let message = Message::user(r#"<img src=x onerror="alert(1)"> & co"#);
        let html = message_html(&message);
        assert_eq!(
            html,
            "&lt;img src=x onerror=&quot;alert(1)&quot;&gt; &amp; co"
        );
        assert!(!html.contains('<'));
    }

    #[test]
    fn bot_html_is_text() {
        let html = message_html(&Message::bot("Try <b>this</b> & <script>alert(1)</script>"));
        assert_eq!(
            html,
            "Try &lt;b&gt;this&lt;/b&gt; &amp; &lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn bot_entities_stay_literal() {
        let html = message_html(&Message::bot("Type &lt;b&gt; or a\\*b"));
        assert_eq!(html, "Type &amp;lt;b&amp;gt; or a\\b");
    }

    #[test]
    fn bot_emphasis_is_stripped() {
        let html = message_html(&Message::bot("take a **deep** breath, ~slowly~ `now`"));
        assert_eq!(html, "take a deep breath, slowly now");
        let html = message_html(&Message::user("**as typed**"));
        assert_eq!(html, "**as typed**");
    }

    #[test]
    fn labels() {
        assert_eq!(label(Role::User, "Mira"), "You");
        assert_eq!(label(Role::Bot, "Mira"), "Mira");
        assert_eq!(typing_text("Mira"), "Mira is typing...");
    }

    #[test]
    fn speak_control_needs_synthesis() {
        assert!(speakable(Role::Bot, true));
        assert!(!speakable(Role::Bot, false));
        assert!(!speakable(Role::User, true));
    }

    #[test]
    fn saved_chats_empty_state() {
        let saved = SavedChats::from(parse_saved_list(&json!({ "ok": false })));
        assert_eq!(saved, SavedChats::Empty);
        let saved = SavedChats::from(parse_saved_list(&json!({
            "ok": true,
            "chats": [{ "id": 1, "title": "First" }]
        })));
        assert!(matches!(saved, SavedChats::Chats(chats) if chats[0].title == "First"));
    }
}
