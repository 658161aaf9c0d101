use crate::api::ChatReply;
use crate::config::GREETING;
use crate::error::Result;
use crate::state::{Message, ReplyAction};

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: u64,
    pub message: Message,
    pub action: Option<ReplyAction>,
    /// Local greeting, not part of the backend history.
    pub greeting: bool,
}

/// Issued when a message is sent; redeemed by [`Transcript::receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSend {
    epoch: u64,
    entry: u64,
}

/// Ties a load or session restore to the view it was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
}

/// Monotonic ticket counter: only the most recently issued ticket is current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequence(u64);

impl Sequence {
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0 == ticket
    }
}

/// The messages of the conversation currently on screen.
///
/// Every replacement of the view (new chat, load) starts a new epoch; replies,
/// loads and restores issued under an older epoch are dropped when they resolve.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
    epoch: Sequence,
    pending: Vec<u64>,
    active: Option<u32>,
}

impl Transcript {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of real user/bot messages, greeting excluded.
    pub fn exchanged(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.greeting).count()
    }

    /// At most one typing indicator, shown while any send is in flight.
    pub fn typing(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn active(&self) -> Option<u32> {
        self.active
    }

    fn push(&mut self, message: Message, action: Option<ReplyAction>, greeting: bool) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Entry {
            id,
            message,
            action,
            greeting,
        });
        id
    }

    fn replace_view(&mut self) -> u64 {
        self.entries.clear();
        self.pending.clear();
        self.epoch.next()
    }

    /// Appends the user's message. Blank input is rejected.
    pub fn submit(&mut self, text: &str) -> Option<(PendingSend, String)> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let entry = self.push(Message::user(text), None, false);
        self.pending.push(entry);
        let pending = PendingSend {
            epoch: self.epoch.0,
            entry,
        };
        Some((pending, text.to_owned()))
    }

    /// Places the reply right after the message that asked for it. Returns
    /// the id of the new entry, or `None` if the view changed meanwhile.
    pub fn receive(&mut self, pending: PendingSend, reply: ChatReply) -> Option<u64> {
        if !self.epoch.is_current(pending.epoch) {
            return None;
        }
        self.pending.retain(|entry| *entry != pending.entry);
        let position = self
            .entries
            .iter()
            .position(|entry| entry.id == pending.entry)
            .map(|index| index + 1)
            .unwrap_or(self.entries.len());
        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(
            position,
            Entry {
                id,
                message: Message::bot(reply.reply),
                action: reply.action,
                greeting: false,
            },
        );
        Some(id)
    }

    /// Fresh session: empty view with the greeting.
    pub fn reset(&mut self) {
        self.replace_view();
        self.active = None;
        self.push(Message::bot(GREETING), None, true);
    }

    /// Taken when the session request goes out; the view is left as is.
    pub fn begin_restore(&self) -> LoadTicket {
        LoadTicket {
            epoch: self.epoch.0,
        }
    }

    /// Shows the backend's in-progress session, or keeps the greeting when it
    /// is empty. Ignored once the user has started talking or the view was
    /// replaced since `ticket` was taken.
    pub fn restore(&mut self, ticket: LoadTicket, messages: Vec<Message>) -> bool {
        if !self.epoch.is_current(ticket.epoch) || self.exchanged() > 0 {
            return false;
        }
        if messages.is_empty() {
            return true;
        }
        self.entries.clear();
        for message in messages {
            self.push(message, None, false);
        }
        true
    }

    /// Clears the view before the fetch goes out.
    pub fn begin_load(&mut self, id: u32) -> LoadTicket {
        let epoch = self.replace_view();
        self.active = Some(id);
        LoadTicket { epoch }
    }

    /// On failure the view stays empty and the error is handed back for
    /// reporting. `Ok(false)` means a newer view superseded this load.
    pub fn finish_load(&mut self, ticket: LoadTicket, loaded: Result<Vec<Message>>) -> Result<bool> {
        if !self.epoch.is_current(ticket.epoch) {
            return Ok(false);
        }
        match loaded {
            Ok(messages) => {
                for message in messages {
                    self.push(message, None, false);
                }
                Ok(true)
            }
            Err(err) => {
                self.active = None;
                Err(err)
            }
        }
    }

    pub fn find(&self, id: u64) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::state::Role;

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            reply: text.to_owned(),
            action: None,
        }
    }

    fn contents(transcript: &Transcript) -> Vec<&str> {
        transcript
            .entries()
            .iter()
            .map(|entry| entry.message.content.as_str())
            .collect()
    }

    #[test]
    fn blank_submit_is_rejected() {
        let mut transcript = Transcript::default();
        assert!(transcript.submit("   ").is_none());
        assert!(transcript.entries().is_empty());
        assert!(!transcript.typing());
    }

    #[test]
    fn typing_while_pending() {
        let mut transcript = Transcript::default();
        transcript.reset();
        let (first, text) = transcript.submit("  I feel tired ").unwrap();
        assert_eq!(text, "I feel tired");
        let (second, _) = transcript.submit("and anxious").unwrap();
        assert!(transcript.typing());
        transcript.receive(first, reply("That sounds hard.")).unwrap();
        assert!(transcript.typing());
        transcript.receive(second, reply("Tell me more.")).unwrap();
        assert!(!transcript.typing());
        assert_eq!(transcript.exchanged(), 4);
    }

    #[test]
    fn out_of_order_replies_keep_pairs() {
        let mut transcript = Transcript::default();
        let (first, _) = transcript.submit("one").unwrap();
        let (second, _) = transcript.submit("two").unwrap();
        transcript.receive(second, reply("re two")).unwrap();
        transcript.receive(first, reply("re one")).unwrap();
        assert_eq!(contents(&transcript), vec!["one", "re one", "two", "re two"]);
    }

    #[test]
    fn stale_reply_is_dropped() {
        let mut transcript = Transcript::default();
        let (pending, _) = transcript.submit("hello").unwrap();
        transcript.reset();
        assert_eq!(transcript.receive(pending, reply("late")), None);
        assert_eq!(contents(&transcript), vec![GREETING]);
        assert_eq!(transcript.exchanged(), 0);
        assert!(!transcript.typing());
    }

    #[test]
    fn load_replaces_view_in_order() {
        let mut transcript = Transcript::default();
        transcript.reset();
        transcript.submit("old").unwrap();
        let ticket = transcript.begin_load(5);
        assert!(transcript.entries().is_empty());
        let loaded = vec![
            Message {
                role: Role::User,
                content: "hi".into(),
                timestamp: "09:00".into(),
            },
            Message {
                role: Role::Bot,
                content: "hello".into(),
                timestamp: "09:01".into(),
            },
        ];
        assert!(transcript.finish_load(ticket, Ok(loaded)).unwrap());
        assert_eq!(contents(&transcript), vec!["hi", "hello"]);
        assert_eq!(transcript.active(), Some(5));
        assert!(!transcript.typing());
    }

    #[test]
    fn failed_load_leaves_view_empty() {
        let mut transcript = Transcript::default();
        transcript.reset();
        let ticket = transcript.begin_load(5);
        let result = transcript.finish_load(ticket, Err(Error::Malformed("history is not a list")));
        assert!(result.is_err());
        assert!(transcript.entries().is_empty());
        assert_eq!(transcript.active(), None);
    }

    #[test]
    fn superseded_load_is_ignored() {
        let mut transcript = Transcript::default();
        let first = transcript.begin_load(1);
        let second = transcript.begin_load(2);
        let stale = vec![Message::user("from chat one")];
        assert!(!transcript.finish_load(first, Ok(stale)).unwrap());
        assert!(transcript.finish_load(second, Ok(vec![])).unwrap());
        assert!(transcript.entries().is_empty());
        assert_eq!(transcript.active(), Some(2));
    }

    #[test]
    fn restore_empty_session_greets() {
        let mut transcript = Transcript::default();
        transcript.reset();
        let ticket = transcript.begin_restore();
        assert!(transcript.restore(ticket, vec![]));
        assert_eq!(contents(&transcript), vec![GREETING]);
        assert!(transcript.restore(ticket, vec![Message::user("still here")]));
        assert_eq!(contents(&transcript), vec!["still here"]);
    }

    #[test]
    fn restore_after_new_chat_is_dropped() {
        let mut transcript = Transcript::default();
        transcript.reset();
        let ticket = transcript.begin_restore();
        transcript.reset();
        assert!(!transcript.restore(ticket, vec![Message::user("pre-reset session")]));
        assert_eq!(contents(&transcript), vec![GREETING]);
    }

    #[test]
    fn restore_does_not_override_pending_load() {
        let mut transcript = Transcript::default();
        transcript.reset();
        let restore = transcript.begin_restore();
        let load = transcript.begin_load(5);
        assert!(!transcript.restore(restore, vec![Message::user("old session")]));
        let loaded = vec![Message::user("hi"), Message::bot("hello")];
        assert!(transcript.finish_load(load, Ok(loaded)).unwrap());
        assert_eq!(contents(&transcript), vec!["hi", "hello"]);
        assert_eq!(transcript.active(), Some(5));
    }

    #[test]
    fn restore_does_not_clobber_new_messages() {
        let mut transcript = Transcript::default();
        transcript.reset();
        let ticket = transcript.begin_restore();
        transcript.submit("typed before the session arrived").unwrap();
        assert!(!transcript.restore(ticket, vec![Message::user("older")]));
        assert_eq!(
            contents(&transcript),
            vec![GREETING, "typed before the session arrived"]
        );
        assert!(transcript.typing());
    }

    #[test]
    fn sequence_only_latest_is_current() {
        let mut sequence = Sequence::default();
        let first = sequence.next();
        let second = sequence.next();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }
}
