use crate::error::Result;
use crate::render::strip_emphasis;

pub const HINDI: &str = "hi-IN";
pub const ENGLISH: &str = "en-GB";

const PITCH: f32 = 1.05;
const RATE: f32 = 0.95;

/// Substrings of voice names shipped by browsers/OS vendors for female voices.
const FEMALE_MARKERS: &[&str] = &[
    "female", "samantha", "zira", "victoria", "karen", "moira", "tessa", "fiona", "susan",
    "hazel", "heera", "kalpana", "lekha", "veena", "swara",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub lang: &'static str,
    pub voice: Option<Voice>,
    pub pitch: f32,
    pub rate: f32,
}

pub trait SynthesisEngine {
    fn voices(&self) -> Vec<Voice>;
    /// `on_end` fires once the utterance finishes or is cancelled.
    fn speak(&self, utterance: &Utterance, on_end: Box<dyn FnOnce()>) -> Result<()>;
    fn cancel(&self);
}

pub fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

pub fn detect_lang(text: &str) -> &'static str {
    if text.chars().any(is_devanagari) {
        HINDI
    } else {
        ENGLISH
    }
}

pub fn pick_voice<'a>(voices: &'a [Voice], lang: &str) -> Option<&'a Voice> {
    let prefix = lang
        .split('-')
        .next()
        .unwrap_or(lang)
        .to_ascii_lowercase();
    let matching: Vec<&Voice> = voices
        .iter()
        .filter(|voice| voice.lang.to_ascii_lowercase().starts_with(&prefix))
        .collect();
    matching
        .iter()
        .find(|voice| {
            let name = voice.name.to_lowercase();
            FEMALE_MARKERS.iter().any(|marker| name.contains(marker))
        })
        .or_else(|| matching.first())
        .copied()
        .or_else(|| voices.first())
}

/// Drops Markdown emphasis so it is not read aloud.
pub fn speech_text(text: &str) -> String {
    strip_emphasis(text).trim().to_owned()
}

/// Adds pause cues after sentence and clause punctuation.
pub fn with_pauses(text: &str) -> String {
    let mut paced = String::with_capacity(text.len() + text.len() / 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        paced.push(c);
        let followed_by_space = chars.peek().is_some_and(|next| next.is_whitespace());
        if !followed_by_space {
            continue;
        }
        match c {
            '.' | '!' | '?' | '।' => paced.push_str(" ..."),
            ',' | ';' | ':' => paced.push_str(" .."),
            _ => {}
        }
    }
    paced
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Speaking {
    utterance: u64,
    owner: Option<u64>,
}

/// Single utterance slot in front of a synthesis engine.
pub struct VoiceOutput<E> {
    engine: E,
    voices: Vec<Voice>,
    active: Option<Speaking>,
    next_id: u64,
}

impl<E: SynthesisEngine> VoiceOutput<E> {
    pub fn new(engine: E) -> Self {
        let voices = engine.voices();
        Self {
            engine,
            voices,
            active: None,
            next_id: 0,
        }
    }

    /// Engines load their voice list lazily and announce it later.
    pub fn refresh_voices(&mut self) {
        self.voices = self.engine.voices();
    }

    /// Message id whose speech is playing, if any.
    pub fn speaking_owner(&self) -> Option<u64> {
        self.active.and_then(|active| active.owner)
    }

    pub fn utterance(&self, text: &str) -> Utterance {
        let lang = detect_lang(text);
        Utterance {
            id: self.next_id + 1,
            text: with_pauses(&speech_text(text)),
            lang,
            voice: pick_voice(&self.voices, lang).cloned(),
            pitch: PITCH,
            rate: RATE,
        }
    }

    /// Cancels whatever is playing, then speaks `text`. `on_end` receives
    /// the utterance id and should be routed back to [`Self::finish`].
    pub fn speak<F>(&mut self, text: &str, owner: Option<u64>, on_end: F) -> Result<u64>
    where
        F: FnOnce(u64) + 'static,
    {
        self.stop();
        if self.voices.is_empty() {
            self.refresh_voices();
        }
        let utterance = self.utterance(text);
        let id = utterance.id;
        self.next_id = id;
        self.engine.speak(&utterance, Box::new(move || on_end(id)))?;
        self.active = Some(Speaking {
            utterance: id,
            owner,
        });
        Ok(id)
    }

    /// Per-message control: stops that message if it is playing, else plays it.
    pub fn toggle<F>(&mut self, owner: u64, text: &str, on_end: F) -> Result<()>
    where
        F: FnOnce(u64) + 'static,
    {
        if self.speaking_owner() == Some(owner) {
            self.stop();
        } else {
            self.speak(text, Some(owner), on_end)?;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.active.take().is_some() {
            self.engine.cancel();
        }
    }

    /// Returns `true` if `utterance` was the active one.
    pub fn finish(&mut self, utterance: u64) -> bool {
        match self.active {
            Some(active) if active.utterance == utterance => {
                self.active = None;
                true
            }
            _ => false,
        }
    }
}
