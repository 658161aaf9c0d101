use crate::error::{Error, Result};

/// Handle on a speech recognition engine.
pub trait Recognizer {
    fn start(&self) -> Result<()>;
    fn stop(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub transcript: String,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    Result {
        result_index: usize,
        results: Vec<Hypothesis>,
    },
    Error(String),
    Ended,
}

/// What the page should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEffect {
    None,
    SetInput(String),
    Submit(String),
    Notice(String),
}

/// Final text when any result is final, otherwise the interim text.
pub fn assemble(result_index: usize, results: &[Hypothesis]) -> String {
    let mut interim = String::new();
    let mut finished = String::new();
    for result in results.iter().skip(result_index) {
        if result.is_final {
            finished.push_str(&result.transcript);
        } else {
            interim.push_str(&result.transcript);
        }
    }
    if finished.is_empty() {
        interim
    } else {
        finished
    }
}

/// Voice capture toggle around an optional recognizer.
pub struct VoiceInput<R> {
    recognizer: Option<R>,
    listening: bool,
    captured: String,
}

impl<R: Recognizer> VoiceInput<R> {
    pub fn new(recognizer: Option<R>) -> Self {
        Self {
            recognizer,
            listening: false,
            captured: String::new(),
        }
    }

    pub fn supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn listening(&self) -> bool {
        self.listening
    }

    /// Starts capture, or stops the capture in progress.
    pub fn toggle(&mut self) -> Result<()> {
        let Some(recognizer) = &self.recognizer else {
            return Err(Error::Unsupported("Speech recognition"));
        };
        if self.listening {
            recognizer.stop();
            return Ok(());
        }
        self.captured.clear();
        recognizer.start()?;
        self.listening = true;
        Ok(())
    }

    pub fn handle(&mut self, event: RecognitionEvent) -> InputEffect {
        match event {
            RecognitionEvent::Started => {
                self.listening = true;
                InputEffect::None
            }
            RecognitionEvent::Result {
                result_index,
                results,
            } => {
                self.captured = assemble(result_index, &results);
                InputEffect::SetInput(self.captured.clone())
            }
            RecognitionEvent::Error(code) => {
                if let Some(recognizer) = &self.recognizer {
                    if self.listening {
                        recognizer.stop();
                    }
                }
                self.listening = false;
                self.captured.clear();
                InputEffect::Notice(format!("⚠️ Voice input stopped ({code})."))
            }
            RecognitionEvent::Ended => {
                let was_listening = std::mem::replace(&mut self.listening, false);
                let captured = std::mem::take(&mut self.captured);
                let captured = captured.trim();
                if was_listening && !captured.is_empty() {
                    InputEffect::Submit(captured.to_owned())
                } else {
                    InputEffect::None
                }
            }
        }
    }
}
