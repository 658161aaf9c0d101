use super::input::{Hypothesis, RecognitionEvent, Recognizer};
use super::output::{SynthesisEngine, Utterance, Voice};
use crate::error::{Error, Result};
use leptos::{queue_microtask, window};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const RECOGNITION_LANG: &str = "en-US";

/// `SpeechRecognition`, or Chrome's prefixed `webkitSpeechRecognition`.
pub struct BrowserRecognizer {
    recognition: web_sys::SpeechRecognition,
    _handlers: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl BrowserRecognizer {
    pub fn new<F>(on_event: F) -> Result<Self>
    where
        F: Fn(RecognitionEvent) + 'static,
    {
        let window = window();
        let constructor = ["SpeechRecognition", "webkitSpeechRecognition"]
            .iter()
            .filter_map(|name| js_sys::Reflect::get(&window, &JsValue::from_str(name)).ok())
            .find(|constructor| constructor.is_function())
            .ok_or(Error::Unsupported("Speech recognition"))?;
        let constructor = constructor.unchecked_ref::<js_sys::Function>();
        let recognition: web_sys::SpeechRecognition =
            js_sys::Reflect::construct(constructor, &js_sys::Array::new())?.unchecked_into();
        recognition.set_continuous(false);
        recognition.set_interim_results(true);
        recognition.set_lang(RECOGNITION_LANG);

        let on_event = Rc::new(on_event);
        let handler = |map: fn(JsValue) -> RecognitionEvent| {
            let on_event = on_event.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| on_event(map(event)))
        };
        let onstart = handler(|_| RecognitionEvent::Started);
        let onresult = handler(result_event);
        let onerror = handler(error_event);
        let onend = handler(|_| RecognitionEvent::Ended);
        recognition.set_onstart(Some(onstart.as_ref().unchecked_ref()));
        recognition.set_onresult(Some(onresult.as_ref().unchecked_ref()));
        recognition.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        recognition.set_onend(Some(onend.as_ref().unchecked_ref()));

        Ok(Self {
            recognition,
            _handlers: vec![onstart, onresult, onerror, onend],
        })
    }
}

impl Recognizer for BrowserRecognizer {
    fn start(&self) -> Result<()> {
        Ok(self.recognition.start()?)
    }

    fn stop(&self) {
        self.recognition.stop();
    }
}

fn result_event(event: JsValue) -> RecognitionEvent {
    let event: web_sys::SpeechRecognitionEvent = event.unchecked_into();
    let results = event
        .results()
        .map(|list| {
            (0..list.length())
                .filter_map(|index| list.get(index))
                .map(|result| Hypothesis {
                    transcript: result
                        .get(0)
                        .map(|alternative| alternative.transcript())
                        .unwrap_or_default(),
                    is_final: result.is_final(),
                })
                .collect()
        })
        .unwrap_or_default();
    RecognitionEvent::Result {
        result_index: event.result_index() as usize,
        results,
    }
}

fn error_event(event: JsValue) -> RecognitionEvent {
    let code = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
        .ok()
        .and_then(|code| code.as_string())
        .unwrap_or_else(|| "unknown".to_owned());
    RecognitionEvent::Error(code)
}

pub struct BrowserSynthesis {
    synthesis: web_sys::SpeechSynthesis,
    _voices_changed: Closure<dyn FnMut()>,
}

impl BrowserSynthesis {
    pub fn new<F>(on_voices_changed: F) -> Result<Self>
    where
        F: Fn() + 'static,
    {
        let window = window();
        let present = js_sys::Reflect::get(&window, &JsValue::from_str("speechSynthesis"))
            .map(|value| !value.is_undefined() && !value.is_null())
            .unwrap_or(false);
        if !present {
            return Err(Error::Unsupported("Speech synthesis"));
        }
        let synthesis = window.speech_synthesis()?;
        let voices_changed = Closure::<dyn FnMut()>::new(on_voices_changed);
        synthesis.set_onvoiceschanged(Some(voices_changed.as_ref().unchecked_ref()));
        Ok(Self {
            synthesis,
            _voices_changed: voices_changed,
        })
    }

    fn native_voices(&self) -> Vec<web_sys::SpeechSynthesisVoice> {
        self.synthesis
            .get_voices()
            .iter()
            .map(|voice| voice.unchecked_into())
            .collect()
    }
}

impl SynthesisEngine for BrowserSynthesis {
    fn voices(&self) -> Vec<Voice> {
        self.native_voices()
            .iter()
            .map(|voice| Voice {
                name: voice.name(),
                lang: voice.lang(),
            })
            .collect()
    }

    fn speak(&self, utterance: &Utterance, on_end: Box<dyn FnOnce()>) -> Result<()> {
        let native = web_sys::SpeechSynthesisUtterance::new_with_text(&utterance.text)?;
        native.set_lang(utterance.lang);
        native.set_pitch(utterance.pitch);
        native.set_rate(utterance.rate);
        if let Some(voice) = &utterance.voice {
            let found = self
                .native_voices()
                .into_iter()
                .find(|native| native.name() == voice.name);
            native.set_voice(found.as_ref());
        }

        // Engines fire `end` or `error` (cancel fires `error`); report once,
        // outside whatever call triggered it.
        let done = Rc::new(RefCell::new(Some(on_end)));
        let finisher = |done: Rc<RefCell<Option<Box<dyn FnOnce()>>>>| {
            Closure::once_into_js(move || {
                if let Some(on_end) = done.borrow_mut().take() {
                    queue_microtask(on_end);
                }
            })
        };
        native.set_onend(Some(finisher(done.clone()).unchecked_ref()));
        native.set_onerror(Some(finisher(done).unchecked_ref()));
        self.synthesis.speak(&native);
        Ok(())
    }

    fn cancel(&self) {
        self.synthesis.cancel();
    }
}
