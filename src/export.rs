use crate::error::{Error, Result};
use crate::render::label;
use crate::state::Message;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub const JSON_FILE: &str = "chat_export.json";
pub const PDF_FILE: &str = "Theramind_Chat.pdf";

const MARGIN: f64 = 10.0;
const WRAP_WIDTH: f64 = 180.0;
const LINE_HEIGHT: f64 = 6.0;
const MESSAGE_GAP: f64 = 2.0;
const PAGE_BOTTOM: f64 = 280.0;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = jspdf, js_name = jsPDF)]
    type JsPdf;

    #[wasm_bindgen(catch, constructor, js_namespace = jspdf, js_class = "jsPDF")]
    fn new() -> std::result::Result<JsPdf, JsValue>;

    #[wasm_bindgen(method, js_class = "jsPDF", js_name = splitTextToSize)]
    fn split_text_to_size(this: &JsPdf, text: &str, width: f64) -> js_sys::Array;

    #[wasm_bindgen(method, js_class = "jsPDF")]
    fn text(this: &JsPdf, text: &str, x: f64, y: f64);

    #[wasm_bindgen(method, js_class = "jsPDF", js_name = addPage)]
    fn add_page(this: &JsPdf);

    #[wasm_bindgen(method, js_class = "jsPDF")]
    fn save(this: &JsPdf, filename: &str);
}

/// Pretty-printed backend history, as written to the JSON export.
pub fn json_document(history: &[Value]) -> Result<String> {
    Ok(serde_json::to_string_pretty(history)?)
}

pub fn download(filename: &str, contents: &str, mime: &str) -> Result<()> {
    let parts = js_sys::Array::of1(&JsValue::from_str(contents));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;
    let anchor: web_sys::HtmlAnchorElement =
        leptos::document().create_element("a")?.unchecked_into();
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();
    web_sys::Url::revoke_object_url(&url)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum PdfOp {
    Line { text: String, y: f64 },
    NewPage,
}

/// Positions pre-wrapped message lines top to bottom, breaking pages.
pub fn layout(messages: &[Vec<String>]) -> Vec<PdfOp> {
    let mut ops = vec![];
    let mut y = MARGIN;
    for lines in messages {
        for line in lines {
            ops.push(PdfOp::Line {
                text: line.clone(),
                y,
            });
            y += LINE_HEIGHT;
            if y > PAGE_BOTTOM {
                ops.push(PdfOp::NewPage);
                y = MARGIN;
            }
        }
        y += MESSAGE_GAP;
    }
    ops
}

pub fn pdf_text(message: &Message, persona: &str) -> String {
    format!("{}: {}", label(message.role, persona), message.content)
}

pub fn save_pdf(messages: &[Message], persona: &str) -> Result<()> {
    let doc = JsPdf::new().map_err(|_| Error::Unsupported("PDF export"))?;
    let wrapped: Vec<Vec<String>> = messages
        .iter()
        .map(|message| {
            doc.split_text_to_size(&pdf_text(message, persona), WRAP_WIDTH)
                .iter()
                .filter_map(|line| line.as_string())
                .collect()
        })
        .collect();
    for op in layout(&wrapped) {
        match op {
            PdfOp::Line { text, y } => doc.text(&text, MARGIN, y),
            PdfOp::NewPage => doc.add_page(),
        }
    }
    doc.save(PDF_FILE);
    Ok(())
}
