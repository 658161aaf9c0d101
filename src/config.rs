use leptos::window;
use url::Url;
use wasm_bindgen::JsCast;

pub const DEFAULT_PERSONA: &str = "Theramind";
pub const GREETING: &str = "Hello! I'm here for you. How are you feeling today?";
pub const FALLBACK_REPLY: &str = "⚠️ Something went wrong. Try again.";

const API_BASE_META: &str = "meta[name='theramind-api-base']";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base: Url,
    /// Viewport width (px) below which the sidebar becomes an overlay.
    pub sidebar_breakpoint: f64,
    pub toast_ms: u64,
}

impl Config {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            sidebar_breakpoint: 768.0,
            toast_ms: 3000,
        }
    }

    /// Page origin unless a `theramind-api-base` meta tag points elsewhere.
    pub fn from_page() -> crate::error::Result<Self> {
        let location = window().location();
        let origin = location.origin()?;
        let base = window()
            .document()
            .and_then(|document| document.query_selector(API_BASE_META).ok().flatten())
            .and_then(|element| element.dyn_into::<web_sys::HtmlMetaElement>().ok())
            .map(|meta| meta.content())
            .filter(|content| !content.trim().is_empty())
            .unwrap_or(origin);
        Ok(Self::new(parse_base(&base)?))
    }
}

/// Joining relative endpoints requires a trailing slash on the base.
pub fn parse_base(raw: &str) -> crate::error::Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|_| crate::error::Error::Validation("Invalid API base url"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_trailing_slash() {
        let base = parse_base("https://theramind.example/app").unwrap();
        assert_eq!(base.as_str(), "https://theramind.example/app/");
        assert_eq!(
            base.join("chat").unwrap().as_str(),
            "https://theramind.example/app/chat"
        );
    }

    #[test]
    fn invalid_base() {
        assert!(parse_base("not a url").is_err());
    }
}
