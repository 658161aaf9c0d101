use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "model", alias = "assistant")]
    Bot,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(
        default = "display_now",
        alias = "ts",
        deserialize_with = "display_timestamp"
    )]
    pub timestamp: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: display_now(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            timestamp: display_now(),
        }
    }
}

/// A saved conversation as listed by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatSummary {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CrisisResource {
    pub label: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Structured hint the backend may attach to a reply.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyAction {
    Crisis {
        #[serde(default)]
        resources: Vec<CrisisResource>,
    },
    InlineBreathing {
        #[serde(default)]
        severity_hint: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminUser {
    #[serde(default)]
    pub id: Option<u32>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn body_class(self) -> &'static str {
        match self {
            Theme::Dark => "dark-theme",
            Theme::Light => "light-theme",
        }
    }

    pub fn particle_color(self) -> &'static str {
        match self {
            Theme::Dark => "#8ab4f8",
            Theme::Light => "#6078ea",
        }
    }
}

pub fn display_now() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Backend timestamps come as `%Y-%m-%d %H:%M:%S`; older transcripts already
/// carry a display string.
pub fn display_time(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S") {
        Ok(parsed) => parsed.format("%H:%M").to_string(),
        Err(_) if raw.trim().is_empty() => display_now(),
        Err(_) => raw.trim().to_owned(),
    }
}

fn display_timestamp<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|raw| display_time(&raw)).unwrap_or_else(display_now))
}
