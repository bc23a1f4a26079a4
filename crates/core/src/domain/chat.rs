// Chat Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Persona the assistant speaks with
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Support,
    Analysis,
    Practice,
}

impl ChatMode {
    pub const ALL: [ChatMode; 3] = [ChatMode::Support, ChatMode::Analysis, ChatMode::Practice];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Support => "support",
            ChatMode::Analysis => "analysis",
            ChatMode::Practice => "practice",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "support" => Ok(ChatMode::Support),
            "analysis" => Ok(ChatMode::Analysis),
            "practice" => Ok(ChatMode::Practice),
            other => Err(DomainError::Unsupported(format!("chat mode '{}'", other))),
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation language (Russian is the product default)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            other => Err(DomainError::Unsupported(format!("language '{}'", other))),
        }
    }

    /// Guess the language of free text by script.
    ///
    /// Russian wins only when Cyrillic letters outnumber ASCII letters.
    pub fn detect(text: &str) -> Self {
        let mut cyrillic = 0usize;
        let mut latin = 0usize;
        for c in text.chars() {
            if ('\u{0400}'..='\u{04FF}').contains(&c) {
                cyrillic += 1;
            } else if c.is_ascii_alphabetic() {
                latin += 1;
            }
        }
        if cyrillic > latin && cyrillic > 0 {
            Language::Ru
        } else {
            Language::En
        }
    }

    /// An explicit Russian request is honoured, anything else follows the text
    pub fn resolve(requested: Language, text: &str) -> Self {
        match requested {
            Language::Ru => Language::Ru,
            Language::En => Language::detect(text),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(DomainError::Unsupported(format!("role '{}'", other))),
        }
    }
}

/// A single chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>, // epoch ms
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
