// Conversation topics

use crate::domain::chat::{ChatMode, Language};
use serde::{Deserialize, Serialize};

/// Longest topic label kept after extraction (in chars)
pub const MAX_TOPIC_CHARS: usize = 30;

/// Aggregated mention statistics for a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStat {
    pub topic: String,
    pub frequency: i64,
    pub last_mentioned: i64, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ChatMode>,
}

const KEYWORDS: &[&str] = &[
    "стресс", "тревога", "депрессия", "страх", "гнев", "грусть",
    "радость", "любовь", "отношения", "работа", "семья", "друзья",
    "здоровье", "сон", "еда", "спорт", "медитация", "дыхание",
    "мотивация", "уверенность", "самооценка", "цели", "планы",
    "stress", "anxiety", "depression", "fear", "anger", "sadness",
    "joy", "love", "relationships", "work", "family", "friends",
    "health", "sleep", "food", "exercise", "meditation", "breathing",
    "motivation", "confidence", "self-esteem", "goals", "plans",
];

const JUNK_TOPICS: &[&str] = &[
    "none", "нет", "неизвестно", "unknown", "тема:", "topic:", "n/a", "н/д",
];

/// Keyword topics mentioned in a message (case-insensitive substring match)
pub fn keyword_topics(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| k.to_string())
        .collect()
}

/// Topic used when the model gives nothing usable
pub fn fallback_topic(language: Language) -> &'static str {
    match language {
        Language::Ru => "общение",
        Language::En => "communication",
    }
}

/// Topic used for quotes and videos when nothing is known about the user
pub fn default_topic(language: Language) -> &'static str {
    match language {
        Language::Ru => "мотивация",
        Language::En => "motivation",
    }
}

/// Topics pre-filled with articles on startup
pub fn common_topics(language: Language) -> &'static [&'static str] {
    match language {
        Language::Ru => &["стресс", "тревога", "мотивация", "уверенность", "отношения", "здоровье"],
        Language::En => &["stress", "anxiety", "motivation", "confidence", "relationships", "health"],
    }
}

/// Turn a raw model answer into a short topic label.
///
/// Takes the text after the `TOPIC:`/`ТЕМА:` marker, strips quotes and
/// whitespace, truncates to [`MAX_TOPIC_CHARS`] and replaces placeholder
/// answers with [`fallback_topic`].
pub fn normalize_topic(raw: &str, language: Language) -> String {
    let raw = raw.trim();
    let marker = match language {
        Language::En => "TOPIC:",
        Language::Ru => "ТЕМА:",
    };
    let mut topic = match raw.split_once(marker) {
        Some((_, rest)) => rest.trim(),
        None => raw,
    }
    .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
    .to_string();

    if topic.chars().count() > MAX_TOPIC_CHARS {
        topic = topic.chars().take(MAX_TOPIC_CHARS).collect::<String>();
        topic = topic.trim().to_string();
    }

    if topic.is_empty() || JUNK_TOPICS.contains(&topic.to_lowercase().as_str()) {
        return fallback_topic(language).to_string();
    }

    let topic = topic.replace("ТЕМА:", "").replace("TOPIC:", "");
    let topic = topic.trim();
    if topic.is_empty() {
        fallback_topic(language).to_string()
    } else {
        topic.to_string()
    }
}
