// Generated content: articles and quotes

use crate::domain::chat::Language;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Kind of content a generation task produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Quote,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Quote => "quote",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "article" => Ok(ContentType::Article),
            "quote" => Ok(ContentType::Quote),
            other => Err(DomainError::Unsupported(format!("content type '{}'", other))),
        }
    }
}

/// Article flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Approach {
    Practical,
    Theoretical,
    Motivational,
}

impl Approach {
    /// Generation and display order
    pub const ALL: [Approach; 3] = [
        Approach::Practical,
        Approach::Theoretical,
        Approach::Motivational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Approach::Practical => "practical",
            Approach::Theoretical => "theoretical",
            Approach::Motivational => "motivational",
        }
    }

    /// Unknown values fall back to practical (legacy rows carry no approach)
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "theoretical" => Approach::Theoretical,
            "motivational" => Approach::Motivational,
            _ => Approach::Practical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub approach: Approach,
    pub language: Language,
    pub frequency: i64,
    pub source_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl Article {
    pub fn new(
        topic: impl Into<String>,
        approach: Approach,
        language: Language,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let topic = topic.into();
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            source_topics: vec![topic.clone()],
            topic,
            approach,
            language,
            frequency: 1,
            created_at: None,
            is_fallback: false,
        }
    }

    /// Topic the article is grouped under
    pub fn primary_topic(&self) -> &str {
        self.source_topics
            .first()
            .map(String::as_str)
            .unwrap_or(self.topic.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    pub author: String,
    pub topic: String,
    pub language: Language,
    /// Calendar day the quote is shown for (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub is_generated: bool,
}

impl Quote {
    pub fn new(
        text: impl Into<String>,
        author: impl Into<String>,
        topic: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            id: None,
            text: text.into(),
            author: author.into(),
            topic: topic.into(),
            language,
            date: None,
            is_generated: false,
        }
    }

    pub fn on(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Quote shown when nothing else is available
pub fn default_quote(language: Language) -> Quote {
    match language {
        Language::En => Quote::new(
            "Be the change you wish to see in the world",
            "Mahatma Gandhi",
            "motivation",
            language,
        ),
        Language::Ru => Quote::new(
            "Будь изменением, которое ты хочешь видеть в мире",
            "Махатма Ганди",
            "мотивация",
            language,
        ),
    }
}

/// Quotes seeded into an empty database: (text, author, topic)
pub fn seed_quotes(language: Language) -> &'static [(&'static str, &'static str, &'static str)] {
    match language {
        Language::Ru => &[
            ("Будь изменением, которое ты хочешь видеть в мире", "Махатма Ганди", "мотивация"),
            ("Каждый день - это новая возможность стать лучше", "Неизвестный", "мотивация"),
            ("Счастье не в том, чтобы делать всегда, что хочешь, а в том, чтобы всегда хотеть того, что делаешь", "Лев Толстой", "счастье"),
            ("Самое важное - это не то, что с нами происходит, а то, как мы на это реагируем", "Эпиктет", "отношения"),
            ("Успех - это способность шагать от одной неудачи к другой, не теряя энтузиазма", "Уинстон Черчилль", "успех"),
            ("Лучший способ предсказать будущее - создать его", "Питер Друкер", "будущее"),
            ("Ты не можешь контролировать все, что происходит с тобой, но ты можешь контролировать свою реакцию", "Неизвестный", "контроль"),
            ("Каждый опыт, даже негативный, делает тебя сильнее", "Неизвестный", "опыт"),
            ("Вера в себя - это первый шаг к успеху", "Неизвестный", "вера"),
            ("Терпение - это не способность ждать, а способность сохранять хорошее настроение во время ожидания", "Неизвестный", "терпение"),
        ],
        Language::En => &[
            ("Be the change you wish to see in the world", "Mahatma Gandhi", "motivation"),
            ("Every day is a new opportunity to become better", "Unknown", "motivation"),
            ("Happiness is not in always doing what you want, but in always wanting what you do", "Leo Tolstoy", "happiness"),
            ("The most important thing is not what happens to us, but how we react to it", "Epictetus", "relationships"),
            ("Success is the ability to go from one failure to another with no loss of enthusiasm", "Winston Churchill", "success"),
            ("The best way to predict the future is to create it", "Peter Drucker", "future"),
            ("You cannot control everything that happens to you, but you can control your reaction", "Unknown", "control"),
            ("Every experience, even negative, makes you stronger", "Unknown", "experience"),
            ("Belief in yourself is the first step to success", "Unknown", "belief"),
            ("Patience is not the ability to wait, but the ability to keep a good attitude while waiting", "Unknown", "patience"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_topic_prefers_first_source() {
        let mut article = Article::new("стресс", Approach::Practical, Language::Ru, "T", "C");
        assert_eq!(article.primary_topic(), "стресс");
        article.source_topics = vec!["сон".into(), "стресс".into()];
        assert_eq!(article.primary_topic(), "сон");
        article.source_topics.clear();
        assert_eq!(article.primary_topic(), "стресс");
    }

    #[test]
    fn test_approach_parse_lenient() {
        assert_eq!(Approach::parse_lenient("theoretical"), Approach::Theoretical);
        assert_eq!(Approach::parse_lenient(""), Approach::Practical);
    }

    #[test]
    fn test_seed_quotes_are_bilingual() {
        assert_eq!(seed_quotes(Language::Ru).len(), 10);
        assert_eq!(seed_quotes(Language::En).len(), 10);
        assert_eq!(default_quote(Language::En).author, "Mahatma Gandhi");
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!(ContentType::parse("quote").unwrap(), ContentType::Quote);
        assert!(ContentType::parse("video").is_err());
    }
}
