// Template articles and quotes used when generation fails

use crate::domain::{Approach, Article, Language, Quote};

pub fn fallback_article(topic: &str, approach: Approach, language: Language) -> Article {
    let (title, content) = match (language, approach) {
        (Language::En, Approach::Practical) => (
            format!("Practical Guide to {topic}: Simple Steps for Improvement"),
            format!(
                "Dealing with {topic} can be challenging, but there are practical steps you can take to improve your situation. \
                 Start by identifying the specific aspects of {topic} that affect you most. \
                 Then, create a simple action plan with small, manageable steps. \
                 Remember that progress takes time, and every small improvement counts. \
                 Focus on what you can control and celebrate your achievements, no matter how small they may seem."
            ),
        ),
        (Language::En, Approach::Theoretical) => (
            format!("Understanding {topic}: A Comprehensive Overview"),
            format!(
                "{topic} is a complex psychological concept that affects many aspects of our lives. \
                 Understanding the underlying mechanisms and theories can help you better navigate challenges related to {topic}. \
                 This knowledge provides a foundation for developing effective coping strategies and making informed decisions about your well-being."
            ),
        ),
        (Language::En, Approach::Motivational) => (
            format!("Finding Strength in {topic}: Your Journey to Growth"),
            format!(
                "Every challenge related to {topic} is an opportunity for personal growth and development. \
                 You have the inner strength to overcome difficulties and emerge stronger. \
                 Remember that you are not alone in facing these challenges, and your experiences can inspire others. \
                 Stay committed to your journey of self-improvement and believe in your ability to create positive change."
            ),
        ),
        (Language::Ru, Approach::Practical) => (
            format!("Практическое руководство по {topic}: Простые шаги к улучшению"),
            format!(
                "Работа с {topic} может быть сложной, но есть практические шаги, которые вы можете предпринять для улучшения ситуации. \
                 Начните с определения конкретных аспектов {topic}, которые больше всего влияют на вас. \
                 Затем создайте простой план действий с небольшими, выполнимыми шагами. \
                 Помните, что прогресс требует времени, и каждое небольшое улучшение имеет значение."
            ),
        ),
        (Language::Ru, Approach::Theoretical) => (
            format!("Понимание {topic}: Комплексный обзор"),
            format!(
                "{topic} - это сложная психологическая концепция, которая влияет на многие аспекты нашей жизни. \
                 Понимание основных механизмов и теорий может помочь вам лучше справляться с проблемами, связанными с {topic}. \
                 Эти знания служат основой для разработки эффективных стратегий преодоления трудностей."
            ),
        ),
        (Language::Ru, Approach::Motivational) => (
            format!("Найти силу в {topic}: Ваш путь к росту"),
            format!(
                "Каждый вызов, связанный с {topic}, - это возможность для личностного роста и развития. \
                 У вас есть внутренняя сила, чтобы преодолевать трудности и становиться сильнее. \
                 Помните, что вы не одиноки в решении этих проблем, и ваш опыт может вдохновить других."
            ),
        ),
    };

    let mut article = Article::new(topic, approach, language, title, content);
    article.is_fallback = true;
    article
}

/// Quote used when the model answers without the expected markers
pub fn unparsed_quote_fallback(language: Language) -> Quote {
    match language {
        Language::En => Quote::new(
            "Every day is a new opportunity to become better",
            "Unknown",
            "motivation",
            language,
        ),
        Language::Ru => Quote::new(
            "Каждый день - это новая возможность стать лучше",
            "Неизвестный",
            "мотивация",
            language,
        ),
    }
}

pub fn unknown_author(language: Language) -> &'static str {
    match language {
        Language::En => "Unknown",
        Language::Ru => "Неизвестный",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_article_per_approach() {
        for approach in Approach::ALL {
            let article = fallback_article("sleep", approach, Language::En);
            assert!(article.is_fallback);
            assert_eq!(article.approach, approach);
            assert!(article.title.contains("sleep"));
            assert!(!article.content.is_empty());
        }
        let article = fallback_article("сон", Approach::Theoretical, Language::Ru);
        assert_eq!(article.title, "Понимание сон: Комплексный обзор");
    }
}
